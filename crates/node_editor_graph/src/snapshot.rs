// SPDX-License-Identifier: MIT OR Apache-2.0
//! Portable JSON form of a whole graph.
//!
//! A snapshot carries node types (with their fields) and nodes. Node and
//! field IDs are opaque and preserved verbatim. Value types are not stored;
//! each field records its value type by name and is resolved against the
//! editor's registry on load.

use crate::connection::Connection;
use crate::field::FieldId;
use crate::graph::{GraphError, NodeEditor};
use crate::node::{EditorNode, NodeId, NodeType, NodeTypeId};
use crate::settings::{EditorSettings, SettingsError};
use crate::value::ValueTypeRegistry;
use crate::viewport::{Point, Viewport};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Snapshot loading errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The input is not a valid snapshot document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A node references a node type the snapshot does not define
    #[error("Node {node} references unknown node type {type_name:?}")]
    UnknownNodeType {
        /// Node ID
        node: NodeId,
        /// Unresolved type name
        type_name: String,
    },

    /// The snapshot breaks a graph invariant
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The editor settings are out of range
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Reference from a node to its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Stable type ID; absent in older snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeTypeId>,
    /// Type name, used when the ID is absent or unknown
    pub name: String,
}

/// Serialized node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node ID
    pub id: NodeId,
    /// Display name; defaults to the type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node type reference
    #[serde(rename = "type")]
    pub node_type: TypeRef,
    /// Canvas position
    #[serde(default)]
    pub position: Point,
    /// Field values by field ID
    #[serde(default)]
    pub values: IndexMap<FieldId, Value>,
    /// Outgoing connections
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Serialized graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    /// Node types in registration order
    #[serde(default)]
    pub node_types: Vec<NodeType>,
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Pan/zoom state, if saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

impl GraphSnapshot {
    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl NodeEditor {
    /// Capture the whole graph
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes
            .values()
            .map(|node| {
                let type_name = self
                    .node_type(node.node_type())
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                NodeRecord {
                    id: node.id().clone(),
                    name: Some(node.name().to_string()),
                    node_type: TypeRef {
                        id: Some(node.node_type().clone()),
                        name: type_name,
                    },
                    position: node.position(),
                    values: node.values().clone(),
                    connections: node.connections().to_vec(),
                }
            })
            .collect();

        GraphSnapshot {
            node_types: self.node_types.clone(),
            nodes,
            viewport: Some(self.viewport),
        }
    }

    /// Rebuild an editor from a snapshot.
    ///
    /// Fails if a field's value type is not in `value_types`, if node type
    /// names, field IDs or node IDs repeat, if a node's type cannot be
    /// resolved, if a value is keyed by an undeclared field, or if a
    /// connection dangles or loops back to its source. Cycles spanning
    /// several nodes are accepted as-is.
    pub fn from_snapshot(
        snapshot: GraphSnapshot,
        value_types: Arc<ValueTypeRegistry>,
        settings: EditorSettings,
    ) -> Result<Self, SnapshotError> {
        let mut editor = NodeEditor::new(value_types).with_settings(settings)?;
        for node_type in snapshot.node_types {
            editor.add_node_type(node_type)?;
        }

        for record in snapshot.nodes {
            let node_type = record
                .node_type
                .id
                .as_ref()
                .and_then(|id| editor.node_type(id))
                .or_else(|| editor.node_type_by_name(&record.node_type.name))
                .ok_or_else(|| SnapshotError::UnknownNodeType {
                    node: record.id.clone(),
                    type_name: record.node_type.name.clone(),
                })?;

            let name = record.name.unwrap_or_else(|| node_type.name.clone());
            let node = EditorNode::new(node_type, record.position)
                .with_id(record.id)
                .with_name(name)
                .with_values(record.values)
                .with_connections(record.connections);

            if editor.nodes.contains_key(node.id()) {
                return Err(GraphError::DuplicateNodeId(node.id().clone()).into());
            }
            editor.check_node_values(&node)?;
            editor.nodes.insert(node.id().clone(), node);
        }

        // Connections may point forward, so check them once every node exists
        for node in editor.nodes.values() {
            editor.check_node_connections(node)?;
        }

        if let Some(viewport) = snapshot.viewport {
            if viewport.zoom.is_finite() && viewport.zoom >= editor.settings.zoom_floor() {
                editor.viewport = viewport;
            } else {
                tracing::warn!("Ignoring saved viewport with zoom {}", viewport.zoom);
            }
        }

        tracing::debug!(
            "Loaded graph: {} node types, {} nodes, {} connections",
            editor.node_types.len(),
            editor.node_count(),
            editor.connection_count()
        );
        Ok(editor)
    }

    /// Serialize the graph to compact JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        self.to_snapshot().to_json()
    }

    /// Serialize the graph to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        self.to_snapshot().to_json_pretty()
    }

    /// Rebuild an editor from JSON
    pub fn from_json(
        json: &str,
        value_types: Arc<ValueTypeRegistry>,
        settings: EditorSettings,
    ) -> Result<Self, SnapshotError> {
        Self::from_snapshot(GraphSnapshot::from_json(json)?, value_types, settings)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type schemas and node instances.

use crate::connection::{Connectable, Connection};
use crate::field::{FieldId, NodeField};
use crate::viewport::Point;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a node. Opaque, preserved verbatim through snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier for a node type, independent of its display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeId(pub String);

impl NodeTypeId {
    /// Create a new random node type ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeTypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node type definition: a named, ordered list of typed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    /// Stable type identifier
    #[serde(default)]
    pub id: NodeTypeId,
    /// Display name, unique within an editor
    pub name: String,
    /// Fields in display order
    #[serde(default)]
    pub fields: Vec<NodeField>,
}

impl NodeType {
    /// Create a node type with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeTypeId::new(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Use a fixed ID instead of a random one
    pub fn with_id(mut self, id: impl Into<NodeTypeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a field
    pub fn with_field(mut self, field: NodeField) -> Self {
        self.fields.push(field);
        self
    }

    /// Get a field by ID
    pub fn field(&self, field_id: &FieldId) -> Option<&NodeField> {
        self.fields.iter().find(|f| f.id == *field_id)
    }

    /// Whether the type declares a field with this ID
    pub fn has_field(&self, field_id: &FieldId) -> bool {
        self.field(field_id).is_some()
    }

    /// First field ID that occurs more than once
    pub fn duplicate_field_id(&self) -> Option<&FieldId> {
        self.fields
            .iter()
            .enumerate()
            .find(|(i, f)| self.fields[..*i].iter().any(|g| g.id == f.id))
            .map(|(_, f)| &f.id)
    }

    /// Default values for every field, in field order
    pub fn default_values(&self) -> IndexMap<FieldId, Value> {
        self.fields
            .iter()
            .map(|f| (f.id.clone(), f.default.clone()))
            .collect()
    }
}

/// Connection-gesture highlight of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    /// Not part of a gesture
    #[default]
    Idle,
    /// Source of the gesture
    Source,
    /// Valid target of the gesture
    TargetCandidate,
}

/// A node instance in the editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditorNode {
    id: NodeId,
    name: String,
    node_type: NodeTypeId,
    position: Point,
    values: IndexMap<FieldId, Value>,
    connections: Vec<Connection>,
    highlight: Highlight,
}

impl EditorNode {
    /// Create a new node from a type definition, with default field values
    pub fn new(node_type: &NodeType, position: Point) -> Self {
        Self {
            id: NodeId::new(),
            name: node_type.name.clone(),
            node_type: node_type.id.clone(),
            position,
            values: node_type.default_values(),
            connections: Vec::new(),
            highlight: Highlight::Idle,
        }
    }

    /// Use a fixed ID instead of a random one
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the field values
    pub fn with_values(mut self, values: IndexMap<FieldId, Value>) -> Self {
        self.values = values;
        self
    }

    /// Replace the outgoing connections
    pub fn with_connections(mut self, connections: Vec<Connection>) -> Self {
        self.connections = connections;
        self
    }

    /// Node ID
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Display name (not unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ID of the node's type
    pub fn node_type(&self) -> &NodeTypeId {
        &self.node_type
    }

    /// Position in canvas space
    pub fn position(&self) -> Point {
        self.position
    }

    /// Field values by field ID
    pub fn values(&self) -> &IndexMap<FieldId, Value> {
        &self.values
    }

    /// Value of one field
    pub fn value(&self, field_id: &FieldId) -> Option<&Value> {
        self.values.get(field_id)
    }

    /// Outgoing connections in creation order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Whether an edge to `target` already exists
    pub fn is_connected_to(&self, target: &NodeId) -> bool {
        self.connections.iter().any(|c| c.targets(target))
    }

    /// Current gesture highlight
    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_value(&mut self, field_id: FieldId, value: Value) {
        self.values.insert(field_id, value);
    }

    /// Drop every connection to `target`; returns how many were removed
    pub(crate) fn disconnect(&mut self, target: &NodeId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.targets(target));
        before - self.connections.len()
    }

    /// Reattach to a new version of the node's type.
    ///
    /// Values for removed fields are dropped; new fields get their defaults.
    pub(crate) fn conform_to(&mut self, node_type: &NodeType) {
        self.node_type = node_type.id.clone();
        self.values.retain(|id, _| node_type.has_field(id));
        for field in &node_type.fields {
            self.values
                .entry(field.id.clone())
                .or_insert_with(|| field.default.clone());
        }
    }
}

impl Connectable for EditorNode {
    fn id(&self) -> &NodeId {
        &self.id
    }

    fn can_connect_to(&self, target: &NodeId) -> bool {
        *target != self.id && !self.is_connected_to(target)
    }

    fn highlight_as_connection_source(&mut self) {
        self.highlight = Highlight::Source;
    }

    fn unhighlight_as_connection_source(&mut self) {
        if self.highlight == Highlight::Source {
            self.highlight = Highlight::Idle;
        }
    }

    fn highlight_as_connection_target(&mut self) {
        self.highlight = Highlight::TargetCandidate;
    }

    fn unhighlight_as_connection_target(&mut self) {
        if self.highlight == Highlight::TargetCandidate {
            self.highlight = Highlight::Idle;
        }
    }

    fn connect(&mut self, target: NodeId) {
        self.connections.push(Connection::new(target));
    }
}

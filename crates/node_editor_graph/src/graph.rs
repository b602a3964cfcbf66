// SPDX-License-Identifier: MIT OR Apache-2.0
//! The node editor: owns node types, nodes and the viewport.
//!
//! All mutation goes through [`NodeEditor`]. Every operation leaves the graph
//! consistent: node IDs are unique, node types are registered, and no
//! connection points at a missing node or back at its own source.

use crate::connection::Connectable;
use crate::field::FieldId;
use crate::node::{EditorNode, NodeId, NodeType, NodeTypeId};
use crate::settings::{EditorSettings, SettingsError};
use crate::value::ValueTypeRegistry;
use crate::viewport::{PanSession, Point, Size, Viewport, ZoomOutcome};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Callback invoked when the view must refresh
pub type RenderCallback = Box<dyn FnMut()>;

/// Result of finishing a connection gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The edge was created
    Connected,
    /// No target was chosen
    Cancelled,
    /// Source or target does not exist
    UnknownNode,
    /// The source refused the target (self-connection or existing edge)
    Rejected,
    /// The edge would close a directed cycle
    WouldCycle,
}

/// The graph editor
pub struct NodeEditor {
    pub(crate) value_types: Arc<ValueTypeRegistry>,
    pub(crate) node_types: Vec<NodeType>,
    pub(crate) nodes: IndexMap<NodeId, EditorNode>,
    pub(crate) viewport: Viewport,
    pub(crate) settings: EditorSettings,
    pan: Option<PanSession>,
    connecting: Option<NodeId>,
    rerender: RenderCallback,
}

impl NodeEditor {
    /// Create an empty editor using the given value types
    pub fn new(value_types: Arc<ValueTypeRegistry>) -> Self {
        Self {
            value_types,
            node_types: Vec::new(),
            nodes: IndexMap::new(),
            viewport: Viewport::new(),
            settings: EditorSettings::default(),
            pan: None,
            connecting: None,
            rerender: Box::new(|| {
                tracing::debug!("Render callback is not set; make sure the view is set up");
            }),
        }
    }

    /// Replace the settings after checking their ranges
    pub fn with_settings(mut self, settings: EditorSettings) -> Result<Self, SettingsError> {
        self.set_settings(settings)?;
        Ok(self)
    }

    /// Set the callback invoked after visible mutations
    pub fn set_renderer(&mut self, callback: impl FnMut() + 'static) {
        self.rerender = Box::new(callback);
    }

    fn rerender(&mut self) {
        (self.rerender)();
    }

    /// Value types fields are checked against
    pub fn value_types(&self) -> &ValueTypeRegistry {
        &self.value_types
    }

    /// Current settings
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Replace the settings; out-of-range settings leave the current ones in place
    pub fn set_settings(&mut self, settings: EditorSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Node types
    // ------------------------------------------------------------------

    fn check_node_type(&self, node_type: &NodeType) -> Result<(), GraphError> {
        if let Some(field) = node_type.duplicate_field_id() {
            return Err(GraphError::DuplicateFieldId {
                node_type: node_type.name.clone(),
                field: field.clone(),
            });
        }
        for field in &node_type.fields {
            if !self.value_types.contains(&field.value_type.name) {
                return Err(GraphError::UnknownValueType {
                    field: field.id.clone(),
                    value_type: field.value_type.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Register a node type
    pub fn add_node_type(&mut self, node_type: NodeType) -> Result<NodeTypeId, GraphError> {
        self.check_node_type(&node_type)?;
        if self.node_type_by_name(&node_type.name).is_some() {
            return Err(GraphError::DuplicateTypeName(node_type.name));
        }
        if self.node_type(&node_type.id).is_some() {
            return Err(GraphError::DuplicateTypeId(node_type.id));
        }
        let id = node_type.id.clone();
        self.node_types.push(node_type);
        Ok(id)
    }

    /// Replace a registered node type.
    ///
    /// Matches by ID first, then by name. The replacement keeps the matched
    /// type's ID so its nodes stay attached; their values are conformed to
    /// the new field list. Returns whether a type was replaced.
    pub fn update_node_type(&mut self, mut node_type: NodeType) -> Result<bool, GraphError> {
        self.check_node_type(&node_type)?;
        let index = self
            .node_types
            .iter()
            .position(|t| t.id == node_type.id)
            .or_else(|| self.node_types.iter().position(|t| t.name == node_type.name));
        let Some(index) = index else {
            return Ok(false);
        };
        if self
            .node_types
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.name == node_type.name)
        {
            return Err(GraphError::DuplicateTypeName(node_type.name));
        }

        node_type.id = self.node_types[index].id.clone();
        for node in self.nodes.values_mut() {
            if *node.node_type() == node_type.id {
                node.conform_to(&node_type);
            }
        }
        self.node_types[index] = node_type;
        self.rerender();
        Ok(true)
    }

    /// Rename a node type by its stable ID
    pub fn rename_node_type(
        &mut self,
        id: &NodeTypeId,
        name: impl Into<String>,
    ) -> Result<bool, GraphError> {
        let name = name.into();
        if self.node_types.iter().any(|t| t.name == name && t.id != *id) {
            return Err(GraphError::DuplicateTypeName(name));
        }
        let Some(node_type) = self.node_types.iter_mut().find(|t| t.id == *id) else {
            return Ok(false);
        };
        node_type.name = name;
        self.rerender();
        Ok(true)
    }

    /// Remove a node type and every node of that type.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_node_type_by_name(&mut self, name: &str) -> usize {
        let removed = self.remove_nodes_by_type(name);
        self.node_types.retain(|t| t.name != name);
        removed
    }

    /// All node types in registration order
    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    /// Get a node type by ID
    pub fn node_type(&self, id: &NodeTypeId) -> Option<&NodeType> {
        self.node_types.iter().find(|t| t.id == *id)
    }

    /// Get a node type by name
    pub fn node_type_by_name(&self, name: &str) -> Option<&NodeType> {
        self.node_types.iter().find(|t| t.name == name)
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub(crate) fn check_node_values(&self, node: &EditorNode) -> Result<(), GraphError> {
        let node_type = self
            .node_type(node.node_type())
            .ok_or_else(|| GraphError::NodeTypeNotFound(node.node_type().clone()))?;
        if let Some(field) = node.values().keys().find(|id| !node_type.has_field(id)) {
            return Err(GraphError::UnknownField {
                node: node.id().clone(),
                field: field.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_node_connections(&self, node: &EditorNode) -> Result<(), GraphError> {
        for connection in node.connections() {
            if connection.to == *node.id() {
                return Err(GraphError::SelfConnection(node.id().clone()));
            }
            if !self.nodes.contains_key(&connection.to) {
                return Err(GraphError::DanglingConnection {
                    from: node.id().clone(),
                    to: connection.to.clone(),
                });
            }
        }
        Ok(())
    }

    /// Add a node.
    ///
    /// The node's type must be registered, its ID unused, its values keyed
    /// by declared fields, and its connections must point at existing nodes.
    pub fn add_node(&mut self, node: EditorNode) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(node.id()) {
            return Err(GraphError::DuplicateNodeId(node.id().clone()));
        }
        self.check_node_values(&node)?;
        self.check_node_connections(&node)?;
        let id = node.id().clone();
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Create a node of the named type with default values
    pub fn create_node(&mut self, type_name: &str, position: Point) -> Result<NodeId, GraphError> {
        let node_type = self
            .node_type_by_name(type_name)
            .ok_or_else(|| GraphError::UnknownNodeType(type_name.to_string()))?;
        let node = EditorNode::new(node_type, position);
        let id = self.add_node(node)?;
        self.rerender();
        Ok(id)
    }

    // Removes the node and repairs every connection that pointed at it.
    fn detach_node(&mut self, id: &NodeId) -> Option<EditorNode> {
        let removed = self.nodes.shift_remove(id)?;
        for node in self.nodes.values_mut() {
            node.disconnect(id);
        }
        if self.connecting.as_ref() == Some(id) {
            self.connecting = None;
        }
        Some(removed)
    }

    // Bulk removal always goes through the per-node cascade.
    fn detach_nodes(&mut self, ids: Vec<NodeId>) -> usize {
        let removed = ids.iter().filter(|id| self.detach_node(id).is_some()).count();
        if removed > 0 {
            self.rerender();
        }
        removed
    }

    /// Remove every node with the given display name
    pub fn remove_node_by_name(&mut self, name: &str) -> usize {
        let ids = self
            .nodes
            .values()
            .filter(|n| n.name() == name)
            .map(|n| n.id().clone())
            .collect();
        self.detach_nodes(ids)
    }

    /// Remove a node and every connection pointing at it
    pub fn remove_node_by_id(&mut self, id: &NodeId) -> Option<EditorNode> {
        let removed = self.detach_node(id)?;
        self.rerender();
        Some(removed)
    }

    /// Remove every node whose type has the given name
    pub fn remove_nodes_by_type(&mut self, type_name: &str) -> usize {
        let ids = self
            .get_nodes_by_type(type_name)
            .into_iter()
            .map(|n| n.id().clone())
            .collect();
        self.detach_nodes(ids)
    }

    /// Nodes whose type has the given name
    pub fn get_nodes_by_type(&self, type_name: &str) -> Vec<&EditorNode> {
        let type_ids: HashSet<&NodeTypeId> = self
            .node_types
            .iter()
            .filter(|t| t.name == type_name)
            .map(|t| &t.id)
            .collect();
        self.nodes
            .values()
            .filter(|n| type_ids.contains(n.node_type()))
            .collect()
    }

    /// Get a node by ID
    pub fn node(&self, id: &NodeId) -> Option<&EditorNode> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &EditorNode> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of connections across all nodes
    pub fn connection_count(&self) -> usize {
        self.nodes.values().map(|n| n.connections().len()).sum()
    }

    /// Move a node
    pub fn set_node_position(&mut self, id: &NodeId, position: Point) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.set_position(position);
        self.rerender();
        true
    }

    /// Change a node's display name
    pub fn rename_node(&mut self, id: &NodeId, name: impl Into<String>) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.set_name(name.into());
        self.rerender();
        true
    }

    /// Set a field value. The field must be declared on the node's type.
    pub fn set_node_value(
        &mut self,
        id: &NodeId,
        field_id: &FieldId,
        value: Value,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        let declared = self
            .node_type(node.node_type())
            .is_some_and(|t| t.has_field(field_id));
        if !declared {
            return Err(GraphError::UnknownField {
                node: id.clone(),
                field: field_id.clone(),
            });
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_value(field_id.clone(), value);
        }
        self.rerender();
        Ok(())
    }

    /// Remove the edges from `from` to `to`; returns how many were removed
    pub fn disconnect(&mut self, from: &NodeId, to: &NodeId) -> usize {
        let removed = self.nodes.get_mut(from).map_or(0, |n| n.disconnect(to));
        if removed > 0 {
            self.rerender();
        }
        removed
    }

    // ------------------------------------------------------------------
    // Connection gesture
    // ------------------------------------------------------------------

    /// Source node of the gesture in progress
    pub fn connecting_from(&self) -> Option<&NodeId> {
        self.connecting.as_ref()
    }

    fn clear_highlights(&mut self, from: &NodeId) {
        for node in self.nodes.values_mut() {
            if node.id() == from {
                node.unhighlight_as_connection_source();
            } else {
                node.unhighlight_as_connection_target();
            }
        }
    }

    /// Begin a connection gesture from `from`.
    ///
    /// Marks the source and every node the source may connect to.
    pub fn start_connection(&mut self, from: &NodeId) {
        if let Some(previous) = self.connecting.take() {
            self.clear_highlights(&previous);
        }
        let Some(source) = self.nodes.get(from) else {
            tracing::debug!("Cannot start connection from unknown node {}", from);
            return;
        };
        let candidates: HashSet<NodeId> = self
            .nodes
            .keys()
            .filter(|id| *id != from && source.can_connect_to(id))
            .cloned()
            .collect();

        for node in self.nodes.values_mut() {
            if node.id() == from {
                node.highlight_as_connection_source();
            } else if candidates.contains(node.id()) {
                node.highlight_as_connection_target();
            }
        }
        self.connecting = Some(from.clone());
        self.rerender();
    }

    /// End a connection gesture.
    ///
    /// Highlights are always cleared, including on cancellation (`to` is
    /// `None`). The edge is only created if the source accepts the target
    /// and, when cycle prevention is on, the edge would not close a cycle.
    pub fn finish_connection(&mut self, from: &NodeId, to: Option<&NodeId>) -> ConnectOutcome {
        self.clear_highlights(from);
        if let Some(previous) = self.connecting.take() {
            if previous != *from {
                self.clear_highlights(&previous);
            }
        }

        let outcome = self.try_connect(from, to);
        self.rerender();
        outcome
    }

    fn try_connect(&mut self, from: &NodeId, to: Option<&NodeId>) -> ConnectOutcome {
        let Some(to) = to else {
            return ConnectOutcome::Cancelled;
        };
        let (Some(source), true) = (self.nodes.get(from), self.nodes.contains_key(to)) else {
            tracing::debug!("Connection {} -> {} references an unknown node", from, to);
            return ConnectOutcome::UnknownNode;
        };
        if !source.can_connect_to(to) {
            tracing::debug!("Node {} refused connection to {}", from, to);
            return ConnectOutcome::Rejected;
        }
        if self.settings.prevent_circular_connections && self.connection_would_cycle(from, to) {
            tracing::info!("Connection {} -> {} would create a cycle; not connecting", from, to);
            return ConnectOutcome::WouldCycle;
        }
        if let Some(source) = self.nodes.get_mut(from) {
            source.connect(to.clone());
        }
        ConnectOutcome::Connected
    }

    /// Whether adding the edge `from -> to` would close a directed cycle.
    ///
    /// Follows existing edges from `to`; a self-edge counts as a cycle.
    /// Terminates on graphs that already contain cycles.
    pub fn connection_would_cycle(&self, from: &NodeId, to: &NodeId) -> bool {
        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut stack = vec![to];
        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(
                    node.connections()
                        .iter()
                        .map(|c| &c.to)
                        .filter(|id| !visited.contains(id)),
                );
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Current pan/zoom state
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Move the pan offset back to the origin
    pub fn reset_position(&mut self) {
        self.viewport.reset_position();
        self.rerender();
    }

    /// Start a pan drag at the given mouse position, replacing any unfinished one
    pub fn begin_pan(&mut self, mouse: Point) {
        self.pan = Some(self.viewport.begin_pan(mouse));
    }

    /// Update the pan drag; returns false when no drag is in progress
    pub fn drag_pan(&mut self, mouse: Point) -> bool {
        let Some(session) = self.pan else {
            return false;
        };
        self.viewport.position = session.position_for(mouse);
        self.rerender();
        true
    }

    /// End the pan drag; returns whether one was in progress
    pub fn end_pan(&mut self) -> bool {
        self.pan.take().is_some()
    }

    /// Whether a pan drag is in progress
    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Zoom one step for a wheel event. Positive `delta_y` zooms out.
    pub fn zoom(&mut self, delta_y: f64) -> ZoomOutcome {
        let outcome =
            self.viewport
                .zoom_by_wheel(delta_y, self.settings.zoom_step, self.settings.zoom_floor());
        match outcome {
            ZoomOutcome::Changed(_) => self.rerender(),
            ZoomOutcome::Rejected => {
                tracing::debug!("Zoom below {} rejected", self.settings.zoom_floor());
            }
        }
        outcome
    }

    /// Place a node of the first registered type at a context-menu position
    pub fn add_node_from_menu(&mut self, menu_position: Point, editor_size: Size) -> Option<NodeId> {
        let Some(node_type) = self.node_types.first() else {
            tracing::warn!("Cannot add node from menu: no node types registered");
            return None;
        };
        let position = self.viewport.menu_to_canvas(menu_position, editor_size);
        let node = EditorNode::new(node_type, position);
        let id = node.id().clone();
        self.nodes.insert(id.clone(), node);
        self.rerender();
        Some(id)
    }
}

impl Default for NodeEditor {
    fn default() -> Self {
        Self::new(ValueTypeRegistry::shared())
    }
}

impl std::fmt::Debug for NodeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEditor")
            .field("node_types", &self.node_types)
            .field("nodes", &self.nodes)
            .field("viewport", &self.viewport)
            .field("settings", &self.settings)
            .field("pan", &self.pan)
            .field("connecting", &self.connecting)
            .finish_non_exhaustive()
    }
}

/// Error when mutating the graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Field references a value type missing from the registry
    #[error("Unknown value type {value_type:?} on field {field}")]
    UnknownValueType {
        /// Field ID
        field: FieldId,
        /// Unresolved value type name
        value_type: String,
    },

    /// Two fields of one type share an ID
    #[error("Duplicate field ID {field} on node type {node_type:?}")]
    DuplicateFieldId {
        /// Node type name
        node_type: String,
        /// Repeated field ID
        field: FieldId,
    },

    /// Node type name already registered
    #[error("Node type name already in use: {0:?}")]
    DuplicateTypeName(String),

    /// Node type ID already registered
    #[error("Node type ID already in use: {0}")]
    DuplicateTypeId(NodeTypeId),

    /// No node type with this name
    #[error("Unknown node type: {0:?}")]
    UnknownNodeType(String),

    /// No node type with this ID
    #[error("Node type not found: {0}")]
    NodeTypeNotFound(NodeTypeId),

    /// Node ID already in use
    #[error("Node ID already in use: {0}")]
    DuplicateNodeId(NodeId),

    /// No node with this ID
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Value keyed by a field the node's type does not declare
    #[error("Node {node} has no field {field}")]
    UnknownField {
        /// Node ID
        node: NodeId,
        /// Undeclared field ID
        field: FieldId,
    },

    /// Connection to a node that does not exist
    #[error("Connection {from} -> {to} points at a missing node")]
    DanglingConnection {
        /// Source node
        from: NodeId,
        /// Missing target
        to: NodeId,
    },

    /// Node connected to itself
    #[error("Self-connection not allowed: {0}")]
    SelfConnection(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::NodeField;
    use crate::node::Highlight;
    use crate::value::ValueType;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn number_type(name: &str) -> NodeType {
        NodeType::new(name)
            .with_id(name)
            .with_field(NodeField::new("Value", ValueType::new("number")).with_id("value").with_default(0))
    }

    fn editor_with_nodes(ids: &[&str]) -> NodeEditor {
        let mut editor = NodeEditor::default();
        editor.add_node_type(number_type("Constant")).unwrap();
        let node_type = editor.node_type_by_name("Constant").unwrap().clone();
        for id in ids {
            editor
                .add_node(EditorNode::new(&node_type, Point::ZERO).with_id(*id))
                .unwrap();
        }
        editor
    }

    fn connect(editor: &mut NodeEditor, from: &str, to: &str) -> ConnectOutcome {
        editor.start_connection(&from.into());
        editor.finish_connection(&from.into(), Some(&to.into()))
    }

    #[test]
    fn test_add_node_type_rejects_duplicates() {
        let mut editor = NodeEditor::default();
        editor.add_node_type(number_type("A")).unwrap();
        assert_eq!(
            editor.add_node_type(NodeType::new("A")),
            Err(GraphError::DuplicateTypeName("A".into()))
        );
        assert_eq!(
            editor.add_node_type(NodeType::new("B").with_id("A")),
            Err(GraphError::DuplicateTypeId("A".into()))
        );
    }

    #[test]
    fn test_add_node_type_rejects_unknown_value_type() {
        let mut editor = NodeEditor::default();
        let node_type = NodeType::new("Bad")
            .with_field(NodeField::new("V", ValueType::new("quaternion")).with_id("v"));
        assert!(matches!(
            editor.add_node_type(node_type),
            Err(GraphError::UnknownValueType { .. })
        ));
        assert!(editor.node_types().is_empty());
    }

    #[test]
    fn test_add_node_validates() {
        let mut editor = editor_with_nodes(&["a"]);
        let node_type = editor.node_type_by_name("Constant").unwrap().clone();

        let duplicate = EditorNode::new(&node_type, Point::ZERO).with_id("a");
        assert_eq!(editor.add_node(duplicate), Err(GraphError::DuplicateNodeId("a".into())));

        let dangling = EditorNode::new(&node_type, Point::ZERO)
            .with_id("b")
            .with_connections(vec![crate::Connection::new("zzz".into())]);
        assert!(matches!(editor.add_node(dangling), Err(GraphError::DanglingConnection { .. })));

        let orphan = EditorNode::new(&NodeType::new("Other"), Point::ZERO);
        assert!(matches!(editor.add_node(orphan), Err(GraphError::NodeTypeNotFound(_))));
        assert_eq!(editor.node_count(), 1);
    }

    #[test]
    fn test_update_node_type_conforms_nodes() {
        let mut editor = editor_with_nodes(&["a"]);
        let updated = NodeType::new("Constant")
            .with_id("something-else")
            .with_field(NodeField::new("Label", ValueType::new("string")).with_id("label").with_default("x"));
        assert_eq!(editor.update_node_type(updated), Ok(true));

        let node_type = editor.node_type_by_name("Constant").unwrap();
        assert_eq!(node_type.id.as_str(), "Constant");
        let node = editor.node(&"a".into()).unwrap();
        assert_eq!(node.values().len(), 1);
        assert_eq!(node.value(&"label".into()), Some(&json!("x")));
    }

    #[test]
    fn test_update_unknown_type_is_noop() {
        let mut editor = editor_with_nodes(&[]);
        assert_eq!(editor.update_node_type(number_type("Missing")), Ok(false));
        assert_eq!(editor.node_types().len(), 1);
    }

    #[test]
    fn test_update_by_id_can_rename() {
        let mut editor = editor_with_nodes(&["a"]);
        editor.add_node_type(number_type("Other")).unwrap();
        let renamed = number_type("Renamed").with_id("Constant");
        assert_eq!(editor.update_node_type(renamed), Ok(true));
        assert_eq!(editor.get_nodes_by_type("Renamed").len(), 1);

        let clash = number_type("Other").with_id("Constant");
        assert_eq!(
            editor.update_node_type(clash),
            Err(GraphError::DuplicateTypeName("Other".into()))
        );
    }

    #[test]
    fn test_rename_node_type_keeps_nodes() {
        let mut editor = editor_with_nodes(&["a", "b"]);
        assert_eq!(editor.rename_node_type(&"Constant".into(), "Literal"), Ok(true));
        assert!(editor.get_nodes_by_type("Constant").is_empty());
        assert_eq!(editor.get_nodes_by_type("Literal").len(), 2);
        assert_eq!(editor.rename_node_type(&"missing".into(), "X"), Ok(false));
    }

    #[test]
    fn test_remove_node_by_id_repairs_connections() {
        let mut editor = editor_with_nodes(&["a", "b", "c"]);
        assert_eq!(connect(&mut editor, "a", "b"), ConnectOutcome::Connected);
        assert_eq!(connect(&mut editor, "c", "b"), ConnectOutcome::Connected);
        assert_eq!(connect(&mut editor, "a", "c"), ConnectOutcome::Connected);

        let removed = editor.remove_node_by_id(&"b".into()).unwrap();
        assert_eq!(removed.id().as_str(), "b");
        assert_eq!(editor.connection_count(), 1);
        assert!(editor.nodes().all(|n| n.connections().iter().all(|c| c.to.as_str() != "b")));
        assert!(editor.remove_node_by_id(&"b".into()).is_none());
    }

    #[test]
    fn test_remove_node_by_name_removes_all_matches() {
        let mut editor = editor_with_nodes(&["a", "b", "c"]);
        editor.rename_node(&"a".into(), "twin");
        editor.rename_node(&"c".into(), "twin");
        connect(&mut editor, "b", "a");
        assert_eq!(editor.remove_node_by_name("twin"), 2);
        assert_eq!(editor.node_count(), 1);
        assert_eq!(editor.connection_count(), 0);
    }

    #[test]
    fn test_remove_nodes_by_type_repairs_connections() {
        let mut editor = editor_with_nodes(&["a", "b"]);
        editor.add_node_type(number_type("Sink")).unwrap();
        let sink = editor.create_node("Sink", Point::ZERO).unwrap();
        connect(&mut editor, "a", sink.as_str());
        assert_eq!(editor.remove_nodes_by_type("Sink"), 1);
        assert_eq!(editor.connection_count(), 0);
    }

    #[test]
    fn test_remove_node_type_cascades() {
        let mut editor = editor_with_nodes(&["a", "b"]);
        assert_eq!(editor.remove_node_type_by_name("Constant"), 2);
        assert!(editor.node_types().is_empty());
        assert!(editor.get_nodes_by_type("Constant").is_empty());
        assert_eq!(editor.node_count(), 0);
    }

    #[test]
    fn test_start_connection_highlights() {
        let mut editor = editor_with_nodes(&["a", "b", "c"]);
        connect(&mut editor, "a", "b");
        editor.start_connection(&"a".into());

        assert_eq!(editor.connecting_from(), Some(&"a".into()));
        assert_eq!(editor.node(&"a".into()).unwrap().highlight(), Highlight::Source);
        // Already connected
        assert_eq!(editor.node(&"b".into()).unwrap().highlight(), Highlight::Idle);
        assert_eq!(editor.node(&"c".into()).unwrap().highlight(), Highlight::TargetCandidate);
    }

    #[test]
    fn test_cancel_clears_highlights() {
        let mut editor = editor_with_nodes(&["a", "b", "c"]);
        editor.start_connection(&"a".into());
        assert_eq!(editor.finish_connection(&"a".into(), None), ConnectOutcome::Cancelled);
        assert!(editor.nodes().all(|n| n.highlight() == Highlight::Idle));
        assert_eq!(editor.connection_count(), 0);
        assert!(editor.connecting_from().is_none());
    }

    #[test]
    fn test_self_connection_rejected_without_cycle_prevention() {
        let mut editor = editor_with_nodes(&["a"]).with_settings(EditorSettings {
            prevent_circular_connections: false,
            ..EditorSettings::default()
        })
        .unwrap();
        assert_eq!(connect(&mut editor, "a", "a"), ConnectOutcome::Rejected);
        assert_eq!(editor.connection_count(), 0);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut editor = editor_with_nodes(&["a", "b", "c"]);
        assert_eq!(connect(&mut editor, "a", "b"), ConnectOutcome::Connected);
        assert_eq!(connect(&mut editor, "b", "c"), ConnectOutcome::Connected);
        assert_eq!(connect(&mut editor, "c", "a"), ConnectOutcome::WouldCycle);
        assert_eq!(editor.connection_count(), 2);
        assert!(editor.nodes().all(|n| n.highlight() == Highlight::Idle));
    }

    #[test]
    fn test_cycle_allowed_when_prevention_disabled() {
        let mut editor = editor_with_nodes(&["a", "b"]).with_settings(EditorSettings {
            prevent_circular_connections: false,
            ..EditorSettings::default()
        })
        .unwrap();
        assert_eq!(connect(&mut editor, "a", "b"), ConnectOutcome::Connected);
        assert_eq!(connect(&mut editor, "b", "a"), ConnectOutcome::Connected);
        // The check still terminates on the now-cyclic graph
        assert!(editor.connection_would_cycle(&"a".into(), &"b".into()));
        assert!(!editor.connection_would_cycle(&"a".into(), &"zzz".into()));
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut editor = editor_with_nodes(&["a", "b"]);
        assert_eq!(connect(&mut editor, "a", "b"), ConnectOutcome::Connected);
        assert_eq!(connect(&mut editor, "a", "b"), ConnectOutcome::Rejected);
        assert_eq!(editor.connection_count(), 1);
    }

    #[test]
    fn test_unknown_target() {
        let mut editor = editor_with_nodes(&["a"]);
        assert_eq!(connect(&mut editor, "a", "ghost"), ConnectOutcome::UnknownNode);
    }

    #[test]
    fn test_set_node_value_checks_field() {
        let mut editor = editor_with_nodes(&["a"]);
        editor.set_node_value(&"a".into(), &"value".into(), json!(5)).unwrap();
        assert_eq!(editor.node(&"a".into()).unwrap().value(&"value".into()), Some(&json!(5)));
        assert!(matches!(
            editor.set_node_value(&"a".into(), &"nope".into(), json!(1)),
            Err(GraphError::UnknownField { .. })
        ));
        assert!(matches!(
            editor.set_node_value(&"x".into(), &"value".into(), json!(1)),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_pan_session() {
        let mut editor = NodeEditor::default();
        assert!(!editor.drag_pan(Point::new(5.0, 5.0)));
        editor.begin_pan(Point::new(100.0, 100.0));
        assert!(editor.drag_pan(Point::new(120.0, 90.0)));
        assert!(editor.end_pan());
        assert!(!editor.end_pan());
        assert!(!editor.drag_pan(Point::new(500.0, 500.0)));
        assert_eq!(editor.viewport().position, Point::new(20.0, -10.0));
        editor.reset_position();
        assert_eq!(editor.viewport().position, Point::ZERO);
    }

    #[test]
    fn test_add_node_from_menu() {
        let mut editor = NodeEditor::default();
        assert!(editor.add_node_from_menu(Point::new(10.0, 10.0), Size::new(100.0, 100.0)).is_none());

        editor.add_node_type(number_type("First")).unwrap();
        editor.add_node_type(number_type("Second")).unwrap();
        for _ in 0..10 {
            editor.zoom(-1.0);
        }
        assert_eq!(editor.viewport().zoom, 2.0);
        let id = editor
            .add_node_from_menu(Point::new(500.0, 300.0), Size::new(800.0, 600.0))
            .unwrap();
        let node = editor.node(&id).unwrap();
        assert_eq!(node.node_type().as_str(), "First");
        assert_eq!(node.position(), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_rerender_callback() {
        let count = Rc::new(Cell::new(0));
        let mut editor = editor_with_nodes(&["a", "b"]);
        let counter = count.clone();
        editor.set_renderer(move || counter.set(counter.get() + 1));

        connect(&mut editor, "a", "b");
        assert!(count.get() >= 1);
        let before = count.get();
        editor.zoom(1.0);
        assert_eq!(count.get(), before + 1);
        let before = count.get();
        editor
            .set_settings(EditorSettings { min_zoom: 5.0, ..EditorSettings::default() })
            .unwrap();
        assert_eq!(editor.zoom(1.0), ZoomOutcome::Rejected);
        assert_eq!(count.get(), before);
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let mut editor = NodeEditor::default();
        for settings in [
            EditorSettings { min_zoom: 0.0, ..EditorSettings::default() },
            EditorSettings { zoom_step: -0.1, ..EditorSettings::default() },
            EditorSettings { zoom_step: f64::NAN, ..EditorSettings::default() },
        ] {
            assert!(matches!(
                editor.set_settings(settings.clone()),
                Err(SettingsError::Invalid { .. })
            ));
            assert!(NodeEditor::default().with_settings(settings).is_err());
        }
        assert_eq!(editor.settings(), &EditorSettings::default());
    }

    #[test]
    fn test_menu_placement_stays_finite_at_zoom_floor() {
        let mut editor = editor_with_nodes(&[]);
        for _ in 0..20 {
            editor.zoom(1.0);
        }
        assert_eq!(editor.viewport().zoom, 0.1);

        let id = editor
            .add_node_from_menu(Point::new(100.0, 50.0), Size::new(200.0, 100.0))
            .unwrap();
        let position = editor.node(&id).unwrap().position();
        assert!(position.x.is_finite() && position.y.is_finite());

        let json = editor.to_json().unwrap();
        let loaded =
            NodeEditor::from_json(&json, ValueTypeRegistry::shared(), EditorSettings::default())
                .unwrap();
        assert_eq!(loaded.to_snapshot(), editor.to_snapshot());
    }
}

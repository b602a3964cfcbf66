// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions and the node capability contract.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A directed edge, stored on its source node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Target node ID
    pub to: NodeId,
}

impl Connection {
    /// Create a connection to the given node
    pub fn new(to: NodeId) -> Self {
        Self { to }
    }

    /// Check if this connection points at a specific node
    pub fn targets(&self, node_id: &NodeId) -> bool {
        self.to == *node_id
    }
}

/// What the editor needs from a node to run a connection gesture.
///
/// The editor only changes highlight state through these calls.
pub trait Connectable {
    /// The node's ID
    fn id(&self) -> &NodeId;

    /// Whether an edge from this node to `target` may be created
    fn can_connect_to(&self, target: &NodeId) -> bool;

    /// Mark as the source of the gesture in progress
    fn highlight_as_connection_source(&mut self);

    /// Clear the source mark
    fn unhighlight_as_connection_source(&mut self);

    /// Mark as a valid target of the gesture in progress
    fn highlight_as_connection_target(&mut self);

    /// Clear the target mark
    fn unhighlight_as_connection_target(&mut self);

    /// Append an outgoing edge to `target`
    fn connect(&mut self, target: NodeId);
}

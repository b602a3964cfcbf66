// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph model for the node editor.
//!
//! Users place typed nodes on a canvas, connect them with directed links,
//! and pan/zoom the canvas. This crate holds everything except drawing:
//! - Value types and node type schemas
//! - Node instances with field values and outgoing connections
//! - Connection gestures with optional cycle prevention
//! - Viewport (pan/zoom) state
//! - JSON snapshots of the whole graph
//!
//! ## Architecture
//!
//! [`NodeEditor`] owns node types, nodes and the viewport, and is the only
//! way to mutate them. Views hook in through a render callback
//! ([`NodeEditor::set_renderer`]) and, with the `ui` feature, an egui view
//! that turns pointer input into editor calls.

pub mod connection;
pub mod field;
pub mod graph;
pub mod node;
pub mod settings;
pub mod snapshot;
#[cfg(feature = "ui")]
pub mod ui;
pub mod value;
pub mod viewport;

pub use connection::{Connectable, Connection};
pub use field::{FieldId, NodeField};
pub use graph::{ConnectOutcome, GraphError, NodeEditor};
pub use node::{EditorNode, Highlight, NodeId, NodeType, NodeTypeId};
pub use settings::{EditorSettings, SettingsError};
pub use snapshot::{GraphSnapshot, NodeRecord, SnapshotError, TypeRef};
pub use value::{ValueType, ValueTypeRegistry};
pub use viewport::{PanSession, Point, Size, Viewport, ZoomOutcome};

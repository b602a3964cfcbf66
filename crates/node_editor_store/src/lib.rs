// SPDX-License-Identifier: MIT OR Apache-2.0
//! Versioned storage for node editor graphs.
//!
//! Each save appends a new version of a graph snapshot. Graphs belong to an
//! owner; only the owner can add versions or delete a graph. Stores never
//! retry: failures are returned to the caller as [`StoreError`].
//!
//! Two implementations are provided:
//! - [`MemoryGraphStore`] keeps records in memory
//! - [`FileGraphStore`] writes one JSON file per version

pub mod error;
pub mod file;
pub mod memory;
pub mod record;

pub use error::{Result, StoreError};
pub use file::FileGraphStore;
pub use memory::MemoryGraphStore;
pub use record::{GraphId, GraphRecord, GraphSummary, OwnerId};

use futures::future::BoxFuture;
use node_editor_graph::GraphSnapshot;

/// Persistence boundary for graph snapshots
pub trait GraphStore: Send + Sync {
    /// Store a new version of `graph` for `owner`.
    ///
    /// The first save of a graph creates version 1. Fails with
    /// [`StoreError::OwnerMismatch`] if the graph belongs to someone else.
    fn create<'a>(
        &'a self,
        owner: &'a OwnerId,
        graph: &'a GraphId,
        snapshot: GraphSnapshot,
    ) -> BoxFuture<'a, Result<GraphRecord>>;

    /// Latest version of a graph, if it exists
    fn latest<'a>(&'a self, graph: &'a GraphId) -> BoxFuture<'a, Result<Option<GraphRecord>>>;

    /// Every graph of an owner, latest version only, ordered by graph ID
    fn list_by_owner<'a>(&'a self, owner: &'a OwnerId) -> BoxFuture<'a, Result<Vec<GraphSummary>>>;

    /// Delete every version of a graph owned by `owner`.
    ///
    /// Returns false if the owner has no such graph.
    fn delete<'a>(&'a self, owner: &'a OwnerId, graph: &'a GraphId) -> BoxFuture<'a, Result<bool>>;
}

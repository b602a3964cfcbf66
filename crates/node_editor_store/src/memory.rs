// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory graph store.

use crate::error::{Result, StoreError};
use crate::record::{GraphId, GraphRecord, GraphSummary, OwnerId};
use crate::GraphStore;
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use node_editor_graph::GraphSnapshot;
use parking_lot::RwLock;

/// Graph store backed by a map; contents are lost on drop
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graphs: RwLock<IndexMap<GraphId, Vec<GraphRecord>>>,
}

impl MemoryGraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of versions stored for a graph
    pub fn version_count(&self, graph: &GraphId) -> usize {
        self.graphs.read().get(graph).map_or(0, Vec::len)
    }

    fn create_now(
        &self,
        owner: &OwnerId,
        graph: &GraphId,
        snapshot: GraphSnapshot,
    ) -> Result<GraphRecord> {
        let mut graphs = self.graphs.write();
        let versions = graphs.entry(graph.clone()).or_default();
        if let Some(last) = versions.last() {
            if last.owner_id != *owner {
                return Err(StoreError::OwnerMismatch {
                    graph: graph.clone(),
                    owner: owner.clone(),
                });
            }
        }
        let version = versions.last().map_or(1, |r| r.version + 1);
        let record = GraphRecord::new(graph.clone(), owner.clone(), version, snapshot);
        versions.push(record.clone());
        tracing::info!("Saved graph {} version {} for {}", graph, version, owner);
        Ok(record)
    }

    fn delete_now(&self, owner: &OwnerId, graph: &GraphId) -> bool {
        let mut graphs = self.graphs.write();
        let owned = graphs
            .get(graph)
            .and_then(|v| v.last())
            .is_some_and(|r| r.owner_id == *owner);
        if owned {
            graphs.shift_remove(graph);
            tracing::info!("Deleted graph {} for {}", graph, owner);
        }
        owned
    }
}

impl GraphStore for MemoryGraphStore {
    fn create<'a>(
        &'a self,
        owner: &'a OwnerId,
        graph: &'a GraphId,
        snapshot: GraphSnapshot,
    ) -> BoxFuture<'a, Result<GraphRecord>> {
        futures::future::ready(self.create_now(owner, graph, snapshot)).boxed()
    }

    fn latest<'a>(&'a self, graph: &'a GraphId) -> BoxFuture<'a, Result<Option<GraphRecord>>> {
        let record = self.graphs.read().get(graph).and_then(|v| v.last().cloned());
        futures::future::ready(Ok(record)).boxed()
    }

    fn list_by_owner<'a>(&'a self, owner: &'a OwnerId) -> BoxFuture<'a, Result<Vec<GraphSummary>>> {
        let mut summaries: Vec<GraphSummary> = self
            .graphs
            .read()
            .values()
            .filter_map(|v| v.last())
            .filter(|r| r.owner_id == *owner)
            .map(GraphRecord::summary)
            .collect();
        summaries.sort_by(|a, b| a.graph_id.cmp(&b.graph_id));
        futures::future::ready(Ok(summaries)).boxed()
    }

    fn delete<'a>(&'a self, owner: &'a OwnerId, graph: &'a GraphId) -> BoxFuture<'a, Result<bool>> {
        futures::future::ready(Ok(self.delete_now(owner, graph))).boxed()
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filesystem graph store.
//!
//! Layout: `<root>/<owner>/<graph>/v<version>.json`, one [`GraphRecord`]
//! per file. Versions are written to a temporary file and renamed into
//! place.

use crate::error::{Result, StoreError};
use crate::record::{GraphId, GraphRecord, GraphSummary, OwnerId};
use crate::GraphStore;
use futures::future::{BoxFuture, FutureExt};
use node_editor_graph::GraphSnapshot;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Graph store writing JSON files under a root directory
#[derive(Debug)]
pub struct FileGraphStore {
    root: PathBuf,
    // Serializes writers within this process
    write_lock: Mutex<()>,
}

impl FileGraphStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn graph_dir(&self, owner: &OwnerId, graph: &GraphId) -> PathBuf {
        self.root.join(owner.as_str()).join(graph.as_str())
    }

    async fn create_inner(
        &self,
        owner: &OwnerId,
        graph: &GraphId,
        snapshot: GraphSnapshot,
    ) -> Result<GraphRecord> {
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = self.find_owner(graph).await? {
            if existing != *owner {
                return Err(StoreError::OwnerMismatch {
                    graph: graph.clone(),
                    owner: owner.clone(),
                });
            }
        }

        let dir = self.graph_dir(owner, graph);
        tokio::fs::create_dir_all(&dir).await?;
        let version = latest_version(&dir).await?.map_or(1, |v| v + 1);
        let record = GraphRecord::new(graph.clone(), owner.clone(), version, snapshot);

        let tmp = dir.join(format!(".v{version}.json.tmp"));
        if let Err(e) = write_version(&tmp, &version_path(&dir, version), &record).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            if version == 1 {
                // Only removes the directory if nothing else landed in it
                let _ = tokio::fs::remove_dir(&dir).await;
            }
            tracing::warn!("Failed to save graph {} version {}: {}", graph, version, e);
            return Err(e);
        }

        tracing::info!("Saved graph {} version {} for {} to {:?}", graph, version, owner, dir);
        Ok(record)
    }

    // Owner holding at least one stored version of `graph`, if any
    async fn find_owner(&self, graph: &GraphId) -> Result<Option<OwnerId>> {
        for owner in list_dirs(&self.root).await? {
            let Ok(owner) = OwnerId::parse(owner) else {
                continue;
            };
            if latest_version(&self.graph_dir(&owner, graph)).await?.is_some() {
                return Ok(Some(owner));
            }
        }
        Ok(None)
    }

    async fn latest_inner(&self, graph: &GraphId) -> Result<Option<GraphRecord>> {
        let Some(owner) = self.find_owner(graph).await? else {
            return Ok(None);
        };
        let dir = self.graph_dir(&owner, graph);
        match latest_version(&dir).await? {
            Some(version) => read_record(&version_path(&dir, version)).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_inner(&self, owner: &OwnerId) -> Result<Vec<GraphSummary>> {
        let mut summaries = Vec::new();
        for graph in list_dirs(&self.root.join(owner.as_str())).await? {
            let Ok(graph) = GraphId::parse(graph) else {
                continue;
            };
            let dir = self.graph_dir(owner, &graph);
            if let Some(version) = latest_version(&dir).await? {
                summaries.push(read_record(&version_path(&dir, version)).await?.summary());
            }
        }
        summaries.sort_by(|a, b| a.graph_id.cmp(&b.graph_id));
        Ok(summaries)
    }

    async fn delete_inner(&self, owner: &OwnerId, graph: &GraphId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let dir = self.graph_dir(owner, graph);
        if latest_version(&dir).await?.is_none() {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(&dir).await?;
        tracing::info!("Deleted graph {} for {}", graph, owner);
        Ok(true)
    }
}

impl GraphStore for FileGraphStore {
    fn create<'a>(
        &'a self,
        owner: &'a OwnerId,
        graph: &'a GraphId,
        snapshot: GraphSnapshot,
    ) -> BoxFuture<'a, Result<GraphRecord>> {
        self.create_inner(owner, graph, snapshot).boxed()
    }

    fn latest<'a>(&'a self, graph: &'a GraphId) -> BoxFuture<'a, Result<Option<GraphRecord>>> {
        self.latest_inner(graph).boxed()
    }

    fn list_by_owner<'a>(&'a self, owner: &'a OwnerId) -> BoxFuture<'a, Result<Vec<GraphSummary>>> {
        self.list_inner(owner).boxed()
    }

    fn delete<'a>(&'a self, owner: &'a OwnerId, graph: &'a GraphId) -> BoxFuture<'a, Result<bool>> {
        self.delete_inner(owner, graph).boxed()
    }
}

async fn write_version(tmp: &Path, path: &Path, record: &GraphRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)?;
    tokio::fs::write(tmp, json).await?;
    tokio::fs::rename(tmp, path).await?;
    Ok(())
}

fn version_path(dir: &Path, version: u32) -> PathBuf {
    dir.join(format!("v{version}.json"))
}

fn parse_version(file_name: &str) -> Option<u32> {
    file_name.strip_prefix('v')?.strip_suffix(".json")?.parse().ok()
}

// Names of subdirectories; a missing directory has none
async fn list_dirs(path: &Path) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

async fn latest_version(dir: &Path) -> Result<Option<u32>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut latest = None;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(version) = name.to_str().and_then(parse_version) {
            latest = latest.max(Some(version));
        }
    }
    Ok(latest)
}

async fn read_record(path: &Path) -> Result<GraphRecord> {
    let content = tokio::fs::read(path).await?;
    let record: GraphRecord = serde_json::from_slice(&content)?;
    if path.file_name().and_then(|n| n.to_str()).and_then(parse_version) != Some(record.version) {
        return Err(StoreError::Corrupt(path.to_path_buf()));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_editor_graph::{NodeEditor, NodeType, Point};

    struct TempRoot(PathBuf);

    impl TempRoot {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("node-editor-store-{}", uuid::Uuid::new_v4())))
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn sample_snapshot() -> GraphSnapshot {
        let mut editor = NodeEditor::default();
        editor.add_node_type(NodeType::new("Box")).unwrap();
        editor.create_node("Box", Point::new(1.0, 2.0)).unwrap();
        editor.to_snapshot()
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("v12.json"), Some(12));
        assert_eq!(parse_version(".v3.json.tmp"), None);
        assert_eq!(parse_version("v.json"), None);
    }

    #[tokio::test]
    async fn test_round_trip_through_files() {
        let root = TempRoot::new();
        let store = FileGraphStore::new(&root.0);
        let owner = OwnerId::parse("alice").unwrap();
        let graph = GraphId::parse("flow").unwrap();

        assert!(store.latest(&graph).await.unwrap().is_none());
        assert!(store.list_by_owner(&owner).await.unwrap().is_empty());

        store.create(&owner, &graph, GraphSnapshot::default()).await.unwrap();
        let saved = store.create(&owner, &graph, sample_snapshot()).await.unwrap();
        assert_eq!(saved.version, 2);
        assert!(root.0.join("alice/flow/v1.json").exists());

        let latest = store.latest(&graph).await.unwrap().unwrap();
        assert_eq!(latest, saved);

        let listed = store.list_by_owner(&owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].latest_version, 2);
        assert_eq!(listed[0].node_count, 1);
    }

    #[tokio::test]
    async fn test_owner_checks() {
        let root = TempRoot::new();
        let store = FileGraphStore::new(&root.0);
        let alice = OwnerId::parse("alice").unwrap();
        let bob = OwnerId::parse("bob").unwrap();
        let graph = GraphId::parse("flow").unwrap();

        store.create(&alice, &graph, GraphSnapshot::default()).await.unwrap();
        assert!(matches!(
            store.create(&bob, &graph, GraphSnapshot::default()).await,
            Err(StoreError::OwnerMismatch { .. })
        ));
        assert!(!store.delete(&bob, &graph).await.unwrap());
        assert!(store.delete(&alice, &graph).await.unwrap());
        assert!(store.latest(&graph).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_graph_dir_does_not_claim_ownership() {
        let root = TempRoot::new();
        std::fs::create_dir_all(root.0.join("alice/flow")).unwrap();
        let store = FileGraphStore::new(&root.0);
        let bob = OwnerId::parse("bob").unwrap();
        let graph = GraphId::parse("flow").unwrap();

        assert!(store.latest(&graph).await.unwrap().is_none());
        let saved = store.create(&bob, &graph, GraphSnapshot::default()).await.unwrap();
        assert_eq!(saved.owner_id, bob);
        assert_eq!(saved.version, 1);
        assert_eq!(store.latest(&graph).await.unwrap().unwrap().owner_id, bob);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_graph_dir() {
        let root = TempRoot::new();
        // A directory where the version file should go makes the rename fail
        std::fs::create_dir_all(root.0.join("alice/flow/v1.json/blocker")).unwrap();
        let store = FileGraphStore::new(&root.0);
        let alice = OwnerId::parse("alice").unwrap();
        let graph = GraphId::parse("flow").unwrap();

        assert!(store.create(&alice, &graph, GraphSnapshot::default()).await.is_err());
        assert!(!root.0.join("alice/flow/.v1.json.tmp").exists());
        assert!(store.latest(&graph).await.unwrap().is_none());

        // Nothing was stored, so the ID is still free for anyone
        let bob = OwnerId::parse("bob").unwrap();
        assert!(store.create(&bob, &graph, GraphSnapshot::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mismatched_version_is_corrupt() {
        let root = TempRoot::new();
        let store = FileGraphStore::new(&root.0);
        let owner = OwnerId::parse("alice").unwrap();
        let graph = GraphId::parse("flow").unwrap();
        store.create(&owner, &graph, GraphSnapshot::default()).await.unwrap();

        let dir = root.0.join("alice/flow");
        std::fs::copy(dir.join("v1.json"), dir.join("v7.json")).unwrap();
        assert!(matches!(store.latest(&graph).await, Err(StoreError::Corrupt(_))));
    }
}

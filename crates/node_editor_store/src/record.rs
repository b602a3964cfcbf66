// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stored graph records and their identifiers.

use crate::error::StoreError;
use node_editor_graph::GraphSnapshot;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const MAX_ID_LEN: usize = 128;

// IDs double as path components in the file store.
fn check_id(raw: &str) -> Result<(), StoreError> {
    let valid = !raw.is_empty()
        && raw.len() <= MAX_ID_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(raw.to_string()))
    }
}

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap an identifier
            pub fn parse(raw: impl Into<String>) -> Result<Self, StoreError> {
                let raw = raw.into();
                check_id(&raw)?;
                Ok(Self(raw))
            }

            /// The raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = StoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

store_id!(
    /// Identifier of a stored graph
    GraphId
);

store_id!(
    /// Identifier of the user that owns a graph
    OwnerId
);

impl GraphId {
    /// Create a new random graph ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// One saved version of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecord {
    /// Graph ID
    pub graph_id: GraphId,
    /// Owning user
    pub owner_id: OwnerId,
    /// Version number, starting at 1
    pub version: u32,
    /// Save time, seconds since the Unix epoch
    pub saved_at: u64,
    /// The saved graph
    pub snapshot: GraphSnapshot,
}

impl GraphRecord {
    /// Create a record stamped with the current time
    pub fn new(graph_id: GraphId, owner_id: OwnerId, version: u32, snapshot: GraphSnapshot) -> Self {
        Self {
            graph_id,
            owner_id,
            version,
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            snapshot,
        }
    }

    /// Summary of this record
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            graph_id: self.graph_id.clone(),
            owner_id: self.owner_id.clone(),
            latest_version: self.version,
            saved_at: self.saved_at,
            node_count: self.snapshot.nodes.len(),
        }
    }
}

/// Listing entry for a graph: its latest version only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    /// Graph ID
    pub graph_id: GraphId,
    /// Owning user
    pub owner_id: OwnerId,
    /// Highest stored version
    pub latest_version: u32,
    /// Save time of the latest version
    pub saved_at: u64,
    /// Number of nodes in the latest version
    pub node_count: usize,
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Store errors.

use crate::record::{GraphId, OwnerId};
use std::path::PathBuf;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Identifier is empty, too long, or has characters outside `[A-Za-z0-9_-]`
    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),

    /// The graph exists but belongs to another owner
    #[error("Graph {graph} is not owned by {owner}")]
    OwnerMismatch {
        /// Graph ID
        graph: GraphId,
        /// Owner that attempted the write
        owner: OwnerId,
    },

    /// A stored file does not follow the store layout
    #[error("Unexpected entry in store: {0:?}")]
    Corrupt(PathBuf),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

// crates/flowctl-store-sqlite/src/error.rs
// ============================================================================
// Module: SQLite Store Error
// Description: The single error type every trait impl in this crate maps
// into its consumer's own `*StoreError` newtype.
// Purpose: Give connection setup, migration, and query failures one shape
// before they cross into `flowctl-graph`/`flowctl-install`/`flowctl-intent`/
// `flowctl-promotion`/`flowctl-workflow`'s storage-trait error types.
// Dependencies: rusqlite, thiserror
// ============================================================================

use thiserror::Error;

use flowctl_graph::GraphStoreError;
use flowctl_install::InstallStoreError;
use flowctl_intent::IntentStoreError;
use flowctl_promotion::PromotionStoreError;
use flowctl_workflow::WorkflowError;

/// Error returned by connection setup, migration, or any query this crate
/// runs against its single `SQLite` connection.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The connection could not be opened or configured.
    #[error("sqlite connection error: {0}")]
    Connection(String),
    /// The on-disk schema version is newer than this binary understands.
    #[error("sqlite schema version mismatch: {0}")]
    VersionMismatch(String),
    /// A query failed.
    #[error("sqlite query error: {0}")]
    Query(String),
    /// A stored JSON column failed to (de)serialize.
    #[error("sqlite json encoding error: {0}")]
    Json(String),
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<serde_json::Error> for SqliteStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<SqliteStoreError> for GraphStoreError {
    fn from(err: SqliteStoreError) -> Self {
        Self(err.to_string())
    }
}

impl From<SqliteStoreError> for InstallStoreError {
    fn from(err: SqliteStoreError) -> Self {
        Self(err.to_string())
    }
}

impl From<SqliteStoreError> for IntentStoreError {
    fn from(err: SqliteStoreError) -> Self {
        Self(err.to_string())
    }
}

impl From<SqliteStoreError> for PromotionStoreError {
    fn from(err: SqliteStoreError) -> Self {
        Self(err.to_string())
    }
}

impl From<SqliteStoreError> for WorkflowError {
    fn from(err: SqliteStoreError) -> Self {
        Self::Store(err.to_string())
    }
}

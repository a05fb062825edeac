// crates/flowctl-install/src/error.rs
// ============================================================================
// Module: Install Errors
// Description: Closed taxonomy for engine-level aborts (storage failures),
// distinct from the validation/conflict outcomes captured as a value in
// `InstallReport`.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors that abort an install call outright. Validation failures,
/// ownership conflicts, and version-downgrade rejections are never raised;
/// they are captured into the returned [`crate::pipeline::InstallReport`].
#[derive(Debug, Error)]
pub enum InstallError {
    /// The graph store returned an error while building the current
    /// snapshot.
    #[error("graph store error: {0}")]
    Graph(#[from] flowctl_graph::GraphStoreError),
    /// The install store returned an error.
    #[error("install store error: {0}")]
    Store(String),
    /// The workflow store returned an error while applying a package
    /// workflow.
    #[error("workflow store error: {0}")]
    Workflow(#[from] flowctl_workflow::WorkflowError),
}

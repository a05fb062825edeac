// crates/flowctl-workflow/src/error.rs
// ============================================================================
// Module: Workflow Errors
// Description: Closed error taxonomy for engine-level failures (storage,
// missing/misowned definitions, invalid resume targets).
// Purpose: Distinguish engine-level errors (which abort the call) from
// step-runtime failures (which are captured as a terminal execution status
// and returned as a value, never raised).
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors that abort an engine call outright, as opposed to step-runtime
/// failures that are captured into the execution's own `failed` status.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No definition exists with the given id for this tenant.
    #[error("workflow definition not found")]
    DefinitionNotFound,
    /// The definition exists but is not `active`.
    #[error("workflow definition is not active")]
    DefinitionNotActive,
    /// No execution exists with the given id for this tenant.
    #[error("workflow execution not found")]
    ExecutionNotFound,
    /// `resumeWorkflowExecution` was called on an execution that is not
    /// `paused`.
    #[error("workflow execution is not paused")]
    ExecutionNotPaused,
    /// The step execution id passed to resume does not match the
    /// execution's paused step, or is not `awaiting_approval`.
    #[error("step execution is not the one awaiting approval")]
    StepExecutionMismatch,
    /// Activation-time validation found one or more invalid decision steps.
    #[error("activation validation failed: {0:?}")]
    ActivationValidation(Vec<String>),
    /// The storage facade returned an error.
    #[error("workflow store error: {0}")]
    Store(String),
}

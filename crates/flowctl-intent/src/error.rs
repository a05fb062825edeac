// crates/flowctl-intent/src/error.rs
// ============================================================================
// Module: Intent Errors
// Description: Closed taxonomy for dispatcher-level aborts.
// Purpose: Distinguish calls the dispatcher cannot complete at all from
// per-intent outcomes, which are recorded onto the intent row rather than
// raised.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors that abort a call to the dispatcher outright. A workflow engine
/// failure while dispatching one intent is never one of these; it is
/// recorded as that intent's `failed` status instead (spec.md §4.6, steps
/// 1 and 5).
#[derive(Debug, Error)]
pub enum IntentError {
    /// The intent store returned an error.
    #[error("intent store error: {0}")]
    Store(String),
}

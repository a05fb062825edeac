// crates/flowctl-promotion/src/error.rs
// ============================================================================
// Module: Promotion Errors
// Description: Closed taxonomy for promotion engine aborts.
// Dependencies: flowctl-install, thiserror
// ============================================================================

use thiserror::Error;

use crate::row::PromotionStatus;

/// Errors raised by the promotion pipeline.
#[derive(Debug, Error)]
pub enum PromotionError {
    /// The promotion store returned an error.
    #[error("promotion store error: {0}")]
    Store(String),
    /// The install engine returned an error while executing a promotion.
    #[error("install engine error: {0}")]
    Install(#[from] flowctl_install::InstallError),
    /// The requested transition is not legal from the intent's current
    /// status (spec.md §4.9 state machine).
    #[error("cannot transition promotion intent from {from:?} via {attempted}")]
    InvalidTransition {
        /// The intent's status at the time of the attempted transition.
        from: PromotionStatus,
        /// Name of the attempted transition (`preview`, `approve`, ...).
        attempted: &'static str,
    },
    /// No intent exists with the given id.
    #[error("promotion intent not found")]
    NotFound,
}

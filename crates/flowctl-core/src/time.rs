// crates/flowctl-core/src/time.rs
// ============================================================================
// Module: Flowctl Time Model
// Description: Canonical timestamp representation for contexts, executions,
// and audit events.
// Purpose: Keep time explicit and caller-supplied so engine behavior stays
// deterministic and replayable.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The execution and install engines never read wall-clock time directly;
//! every timestamp is supplied explicitly by the caller (the composition
//! root, a storage row, or a request). This keeps `executeWorkflow`,
//! `installGraphPackage`, and the promotion state machine deterministic given
//! the same inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix epoch milliseconds, supplied by the caller.
///
/// # Invariants
/// - No validation is performed; monotonicity across related records is a
///   caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}

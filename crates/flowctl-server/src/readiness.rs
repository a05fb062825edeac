// crates/flowctl-server/src/readiness.rs
// ============================================================================
// Module: Readiness Probe
// Description: A storage-facade-agnostic readiness check for `GET /health`.
// Purpose: Let the composition root report whether its concrete storage
// backend (flowctl-store-sqlite or otherwise) is reachable, without this
// crate depending on a concrete storage crate itself.
// Dependencies: none
// ============================================================================

/// Reports whether this process's storage facade is reachable.
///
/// # Invariants
/// - `is_ready` never panics; a storage failure is reported as `false`, not
///   propagated.
pub trait ReadinessProbe: Send + Sync {
    /// Returns `true` when the storage facade can serve reads.
    fn is_ready(&self) -> bool;
}

/// A probe that is always ready. Used by tests and by any deployment with no
/// storage backend to check.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReady;

impl ReadinessProbe for AlwaysReady {
    fn is_ready(&self) -> bool {
        true
    }
}

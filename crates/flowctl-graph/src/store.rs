// crates/flowctl-graph/src/store.rs
// ============================================================================
// Module: Graph Store Trait
// Description: The tenant-scoped storage surface `buildGraphSnapshot` reads
// through.
// Purpose: Let snapshot composition be tested against an in-memory fake and
// let `flowctl-store-sqlite` supply the real implementation.
// Dependencies: flowctl-core, crate::snapshot, thiserror
// ============================================================================

use thiserror::Error;

use flowctl_core::TenantContext;

use crate::snapshot::GraphBindings;
use crate::snapshot::RecordTypeNode;

/// Error returned by a [`GraphStore`] implementation.
#[derive(Debug, Error)]
#[error("graph store error: {0}")]
pub struct GraphStoreError(pub String);

/// The only storage surface `buildGraphSnapshot` consumes.
///
/// # Invariants
/// - Every read is scoped to the passed [`TenantContext`]; cross-tenant
///   reads are structurally impossible through this trait.
pub trait GraphStore: Send + Sync {
    /// Lists every record type belonging to the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] on a storage failure.
    fn list_record_types(&self, tenant: &TenantContext) -> Result<Vec<RecordTypeNode>, GraphStoreError>;

    /// Lists every binding (workflows, SLAs, assignments, change policies)
    /// belonging to the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] on a storage failure.
    fn list_bindings(&self, tenant: &TenantContext) -> Result<GraphBindings, GraphStoreError>;
}

/// Builds the full tenant-wide [`crate::snapshot::GraphSnapshot`] from
/// storage reads (spec.md §4.7 `buildGraphSnapshot`). Callers that need a
/// single project's view should call
/// [`crate::snapshot::GraphSnapshot::project_view`] on the result.
///
/// # Errors
///
/// Returns [`GraphStoreError`] on a storage failure.
pub fn build_graph_snapshot(
    store: &dyn GraphStore,
    tenant: &TenantContext,
    now: flowctl_core::Timestamp,
) -> Result<crate::snapshot::GraphSnapshot, GraphStoreError> {
    let record_types = store.list_record_types(tenant)?;
    let bindings = store.list_bindings(tenant)?;
    let edges = crate::snapshot::derive_edges(&record_types);
    Ok(crate::snapshot::GraphSnapshot {
        tenant_id: tenant.tenant_id.clone(),
        built_at: now,
        record_types,
        edges,
        bindings,
    })
}

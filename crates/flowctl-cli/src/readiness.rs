// crates/flowctl-cli/src/readiness.rs
// ============================================================================
// Module: Storage Readiness Probe
// Description: Adapts `SqliteStore` to `flowctl_server::ReadinessProbe`.
// Purpose: Let `GET /health` report whether the sqlite store is reachable
// without `flowctl-server` depending on `flowctl-store-sqlite` itself.
// Dependencies: flowctl-server, flowctl-store-sqlite
// ============================================================================

use std::sync::Arc;

use flowctl_server::ReadinessProbe;
use flowctl_store_sqlite::SqliteStore;

/// Reports ready when the wrapped store can list tenants without error.
pub struct SqliteReadiness {
    store: Arc<SqliteStore>,
}

impl SqliteReadiness {
    /// Wraps `store` as a readiness probe.
    #[must_use]
    pub const fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

impl ReadinessProbe for SqliteReadiness {
    fn is_ready(&self) -> bool {
        self.store.list_tenant_ids().is_ok()
    }
}

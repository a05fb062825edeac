// crates/flowctl-store-sqlite/src/lib.rs
// ============================================================================
// Module: Flowctl SQLite Storage Facade
// Description: Single-connection SQLite implementation of every tenant-
// scoped storage trait the workflow engine, intent dispatcher, graph/install
// engines, and promotion pipeline consume (C11).
// Purpose: Give the composition root one concrete, durable storage backend
// without any of C5-C10 depending on a concrete database crate themselves.
// Dependencies: rusqlite, flowctl-core, flowctl-graph, flowctl-install,
// flowctl-intent, flowctl-promotion, flowctl-workflow, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteStore`] wraps a single [`rusqlite::Connection`] behind a
//! [`std::sync::Mutex`] and implements every storage trait `flowctl-graph`,
//! `flowctl-install`, `flowctl-intent`, `flowctl-promotion`, and
//! `flowctl-workflow` define. Every read method accepts a
//! [`flowctl_core::TenantContext`] and filters by `tenant_id` in the `WHERE`
//! clause itself, so a cross-tenant read is structurally impossible through
//! this crate (spec.md §4.11).
//!
//! Dynamic payloads (step configs, package contents, trigger payloads) are
//! stored as `TEXT` columns holding canonical `serde_json` output; nothing
//! here interprets their contents beyond round-tripping the strongly typed
//! shapes each consumer crate already defines.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod error;
mod graph_store;
mod install_store;
mod intent_store;
mod promotion_store;
mod schema;
mod workflow_store;

pub use error::SqliteStoreError;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;

use flowctl_core::CapabilityProfile;
use flowctl_core::ChangeId;
use flowctl_core::ModuleId;
use flowctl_core::ProjectId;
use flowctl_core::TenantContext;
use flowctl_core::TenantId;
use flowctl_promotion::EnvironmentConfig;

// ============================================================================
// SECTION: Store
// ============================================================================

/// A single `SQLite` connection implementing the platform's entire
/// tenant-scoped storage surface.
///
/// # Invariants
/// - One [`Connection`] per process, serialized behind a [`Mutex`]; callers
///   needing read parallelism should run multiple processes against the
///   same WAL-mode file rather than pool connections here.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if absent) the database file at `path`, applying
    /// pragmas and schema migration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a connection, pragma, or migration
    /// failure.
    pub fn open(path: &Path) -> Result<Self, SqliteStoreError> {
        let conn = Connection::open(path).map_err(|err| SqliteStoreError::Connection(err.to_string()))?;
        schema::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens an in-process, non-persisted database. Used by tests and by
    /// any deployment that accepts losing state on restart.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a connection or migration failure.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_in_memory().map_err(|err| SqliteStoreError::Connection(err.to_string()))?;
        schema::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Registers a module under `tenant`'s project `project_id`, so the
    /// intent dispatcher's [`flowctl_intent::IntentStore::resolve_module_context`]
    /// fallback ("any module in any project of the tenant") has something
    /// to find. Not part of any storage trait: modules are authored out of
    /// band of this system's C5-C10 scope, so the composition root seeds
    /// them directly.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a query failure.
    pub fn seed_module(
        &self,
        tenant: &TenantContext,
        project_id: &ProjectId,
        module_id: &ModuleId,
        profile: CapabilityProfile,
        root_path: &str,
    ) -> Result<(), SqliteStoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO modules (tenant_id, module_id, project_id, capability_profile, root_path)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (tenant_id, module_id) DO UPDATE SET
                project_id = excluded.project_id,
                capability_profile = excluded.capability_profile,
                root_path = excluded.root_path",
            rusqlite::params![
                tenant.tenant_id.as_str(),
                module_id.as_str(),
                project_id.as_str(),
                profile_name(profile),
                root_path,
            ],
        )?;
        Ok(())
    }

    /// Links a change record to the module it was authored for, so
    /// [`flowctl_intent::IntentStore::resolve_module_context`] can prefer
    /// the module a workflow definition's originating change names
    /// (spec.md §4.6 step 2).
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a query failure.
    pub fn seed_change(&self, tenant: &TenantContext, change_id: &ChangeId, module_id: &ModuleId) -> Result<(), SqliteStoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO changes (change_id, tenant_id, module_id) VALUES (?1, ?2, ?3)
             ON CONFLICT (change_id) DO UPDATE SET module_id = excluded.module_id",
            rusqlite::params![change_id.as_str(), tenant.tenant_id.as_str(), module_id.as_str()],
        )?;
        Ok(())
    }

    /// Registers a named environment slot (`dev`, `test`, `prod`, ...) for
    /// the promotion pipeline to diff and gate against. Environment
    /// configuration is authored out of band of C9's own storage trait
    /// (spec.md §4.9 "Environments are named slots"), so the composition
    /// root seeds them directly, mirroring [`Self::seed_module`].
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a query failure.
    pub fn seed_environment(&self, tenant: &TenantContext, env: &EnvironmentConfig) -> Result<(), SqliteStoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO environments (tenant_id, environment_id, requires_promotion_approval, webhook_url)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (tenant_id, environment_id) DO UPDATE SET
                requires_promotion_approval = excluded.requires_promotion_approval,
                webhook_url = excluded.webhook_url",
            rusqlite::params![
                tenant.tenant_id.as_str(),
                env.id.as_str(),
                i64::from(env.requires_promotion_approval),
                env.webhook_url.as_deref(),
            ],
        )?;
        Ok(())
    }

    /// Lists every tenant with at least one registered module, so the
    /// composition root's dispatch loop knows which tenants to drain each
    /// tick without a dedicated tenant-registry trait.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a query failure.
    pub fn list_tenant_ids(&self) -> Result<Vec<TenantId>, SqliteStoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT DISTINCT tenant_id FROM modules ORDER BY tenant_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut tenants = Vec::new();
        for row in rows {
            tenants.push(TenantId::new(row?));
        }
        Ok(tenants)
    }
}

/// Resolves a [`CapabilityProfile`] to the stable wire name
/// [`CapabilityProfile::from_name`] parses back, so profiles round-trip
/// through a `TEXT` column unchanged.
fn profile_name(profile: CapabilityProfile) -> &'static str {
    match profile {
        CapabilityProfile::CodeModuleDefault => "CODE_MODULE_DEFAULT",
        CapabilityProfile::WorkflowModuleDefault => "WORKFLOW_MODULE_DEFAULT",
        CapabilityProfile::ReadOnly => "READ_ONLY",
        CapabilityProfile::SystemPrivileged => "SYSTEM_PRIVILEGED",
    }
}


// crates/flowctl-store-sqlite/src/schema.rs
// ============================================================================
// Module: SQLite Schema & Migration
// Description: DDL for every tenant-scoped table this crate's trait impls
// read and write, applied idempotently at startup behind a `schema_version`
// pragma-style meta table.
// Purpose: Keep connection setup (pragmas, journal mode) and table creation
// in one place instead of scattered across each trait impl module.
// Dependencies: rusqlite
// ============================================================================

use rusqlite::Connection;

use crate::error::SqliteStoreError;

/// Current schema version. Bump and add an upgrade branch in
/// [`apply_migrations`] when the DDL below changes shape.
pub const SCHEMA_VERSION: i64 = 1;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS store_meta (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS modules (
    tenant_id TEXT NOT NULL,
    module_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    capability_profile TEXT NOT NULL,
    root_path TEXT NOT NULL,
    PRIMARY KEY (tenant_id, module_id)
);

CREATE TABLE IF NOT EXISTS changes (
    change_id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    module_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS record_types (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    key TEXT NOT NULL,
    name TEXT,
    base_type TEXT,
    fields_json TEXT NOT NULL,
    sla_duration_minutes INTEGER,
    assignment_strategy_json TEXT,
    owning_package_key TEXT,
    PRIMARY KEY (tenant_id, project_id, key)
);

CREATE TABLE IF NOT EXISTS workflow_definitions (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    name TEXT NOT NULL,
    trigger_type TEXT NOT NULL,
    trigger_config_json TEXT NOT NULL,
    version INTEGER NOT NULL,
    status TEXT NOT NULL,
    change_id TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS workflow_steps (
    id TEXT PRIMARY KEY,
    workflow_definition_id TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    config_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workflow_executions (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    workflow_definition_id TEXT NOT NULL,
    intent_id TEXT NOT NULL,
    input_json TEXT NOT NULL,
    status TEXT NOT NULL,
    paused_at_step_id TEXT,
    accumulated_input_json TEXT,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    error TEXT
);

CREATE TABLE IF NOT EXISTS workflow_step_executions (
    id TEXT PRIMARY KEY,
    workflow_execution_id TEXT NOT NULL,
    workflow_step_id TEXT NOT NULL,
    status TEXT NOT NULL,
    output_json TEXT,
    executed_at INTEGER
);

CREATE TABLE IF NOT EXISTS record_locks (
    tenant_id TEXT NOT NULL,
    record_type_id TEXT NOT NULL,
    record_id TEXT NOT NULL,
    execution_id TEXT NOT NULL,
    PRIMARY KEY (tenant_id, record_type_id, record_id)
);

CREATE TABLE IF NOT EXISTS workflow_execution_intents (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    workflow_definition_id TEXT NOT NULL,
    trigger_type TEXT NOT NULL,
    trigger_payload_json TEXT NOT NULL,
    idempotency_key TEXT,
    status TEXT NOT NULL,
    execution_id TEXT,
    error TEXT,
    created_at INTEGER NOT NULL,
    dispatched_at INTEGER
);

CREATE UNIQUE INDEX IF NOT EXISTS workflow_execution_intents_idempotency
    ON workflow_execution_intents (tenant_id, idempotency_key)
    WHERE idempotency_key IS NOT NULL;

CREATE TABLE IF NOT EXISTS graph_package_installs (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    package_key TEXT NOT NULL,
    version TEXT NOT NULL,
    checksum TEXT NOT NULL,
    diff_json TEXT NOT NULL,
    package_contents_json TEXT NOT NULL,
    installed_by TEXT,
    installed_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS environments (
    tenant_id TEXT NOT NULL,
    environment_id TEXT NOT NULL,
    requires_promotion_approval INTEGER NOT NULL,
    webhook_url TEXT,
    PRIMARY KEY (tenant_id, environment_id)
);

CREATE TABLE IF NOT EXISTS environment_package_installs (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    environment_id TEXT NOT NULL,
    package_key TEXT NOT NULL,
    version TEXT NOT NULL,
    checksum TEXT NOT NULL,
    package_contents_json TEXT NOT NULL,
    PRIMARY KEY (tenant_id, project_id, environment_id, package_key)
);

CREATE TABLE IF NOT EXISTS promotion_intents (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    from_environment_id TEXT NOT NULL,
    to_environment_id TEXT NOT NULL,
    status TEXT NOT NULL,
    diff_json TEXT,
    result_json TEXT,
    created_by TEXT,
    approved_by TEXT,
    approved_at INTEGER,
    notification_status TEXT
);
";

/// Opens pragmas (WAL journal, foreign keys) and applies the schema,
/// creating every table this crate's trait impls depend on if absent.
///
/// # Errors
///
/// Returns [`SqliteStoreError::VersionMismatch`] when `store_meta` already
/// holds a version newer than [`SCHEMA_VERSION`], and
/// [`SqliteStoreError::Connection`]/[`SqliteStoreError::Query`] on any
/// pragma or DDL failure.
pub fn init(conn: &Connection) -> Result<(), SqliteStoreError> {
    conn.pragma_update(None, "journal_mode", "wal").map_err(|err| SqliteStoreError::Connection(err.to_string()))?;
    conn.pragma_update(None, "foreign_keys", "on").map_err(|err| SqliteStoreError::Connection(err.to_string()))?;
    conn.busy_timeout(std::time::Duration::from_millis(5_000)).map_err(|err| SqliteStoreError::Connection(err.to_string()))?;

    conn.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let existing: Option<i64> = conn.query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0)).ok();
    match existing {
        None => {
            conn.execute("INSERT INTO store_meta (version) VALUES (?1)", [SCHEMA_VERSION])?;
        }
        Some(version) if version == SCHEMA_VERSION => {}
        Some(version) if version < SCHEMA_VERSION => {
            conn.execute("UPDATE store_meta SET version = ?1", [SCHEMA_VERSION])?;
        }
        Some(version) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "on-disk schema version {version} is newer than this binary's {SCHEMA_VERSION}"
            )));
        }
    }

    conn.execute_batch(DDL)?;
    Ok(())
}

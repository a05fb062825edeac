// crates/flowctl-install/src/change.rs
// ============================================================================
// Module: Change Patch Execution
// Description: Applies an ordered batch of `set_field` patch ops against
// record type schemas, rolling back in reverse order on any failure.
// Purpose: Implement spec.md §4.8's "Rollback in patch execution" sibling
// path to the install pipeline.
// Dependencies: flowctl-core, serde_json, thiserror
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use flowctl_core::ChangeId;
use flowctl_core::RecordTypeKey;
use flowctl_core::TenantContext;

use crate::row::RecordTypeSnapshot;

/// One `set_field` operation within a change's patch batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOp {
    /// Record type this op targets.
    pub record_type_key: RecordTypeKey,
    /// Name of the field to set.
    pub field_name: String,
    /// New value for the field.
    pub value: Value,
}

/// Error returned by a [`ChangeStore`] implementation.
#[derive(Debug, Error)]
#[error("change store error: {0}")]
pub struct ChangeStoreError(pub String);

/// The storage surface `executeChange` consumes: record type schema reads
/// and writes, plus the pre-mutation snapshot table rollback reads from.
pub trait ChangeStore: Send + Sync {
    /// Returns the current full schema for `key`, as storage holds it.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeStoreError`] on a storage failure or unknown key.
    fn get_record_type_schema(&self, tenant: &TenantContext, key: &RecordTypeKey) -> Result<Value, ChangeStoreError>;

    /// Persists the pre-mutation snapshot for `(change_id, record_type_key)`,
    /// a no-op if one already exists (each record type gets exactly one
    /// snapshot per change).
    ///
    /// # Errors
    ///
    /// Returns [`ChangeStoreError`] on a storage failure.
    fn save_record_type_snapshot(&self, snapshot: &RecordTypeSnapshot) -> Result<(), ChangeStoreError>;

    /// Returns the snapshot captured for `(change_id, record_type_key)`, if
    /// one has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeStoreError`] on a storage failure.
    fn get_record_type_snapshot(&self, change_id: &ChangeId, key: &RecordTypeKey) -> Result<Option<RecordTypeSnapshot>, ChangeStoreError>;

    /// Applies a single `set_field` op to `key`'s schema.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeStoreError`] on a storage failure or invalid field.
    fn apply_set_field(&self, tenant: &TenantContext, key: &RecordTypeKey, field_name: &str, value: &Value) -> Result<(), ChangeStoreError>;

    /// Overwrites `key`'s schema with `schema` wholesale, used during
    /// rollback.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeStoreError`] on a storage failure.
    fn restore_record_type_schema(&self, tenant: &TenantContext, key: &RecordTypeKey, schema: &Value) -> Result<(), ChangeStoreError>;
}

/// Errors raised by [`execute_change`].
#[derive(Debug, Error)]
pub enum ChangeError {
    /// A patch op failed to apply; rollback of every prior op in this batch
    /// was attempted, possibly itself incompletely (see `rollback_error`).
    #[error("patch op on {record_type_key} failed: {cause}")]
    PatchFailed {
        /// Record type the failing op targeted.
        record_type_key: RecordTypeKey,
        /// The underlying storage error.
        cause: String,
        /// Set if rollback itself also failed for one or more record types.
        rollback_error: Option<String>,
    },
    /// The store returned an error outside of patch application itself
    /// (snapshot capture).
    #[error("change store error: {0}")]
    Store(#[from] ChangeStoreError),
}

/// Applies `ops` to `change_id`'s record types in order. Before a record
/// type's first mutation within this change, its current schema is captured
/// into a [`RecordTypeSnapshot`]. If any op fails, every record type touched
/// so far by this call is restored from its captured snapshot in reverse
/// application order, and the original failure is returned (spec.md §4.8
/// "Rollback in patch execution").
///
/// # Errors
///
/// Returns [`ChangeError::PatchFailed`] if an op fails (rollback is
/// attempted regardless), or [`ChangeError::Store`] if snapshot capture
/// itself fails before any mutation was attempted.
pub fn execute_change(store: &dyn ChangeStore, tenant: &TenantContext, change_id: &ChangeId, ops: &[PatchOp]) -> Result<(), ChangeError> {
    let mut touched: Vec<RecordTypeKey> = Vec::new();

    for op in ops {
        if store.get_record_type_snapshot(change_id, &op.record_type_key)?.is_none() {
            let prior_schema = store.get_record_type_schema(tenant, &op.record_type_key)?;
            store.save_record_type_snapshot(&RecordTypeSnapshot {
                change_id: change_id.clone(),
                record_type_key: op.record_type_key.clone(),
                prior_schema,
            })?;
        }
        if !touched.contains(&op.record_type_key) {
            touched.push(op.record_type_key.clone());
        }

        if let Err(err) = store.apply_set_field(tenant, &op.record_type_key, &op.field_name, &op.value) {
            let rollback_error = rollback(store, tenant, change_id, &touched);
            return Err(ChangeError::PatchFailed {
                record_type_key: op.record_type_key.clone(),
                cause: err.0,
                rollback_error,
            });
        }
    }

    Ok(())
}

/// Restores every record type in `touched`, in reverse order, from its
/// captured snapshot. Returns a description of any record type that could
/// not be restored, rather than aborting partway through the rollback.
fn rollback(store: &dyn ChangeStore, tenant: &TenantContext, change_id: &ChangeId, touched: &[RecordTypeKey]) -> Option<String> {
    let mut failures = Vec::new();
    for key in touched.iter().rev() {
        match store.get_record_type_snapshot(change_id, key) {
            Ok(Some(snapshot)) => {
                if let Err(err) = store.restore_record_type_schema(tenant, key, &snapshot.prior_schema) {
                    failures.push(format!("{key}: {err}"));
                }
            }
            Ok(None) => failures.push(format!("{key}: no snapshot available to roll back to")),
            Err(err) => failures.push(format!("{key}: failed reading snapshot during rollback: {err}")),
        }
    }
    if failures.is_empty() {
        None
    } else {
        Some(failures.join("; "))
    }
}

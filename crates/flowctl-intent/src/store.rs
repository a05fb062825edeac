// crates/flowctl-intent/src/store.rs
// ============================================================================
// Module: Intent Store Trait
// Description: The tenant-scoped storage surface the dispatcher reads and
// writes through.
// Purpose: Let the dispatcher be tested against an in-memory fake and let
// `flowctl-store-sqlite` supply the real implementation.
// Dependencies: flowctl-core, crate::row, thiserror
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use flowctl_core::IntentId;
use flowctl_core::ModuleExecutionContext;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_workflow::TriggerType;

use crate::row::WorkflowExecutionIntent;

/// Error returned by an [`IntentStore`] implementation.
#[derive(Debug, Error)]
#[error("intent store error: {0}")]
pub struct IntentStoreError(pub String);

/// The only storage surface the intent dispatcher consumes.
pub trait IntentStore: Send + Sync {
    /// Creates a new `pending` intent, or returns the pre-existing row when
    /// `idempotency_key` is `Some` and already present for the tenant
    /// (spec.md §4.6 "Idempotency").
    ///
    /// # Errors
    ///
    /// Returns [`IntentStoreError`] on a storage failure.
    #[allow(clippy::too_many_arguments, reason = "threads every field of a new intent row explicitly")]
    fn create_intent(
        &self,
        tenant: &TenantContext,
        workflow_definition_id: &WorkflowDefinitionId,
        trigger_type: TriggerType,
        trigger_payload: Value,
        idempotency_key: Option<&str>,
        id: IntentId,
        now: Timestamp,
    ) -> Result<WorkflowExecutionIntent, IntentStoreError>;

    /// Lists this tenant's `pending` intents oldest-first by `created_at`
    /// (spec.md §4.6 "Pending intents form a FIFO").
    ///
    /// # Errors
    ///
    /// Returns [`IntentStoreError`] on a storage failure.
    fn list_pending_intents(&self, tenant: &TenantContext) -> Result<Vec<WorkflowExecutionIntent>, IntentStoreError>;

    /// Records a successful dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`IntentStoreError`] on a storage failure.
    fn mark_dispatched(&self, tenant: &TenantContext, id: &IntentId, execution_id: &WorkflowExecutionId, now: Timestamp) -> Result<(), IntentStoreError>;

    /// Records a dispatch failure.
    ///
    /// # Errors
    ///
    /// Returns [`IntentStoreError`] on a storage failure.
    fn mark_failed(&self, tenant: &TenantContext, id: &IntentId, error: &str, now: Timestamp) -> Result<(), IntentStoreError>;

    /// Resolves the module a dispatched execution should run under,
    /// preferring the module referenced by the workflow definition's
    /// originating change and falling back to any module in any project of
    /// the tenant (spec.md §4.6 step 3). Returns `None` when the tenant has
    /// no module at all to execute under.
    ///
    /// # Errors
    ///
    /// Returns [`IntentStoreError`] on a storage failure.
    fn resolve_module_context(&self, tenant: &TenantContext, workflow_definition_id: &WorkflowDefinitionId) -> Result<Option<ModuleExecutionContext>, IntentStoreError>;
}

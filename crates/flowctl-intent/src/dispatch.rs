// crates/flowctl-intent/src/dispatch.rs
// ============================================================================
// Module: Intent Dispatcher
// Description: Drains a tenant's pending intents FIFO, dispatching each to
// the workflow engine (spec.md §4.6).
// Purpose: Turn a durable, idempotency-keyed intent into a running
// execution without ever letting one intent's failure block the rest of
// the batch.
// Dependencies: flowctl-core, flowctl-workflow, crate::row, crate::store
// ============================================================================

use std::time::Duration;

use flowctl_core::IntentId;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowExecutionId;
use flowctl_workflow::WorkflowStore;

use crate::error::IntentError;
use crate::row::WorkflowExecutionIntent;
use crate::store::IntentStore;

/// Outcome of dispatching one pending intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// `executeWorkflow` started successfully.
    Dispatched {
        /// Id of the intent that was dispatched.
        intent_id: IntentId,
        /// Id of the execution it started.
        execution_id: WorkflowExecutionId,
    },
    /// The intent was marked `failed`, with the recorded cause.
    Failed {
        /// Id of the intent that failed.
        intent_id: IntentId,
        /// Human-readable cause.
        reason: String,
    },
}

/// Summary of one drain pass over a tenant's pending intents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Outcome of every intent processed this pass, in FIFO order.
    pub outcomes: Vec<IntentOutcome>,
}

/// Creates a new `pending` intent, deduplicating by `idempotency_key`
/// (spec.md §4.6 "Idempotency"). This is the only entry point triggers use
/// to request a workflow start; there is no way to call `executeWorkflow`
/// directly from here.
///
/// # Errors
///
/// Returns [`IntentError`] on a storage failure.
#[allow(clippy::too_many_arguments, reason = "threads every field of a new intent row explicitly")]
pub fn create_execution_intent(
    store: &dyn IntentStore,
    tenant: &TenantContext,
    workflow_definition_id: &flowctl_core::WorkflowDefinitionId,
    trigger_type: flowctl_workflow::TriggerType,
    trigger_payload: serde_json::Value,
    idempotency_key: Option<&str>,
    id: IntentId,
    now: Timestamp,
) -> Result<WorkflowExecutionIntent, IntentError> {
    store
        .create_intent(tenant, workflow_definition_id, trigger_type, trigger_payload, idempotency_key, id, now)
        .map_err(|err| IntentError::Store(err.0))
}

/// Drains this tenant's pending intents oldest-first, dispatching each to
/// the workflow engine in turn. One intent's failure to resolve a module,
/// load a definition, or execute never stops the pass; every pending
/// intent at the time of the call is given an outcome.
///
/// # Errors
///
/// Returns [`IntentError`] only when listing pending intents itself fails;
/// per-intent failures are captured into [`IntentOutcome::Failed`].
pub fn dispatch_once(intent_store: &dyn IntentStore, workflow_store: &dyn WorkflowStore, tenant: &TenantContext, mut execution_id_for: impl FnMut(&IntentId) -> WorkflowExecutionId, now: Timestamp) -> Result<DispatchSummary, IntentError> {
    let pending = intent_store.list_pending_intents(tenant).map_err(|err| IntentError::Store(err.0))?;

    let mut outcomes = Vec::with_capacity(pending.len());
    for intent in pending {
        outcomes.push(dispatch_one(intent_store, workflow_store, tenant, &intent, &mut execution_id_for, now));
    }

    Ok(DispatchSummary { outcomes })
}

fn dispatch_one(intent_store: &dyn IntentStore, workflow_store: &dyn WorkflowStore, tenant: &TenantContext, intent: &WorkflowExecutionIntent, execution_id_for: &mut impl FnMut(&IntentId) -> WorkflowExecutionId, now: Timestamp) -> IntentOutcome {
    let module_ctx = match intent_store.resolve_module_context(tenant, &intent.workflow_definition_id) {
        Ok(Some(ctx)) => ctx,
        Ok(None) => return fail(intent_store, tenant, intent, "no module context available for this tenant", now),
        Err(err) => return fail(intent_store, tenant, intent, &err.0, now),
    };

    let execution_id = execution_id_for(&intent.id);
    let result = flowctl_workflow::execute_workflow(workflow_store, &module_ctx, &intent.workflow_definition_id, intent.trigger_payload.clone(), intent.id.clone(), execution_id.clone(), now);

    match result {
        Ok(execution) => {
            let _ = intent_store.mark_dispatched(tenant, &intent.id, &execution.id, now);
            IntentOutcome::Dispatched { intent_id: intent.id.clone(), execution_id: execution.id }
        }
        Err(err) => fail(intent_store, tenant, intent, &err.to_string(), now),
    }
}

fn fail(intent_store: &dyn IntentStore, tenant: &TenantContext, intent: &WorkflowExecutionIntent, reason: &str, now: Timestamp) -> IntentOutcome {
    let _ = intent_store.mark_failed(tenant, &intent.id, reason, now);
    IntentOutcome::Failed { intent_id: intent.id.clone(), reason: reason.to_string() }
}

/// Runs [`dispatch_once`] on a fixed interval until the returned handle is
/// dropped or the process shuts down, the way the composition root drives
/// every other periodic worker (spec.md §4.6 "dispatcher worker"). Each
/// tick's summary is handed to `on_tick` for logging or testing; panics
/// inside `on_tick` are not caught.
pub async fn run_dispatch_loop(interval: Duration, mut tick: impl FnMut() -> Result<DispatchSummary, IntentError>, mut on_tick: impl FnMut(Result<DispatchSummary, IntentError>)) -> ! {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        on_tick(tick());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions use panic-based failure reporting")]

    use std::cell::RefCell;
    use std::collections::HashMap;

    use flowctl_core::CapabilityProfile;
    use flowctl_core::ContextSource;
    use flowctl_core::ModuleExecutionContext;
    use flowctl_core::ModuleId;
    use flowctl_core::TenantId;
    use flowctl_core::WorkflowDefinitionId;
    use flowctl_workflow::WorkflowDefinition;
    use flowctl_workflow::WorkflowDefinitionStatus;
    use flowctl_workflow::WorkflowStepExecution;

    use super::dispatch_once;
    use super::IntentOutcome;
    use crate::row::IntentStatus;
    use crate::row::WorkflowExecutionIntent;
    use crate::store::IntentStore;
    use crate::store::IntentStoreError;

    struct FakeIntentStore {
        intents: RefCell<HashMap<String, WorkflowExecutionIntent>>,
        by_idempotency_key: RefCell<HashMap<String, String>>,
        module_ctx: Option<ModuleExecutionContext>,
    }

    impl IntentStore for FakeIntentStore {
        fn create_intent(
            &self,
            _tenant: &flowctl_core::TenantContext,
            workflow_definition_id: &WorkflowDefinitionId,
            trigger_type: flowctl_workflow::TriggerType,
            trigger_payload: serde_json::Value,
            idempotency_key: Option<&str>,
            id: flowctl_core::IntentId,
            now: flowctl_core::Timestamp,
        ) -> Result<WorkflowExecutionIntent, IntentStoreError> {
            if let Some(key) = idempotency_key {
                if let Some(existing_id) = self.by_idempotency_key.borrow().get(key) {
                    return Ok(self.intents.borrow()[existing_id].clone());
                }
            }
            let intent = WorkflowExecutionIntent {
                id: id.clone(),
                workflow_definition_id: workflow_definition_id.clone(),
                trigger_type,
                trigger_payload,
                idempotency_key: idempotency_key.map(str::to_string),
                status: IntentStatus::Pending,
                execution_id: None,
                error: None,
                created_at: now,
                dispatched_at: None,
            };
            self.intents.borrow_mut().insert(id.as_str().to_string(), intent.clone());
            if let Some(key) = idempotency_key {
                self.by_idempotency_key.borrow_mut().insert(key.to_string(), id.as_str().to_string());
            }
            Ok(intent)
        }

        fn list_pending_intents(&self, _tenant: &flowctl_core::TenantContext) -> Result<Vec<WorkflowExecutionIntent>, IntentStoreError> {
            let mut pending: Vec<_> = self.intents.borrow().values().filter(|i| i.status == IntentStatus::Pending).cloned().collect();
            pending.sort_by_key(|i| i.created_at.as_unix_millis());
            Ok(pending)
        }

        fn mark_dispatched(&self, _tenant: &flowctl_core::TenantContext, id: &flowctl_core::IntentId, execution_id: &flowctl_core::WorkflowExecutionId, now: flowctl_core::Timestamp) -> Result<(), IntentStoreError> {
            if let Some(intent) = self.intents.borrow_mut().get_mut(id.as_str()) {
                intent.status = IntentStatus::Dispatched;
                intent.execution_id = Some(execution_id.clone());
                intent.dispatched_at = Some(now);
            }
            Ok(())
        }

        fn mark_failed(&self, _tenant: &flowctl_core::TenantContext, id: &flowctl_core::IntentId, error: &str, now: flowctl_core::Timestamp) -> Result<(), IntentStoreError> {
            if let Some(intent) = self.intents.borrow_mut().get_mut(id.as_str()) {
                intent.status = IntentStatus::Failed;
                intent.error = Some(error.to_string());
                intent.dispatched_at = Some(now);
            }
            Ok(())
        }

        fn resolve_module_context(&self, _tenant: &flowctl_core::TenantContext, _workflow_definition_id: &WorkflowDefinitionId) -> Result<Option<ModuleExecutionContext>, IntentStoreError> {
            Ok(self.module_ctx.clone())
        }
    }

    struct FakeWorkflowStore {
        definition: Option<WorkflowDefinition>,
    }

    impl flowctl_workflow::WorkflowStore for FakeWorkflowStore {
        fn get_definition(&self, _tenant: &flowctl_core::TenantContext, _id: &WorkflowDefinitionId) -> Result<Option<WorkflowDefinition>, flowctl_workflow::WorkflowError> {
            Ok(self.definition.clone())
        }

        fn list_steps(&self, _tenant: &flowctl_core::TenantContext, _definition_id: &WorkflowDefinitionId) -> Result<Vec<flowctl_workflow::WorkflowStep>, flowctl_workflow::WorkflowError> {
            Ok(vec![])
        }

        fn create_execution(&self, _execution: &flowctl_workflow::WorkflowExecution) -> Result<(), flowctl_workflow::WorkflowError> {
            Ok(())
        }

        fn get_execution(&self, _tenant: &flowctl_core::TenantContext, _id: &flowctl_core::WorkflowExecutionId) -> Result<Option<flowctl_workflow::WorkflowExecution>, flowctl_workflow::WorkflowError> {
            Ok(None)
        }

        fn update_execution(&self, _execution: &flowctl_workflow::WorkflowExecution) -> Result<(), flowctl_workflow::WorkflowError> {
            Ok(())
        }

        fn create_step_execution(&self, _step_execution: &WorkflowStepExecution) -> Result<(), flowctl_workflow::WorkflowError> {
            Ok(())
        }

        fn get_step_execution(&self, _tenant: &flowctl_core::TenantContext, _id: &flowctl_core::WorkflowStepExecutionId) -> Result<Option<WorkflowStepExecution>, flowctl_workflow::WorkflowError> {
            Ok(None)
        }

        fn update_step_execution(&self, _step_execution: &WorkflowStepExecution) -> Result<(), flowctl_workflow::WorkflowError> {
            Ok(())
        }

        fn try_acquire_record_lock(&self, _tenant: &flowctl_core::TenantContext, _record_type_id: &str, _record_id: &str, _execution_id: &flowctl_core::WorkflowExecutionId) -> Result<flowctl_workflow::RecordLockOutcome, flowctl_workflow::WorkflowError> {
            Ok(flowctl_workflow::RecordLockOutcome::Acquired)
        }

        fn record_lock_holder(&self, _tenant: &flowctl_core::TenantContext, _record_type_id: &str, _record_id: &str) -> Result<Option<flowctl_core::WorkflowExecutionId>, flowctl_workflow::WorkflowError> {
            Ok(None)
        }

        fn release_locks_for_execution(&self, _execution_id: &flowctl_core::WorkflowExecutionId) -> Result<(), flowctl_workflow::WorkflowError> {
            Ok(())
        }
    }

    fn tenant() -> flowctl_core::TenantContext {
        flowctl_core::TenantContext::new(TenantId::new("tenant-a"), None, None, ContextSource::Internal)
    }

    fn module_ctx() -> ModuleExecutionContext {
        ModuleExecutionContext::new(tenant(), ModuleId::new("module-a"), "/workspace/module-a", CapabilityProfile::SystemPrivileged)
    }

    #[test]
    fn missing_module_context_fails_the_intent() {
        let intent_store = FakeIntentStore { intents: RefCell::new(HashMap::new()), by_idempotency_key: RefCell::new(HashMap::new()), module_ctx: None };
        let workflow_store = FakeWorkflowStore { definition: None };

        let id = flowctl_core::IntentId::new("intent-1");
        intent_store
            .create_intent(&tenant(), &WorkflowDefinitionId::new("def-a"), flowctl_workflow::TriggerType::Manual, serde_json::json!({}), None, id, flowctl_core::Timestamp::from_unix_millis(0))
            .expect("create succeeds");

        let summary = dispatch_once(&intent_store, &workflow_store, &tenant(), |_| flowctl_core::WorkflowExecutionId::new("exec-1"), flowctl_core::Timestamp::from_unix_millis(1)).expect("dispatch succeeds");

        assert_eq!(summary.outcomes.len(), 1);
        assert!(matches!(summary.outcomes[0], IntentOutcome::Failed { .. }));
    }

    #[test]
    fn inactive_definition_fails_the_intent() {
        let intent_store = FakeIntentStore { intents: RefCell::new(HashMap::new()), by_idempotency_key: RefCell::new(HashMap::new()), module_ctx: Some(module_ctx()) };
        let definition = WorkflowDefinition {
            id: WorkflowDefinitionId::new("def-a"),
            tenant_id: TenantId::new("tenant-a"),
            name: "noop".to_string(),
            status: WorkflowDefinitionStatus::Draft,
            trigger_type: flowctl_workflow::TriggerType::Manual,
            trigger_config: serde_json::json!({}),
            version: 1,
            change_id: None,
            created_at: flowctl_core::Timestamp::from_unix_millis(0),
            updated_at: flowctl_core::Timestamp::from_unix_millis(0),
        };
        let workflow_store = FakeWorkflowStore { definition: Some(definition) };

        let id = flowctl_core::IntentId::new("intent-1");
        intent_store
            .create_intent(&tenant(), &WorkflowDefinitionId::new("def-a"), flowctl_workflow::TriggerType::Manual, serde_json::json!({}), None, id, flowctl_core::Timestamp::from_unix_millis(0))
            .expect("create succeeds");

        let summary = dispatch_once(&intent_store, &workflow_store, &tenant(), |_| flowctl_core::WorkflowExecutionId::new("exec-1"), flowctl_core::Timestamp::from_unix_millis(1)).expect("dispatch succeeds");

        assert!(matches!(summary.outcomes[0], IntentOutcome::Failed { .. }));
    }

    #[test]
    fn duplicate_idempotency_key_returns_the_existing_intent() {
        let intent_store = FakeIntentStore { intents: RefCell::new(HashMap::new()), by_idempotency_key: RefCell::new(HashMap::new()), module_ctx: None };

        let first = intent_store
            .create_intent(&tenant(), &WorkflowDefinitionId::new("def-a"), flowctl_workflow::TriggerType::Webhook, serde_json::json!({"a": 1}), Some("dedup-key"), flowctl_core::IntentId::new("intent-1"), flowctl_core::Timestamp::from_unix_millis(0))
            .expect("first create succeeds");
        let second = intent_store
            .create_intent(&tenant(), &WorkflowDefinitionId::new("def-a"), flowctl_workflow::TriggerType::Webhook, serde_json::json!({"a": 2}), Some("dedup-key"), flowctl_core::IntentId::new("intent-2"), flowctl_core::Timestamp::from_unix_millis(1))
            .expect("second create succeeds");

        assert_eq!(first.id, second.id);
        assert_eq!(intent_store.intents.borrow().len(), 1);
    }
}

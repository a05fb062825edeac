// crates/flowctl-workflow/src/engine.rs
// ============================================================================
// Module: Workflow Engine
// Description: Interprets a workflow definition's steps against a concrete
// input, with decision branching, approval pausing, and resume.
// Purpose: Turn a dispatched intent into a durable, resumable execution.
// Dependencies: crate::store, crate::steps, crate::types, crate::error,
// flowctl-core
// ============================================================================

use std::collections::HashMap;

use serde_json::Value;

use flowctl_core::IntentId;
use flowctl_core::ModuleExecutionContext;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_core::WorkflowStepExecutionId;

use crate::error::WorkflowError;
use crate::steps;
use crate::steps::StepOutcome;
use crate::store::WorkflowStore;
use crate::types::StepConfig;
use crate::types::WorkflowDefinitionStatus;
use crate::types::WorkflowExecution;
use crate::types::WorkflowExecutionStatus;
use crate::types::WorkflowStep;
use crate::types::WorkflowStepExecution;
use crate::types::WorkflowStepExecutionStatus;

/// Starts a new execution of `definition_id` against `input`.
///
/// The definition must exist, belong to the calling tenant, and be
/// [`WorkflowDefinitionStatus::Active`]; otherwise the call aborts with an
/// engine-level error rather than producing a failed execution. Once
/// running, a step handler failure (an unparsable decision operator, a
/// branch target outside the step list, a lock held by another execution)
/// is instead captured into the returned execution's own `failed` status.
///
/// # Errors
///
/// Returns [`WorkflowError::DefinitionNotFound`],
/// [`WorkflowError::DefinitionNotActive`], or [`WorkflowError::Store`].
#[allow(clippy::too_many_arguments, reason = "engine entry point threads every caller-supplied identity and clock value explicitly")]
pub fn execute_workflow(
    store: &dyn WorkflowStore,
    module_ctx: &ModuleExecutionContext,
    definition_id: &WorkflowDefinitionId,
    input: Value,
    intent_id: IntentId,
    execution_id: WorkflowExecutionId,
    now: Timestamp,
) -> Result<WorkflowExecution, WorkflowError> {
    let tenant = &module_ctx.tenant_context;
    let definition = store
        .get_definition(tenant, definition_id)?
        .ok_or(WorkflowError::DefinitionNotFound)?;
    if definition.status != WorkflowDefinitionStatus::Active {
        return Err(WorkflowError::DefinitionNotActive);
    }

    let steps = store.list_steps(tenant, definition_id)?;
    let order_to_array = build_order_index(&steps);

    let execution = WorkflowExecution {
        id: execution_id,
        tenant_id: tenant.tenant_id.clone(),
        workflow_definition_id: definition_id.clone(),
        intent_id,
        input: input.clone(),
        status: WorkflowExecutionStatus::Running,
        paused_at_step_id: None,
        accumulated_input: None,
        started_at: now,
        completed_at: None,
        error: None,
    };
    store.create_execution(&execution)?;

    run_from(store, tenant, &steps, &order_to_array, execution, input, 0, now)
}

/// Resumes a [`WorkflowExecutionStatus::Paused`] execution at the step it
/// is waiting on.
///
/// `approved = false` fails the execution, recording `resolved_by` in its
/// error; `approved = true` completes the paused step execution and
/// continues interpretation from the following step.
///
/// # Errors
///
/// Returns [`WorkflowError::ExecutionNotFound`],
/// [`WorkflowError::ExecutionNotPaused`],
/// [`WorkflowError::StepExecutionMismatch`], or [`WorkflowError::Store`].
pub fn resume_workflow_execution(
    store: &dyn WorkflowStore,
    module_ctx: &ModuleExecutionContext,
    execution_id: &WorkflowExecutionId,
    step_execution_id: &WorkflowStepExecutionId,
    approved: bool,
    resolved_by: &str,
    now: Timestamp,
) -> Result<WorkflowExecution, WorkflowError> {
    let tenant = &module_ctx.tenant_context;
    let mut execution = store
        .get_execution(tenant, execution_id)?
        .ok_or(WorkflowError::ExecutionNotFound)?;
    if execution.status != WorkflowExecutionStatus::Paused {
        return Err(WorkflowError::ExecutionNotPaused);
    }

    let mut step_execution = store
        .get_step_execution(tenant, step_execution_id)?
        .ok_or(WorkflowError::StepExecutionMismatch)?;
    let paused_step_id = execution
        .paused_at_step_id
        .clone()
        .ok_or(WorkflowError::StepExecutionMismatch)?;
    if step_execution.workflow_step_id != paused_step_id
        || step_execution.status != WorkflowStepExecutionStatus::AwaitingApproval
    {
        return Err(WorkflowError::StepExecutionMismatch);
    }

    let steps = store.list_steps(tenant, &execution.workflow_definition_id)?;
    let order_to_array = build_order_index(&steps);
    let paused_array_index = steps
        .iter()
        .position(|step| step.id == paused_step_id)
        .ok_or(WorkflowError::StepExecutionMismatch)?;

    let mut accumulated_input = execution.accumulated_input.clone().unwrap_or_else(|| execution.input.clone());

    if !approved {
        step_execution.status = WorkflowStepExecutionStatus::Failed;
        step_execution.executed_at = Some(now);
        store.update_step_execution(&step_execution)?;

        execution.status = WorkflowExecutionStatus::Failed;
        execution.completed_at = Some(now);
        execution.error = Some(format!("approval rejected by {resolved_by}"));
        store.update_execution(&execution)?;
        store.release_locks_for_execution(execution_id)?;
        return Ok(execution);
    }

    step_execution.status = WorkflowStepExecutionStatus::Completed;
    step_execution.output = Some(serde_json::json!({ "status": "approved", "resolvedBy": resolved_by }));
    step_execution.executed_at = Some(now);
    store.update_step_execution(&step_execution)?;
    merge_step_output(&mut accumulated_input, &steps[paused_array_index], step_execution.output.clone().unwrap_or(Value::Null));

    execution.status = WorkflowExecutionStatus::Running;
    execution.paused_at_step_id = None;

    run_from(
        store,
        tenant,
        &steps,
        &order_to_array,
        execution,
        accumulated_input,
        paused_array_index + 1,
        now,
    )
}

/// Builds the `orderIndex -> array position` lookup a decision step's
/// branch targets are resolved through.
fn build_order_index(steps: &[WorkflowStep]) -> HashMap<i64, usize> {
    steps.iter().enumerate().map(|(index, step)| (step.order_index, index)).collect()
}

/// Merges a completed step's output into accumulated input, keyed by the
/// step's id so later steps can reference earlier outputs by name.
fn merge_step_output(accumulated_input: &mut Value, step: &WorkflowStep, output: Value) {
    if let Value::Object(map) = accumulated_input {
        map.insert(step.id.to_string(), output);
    }
}

/// Interprets `steps` starting at `start_array_index`, persisting each step
/// execution as it runs and returning once the execution reaches a
/// terminal or paused state.
#[allow(clippy::too_many_arguments, reason = "internal continuation threading execution state across a pause/resume boundary")]
fn run_from(
    store: &dyn WorkflowStore,
    tenant: &TenantContext,
    steps: &[WorkflowStep],
    order_to_array: &HashMap<i64, usize>,
    mut execution: WorkflowExecution,
    mut accumulated_input: Value,
    start_array_index: usize,
    now: Timestamp,
) -> Result<WorkflowExecution, WorkflowError> {
    let mut array_index = start_array_index;

    while array_index < steps.len() {
        let step = &steps[array_index];
        let mut step_execution = WorkflowStepExecution {
            id: derive_step_execution_id(&execution.id, step),
            workflow_execution_id: execution.id.clone(),
            workflow_step_id: step.id.clone(),
            status: WorkflowStepExecutionStatus::Pending,
            output: None,
            executed_at: None,
        };
        store.create_step_execution(&step_execution)?;

        let outcome = match &step.config {
            StepConfig::Assignment { assignee_type, assignee_ref } => {
                Ok(steps::assignment(*assignee_type, assignee_ref))
            }
            StepConfig::Approval { auto_approve } => Ok(steps::approval(*auto_approve)),
            StepConfig::Notification {
                channel,
                recipient,
                template,
                message,
            } => Ok(steps::notification(channel, recipient, template, message)),
            StepConfig::Decision {
                condition_field,
                condition_operator,
                condition_value,
                on_true_step_index,
                on_false_step_index,
            } => steps::decision(
                condition_field,
                condition_operator,
                condition_value.as_ref(),
                *on_true_step_index,
                *on_false_step_index,
                &accumulated_input,
            )
            .map_err(StepFailure::Handler),
            StepConfig::RecordMutation {
                record_type_id,
                record_id_field,
                mutations,
                source_mapping,
            } => steps::record_mutation(
                store,
                tenant,
                record_type_id,
                record_id_field,
                mutations,
                source_mapping,
                &accumulated_input,
                &execution.id,
            )
            .map_err(StepFailure::Engine),
            StepConfig::RecordLock {
                record_type_id,
                record_id_field,
            } => steps::record_lock(store, tenant, record_type_id, record_id_field, &accumulated_input, &execution.id)
                .map_err(StepFailure::Engine),
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(StepFailure::Engine(err)) => return Err(err),
            Err(StepFailure::Handler(cause)) => {
                step_execution.status = WorkflowStepExecutionStatus::Failed;
                step_execution.executed_at = Some(now);
                store.update_step_execution(&step_execution)?;

                execution.status = WorkflowExecutionStatus::Failed;
                execution.completed_at = Some(now);
                execution.error = Some(cause);
                store.update_execution(&execution)?;
                store.release_locks_for_execution(&execution.id)?;
                return Ok(execution);
            }
        };

        match outcome {
            StepOutcome::Completed { output } => {
                step_execution.status = WorkflowStepExecutionStatus::Completed;
                step_execution.output = Some(output.clone());
                step_execution.executed_at = Some(now);
                store.update_step_execution(&step_execution)?;
                merge_step_output(&mut accumulated_input, step, output);
                array_index += 1;
            }
            StepOutcome::AwaitingApproval { output } => {
                step_execution.status = WorkflowStepExecutionStatus::AwaitingApproval;
                step_execution.output = Some(output);
                step_execution.executed_at = Some(now);
                store.update_step_execution(&step_execution)?;

                execution.status = WorkflowExecutionStatus::Paused;
                execution.paused_at_step_id = Some(step.id.clone());
                execution.accumulated_input = Some(accumulated_input);
                store.update_execution(&execution)?;
                return Ok(execution);
            }
            StepOutcome::Branched { output, target_order_index } => {
                step_execution.status = WorkflowStepExecutionStatus::Completed;
                step_execution.output = Some(output.clone());
                step_execution.executed_at = Some(now);
                store.update_step_execution(&step_execution)?;
                merge_step_output(&mut accumulated_input, step, output);

                match order_to_array.get(&target_order_index) {
                    Some(&target_array_index) => array_index = target_array_index,
                    None => {
                        execution.status = WorkflowExecutionStatus::Failed;
                        execution.completed_at = Some(now);
                        execution.error = Some(format!(
                            "decision step {} branched to orderIndex {target_order_index}, which does not exist",
                            step.id
                        ));
                        store.update_execution(&execution)?;
                        store.release_locks_for_execution(&execution.id)?;
                        return Ok(execution);
                    }
                }
            }
        }
    }

    execution.status = WorkflowExecutionStatus::Completed;
    execution.completed_at = Some(now);
    execution.accumulated_input = Some(accumulated_input);
    store.update_execution(&execution)?;
    store.release_locks_for_execution(&execution.id)?;
    Ok(execution)
}

/// Distinguishes an engine-aborting storage failure from a step-runtime
/// failure that should be captured into the execution's own status.
enum StepFailure {
    /// A storage failure; the engine call aborts.
    Engine(WorkflowError),
    /// A step handler rejected its own input; captured as a failed execution.
    Handler(String),
}

/// Derives a step execution id deterministically from the owning execution
/// and step, so replays of the same execution do not need a random id
/// source.
fn derive_step_execution_id(execution_id: &WorkflowExecutionId, step: &WorkflowStep) -> WorkflowStepExecutionId {
    WorkflowStepExecutionId::new(format!("{execution_id}:{}", step.id))
}

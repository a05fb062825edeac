// crates/flowctl-workflow/src/steps.rs
// ============================================================================
// Module: Step Handlers
// Description: Pure functions of (config, accumulated input) -> output for
// every step type; the two step types that touch state do so only through
// the `WorkflowStore` record-lock surface, never a generic record store.
// Purpose: Keep step semantics independently testable from the engine's
// control flow (branching, pausing, persistence).
// Dependencies: flowctl_core, flowctl_logic, serde_json
// ============================================================================

use serde_json::json;
use serde_json::Value;

use flowctl_core::TenantContext;
use flowctl_core::WorkflowExecutionId;
use flowctl_logic::evaluate;
use flowctl_logic::is_truthy;
use flowctl_logic::ConditionOperator;
use flowctl_logic::TriState;

use crate::error::WorkflowError;
use crate::store::RecordLockOutcome;
use crate::store::WorkflowStore;
use crate::types::AssigneeType;

/// Outcome of running a step handler, distinct from an engine-level error.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step ran to completion; the engine advances.
    Completed {
        /// The step's recorded output.
        output: Value,
    },
    /// The step paused the execution (`approval`, not auto-approved).
    AwaitingApproval {
        /// The step's recorded output.
        output: Value,
    },
    /// The step branched to a specific `orderIndex` (`decision`).
    Branched {
        /// The step's recorded output.
        output: Value,
        /// The `orderIndex` to resume interpretation at.
        target_order_index: i64,
    },
}

/// Resolves an `assignment` step's target into a canonical assignee token.
#[must_use]
pub fn assignment(assignee_type: AssigneeType, assignee_ref: &str) -> StepOutcome {
    let prefix = match assignee_type {
        AssigneeType::User => "user",
        AssigneeType::Group => "group",
        AssigneeType::Rule => "rule",
    };
    StepOutcome::Completed {
        output: json!({ "assignee": format!("{prefix}:{assignee_ref}") }),
    }
}

/// Runs an `approval` step: auto-approves or pauses the execution.
#[must_use]
pub fn approval(auto_approve: bool) -> StepOutcome {
    if auto_approve {
        StepOutcome::Completed {
            output: json!({ "status": "auto_approved" }),
        }
    } else {
        StepOutcome::AwaitingApproval {
            output: json!({ "status": "awaiting_approval" }),
        }
    }
}

/// Records a `notification` step's intended delivery. Delivery itself is
/// out of scope; `delivered` is always `false`.
#[must_use]
pub fn notification(channel: &str, recipient: &str, template: &str, message: &str) -> StepOutcome {
    StepOutcome::Completed {
        output: json!({
            "channel": channel,
            "recipient": recipient,
            "template": template,
            "message": message,
            "delivered": false,
        }),
    }
}

/// Evaluates a `decision` step's flat comparator and resolves the branch
/// target.
///
/// # Errors
///
/// Returns [`WorkflowError::Store`]-free but step-level failures as
/// `Err(WorkflowError::ActivationValidation)`-shaped strings are not used
/// here; an unparsable operator returns `Err` with a human cause, which the
/// engine captures into the execution's `failed` status rather than
/// propagating.
pub fn decision(
    condition_field: &str,
    condition_operator: &str,
    condition_value: Option<&Value>,
    on_true_step_index: i64,
    on_false_step_index: i64,
    accumulated_input: &Value,
) -> Result<StepOutcome, String> {
    let operator = ConditionOperator::parse(condition_operator).map_err(|err| err.to_string())?;
    let field_value = accumulated_input.get(condition_field);
    let trace = evaluate(condition_field, operator, field_value, condition_value);
    let matched = matches!(trace.outcome, TriState::True);
    let target_order_index = if matched { on_true_step_index } else { on_false_step_index };
    Ok(StepOutcome::Branched {
        output: json!({
            "result": matched,
            "outcome": format!("{:?}", trace.outcome),
            "targetStepIndex": target_order_index,
        }),
        target_order_index,
    })
}

/// Composes a `record_mutation` step's mutation map from static mutations
/// and a source mapping pulled from accumulated input. Asserts any existing
/// lock on the target record is held by this execution.
///
/// # Errors
///
/// Returns [`WorkflowError::Store`] on a storage failure, or a descriptive
/// string when the lock is held by a different execution.
#[allow(clippy::too_many_arguments, reason = "step handler signature mirrors the record_mutation step config plus its two storage-lookup inputs")]
pub fn record_mutation(
    store: &dyn WorkflowStore,
    tenant: &TenantContext,
    record_type_id: &str,
    record_id_field: &str,
    mutations: &serde_json::Map<String, Value>,
    source_mapping: &serde_json::Map<String, Value>,
    accumulated_input: &Value,
    execution_id: &WorkflowExecutionId,
) -> Result<StepOutcome, WorkflowError> {
    let record_id = accumulated_input
        .get(record_id_field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(holder) = store.record_lock_holder(tenant, record_type_id, &record_id)? {
        if &holder != execution_id {
            return Err(WorkflowError::Store(format!(
                "record {record_id} is locked by execution {holder}"
            )));
        }
    }

    let mut fields = mutations.clone();
    for (field, path) in source_mapping {
        if let Some(path_str) = path.as_str() {
            if let Some(value) = accumulated_input.get(path_str) {
                fields.insert(field.clone(), value.clone());
            }
        }
    }

    Ok(StepOutcome::Completed {
        output: json!({ "recordId": record_id, "fields": Value::Object(fields) }),
    })
}

/// Runs a `record_lock` step: acquires the advisory lock if none exists,
/// else no-ops.
///
/// # Errors
///
/// Returns [`WorkflowError::Store`] on a storage failure.
pub fn record_lock(
    store: &dyn WorkflowStore,
    tenant: &TenantContext,
    record_type_id: &str,
    record_id_field: &str,
    accumulated_input: &Value,
    execution_id: &WorkflowExecutionId,
) -> Result<StepOutcome, WorkflowError> {
    let record_id = accumulated_input
        .get(record_id_field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let outcome = store.try_acquire_record_lock(tenant, record_type_id, &record_id, execution_id)?;
    Ok(StepOutcome::Completed {
        output: json!({
            "recordId": record_id,
            "acquired": matches!(outcome, RecordLockOutcome::Acquired),
        }),
    })
}

/// Returns whether a JSON value is considered truthy by decision steps,
/// re-exported so tests can reuse the exact predicate the engine uses.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    is_truthy(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, reason = "test assertions use panic-based failure reporting")]

    use super::assignment;
    use super::approval;
    use super::decision;
    use super::notification;
    use super::StepOutcome;
    use crate::types::AssigneeType;
    use serde_json::json;

    #[test]
    fn assignment_formats_canonical_token() {
        let outcome = assignment(AssigneeType::Group, "ops");
        match outcome {
            StepOutcome::Completed { output } => assert_eq!(output["assignee"], "group:ops"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn approval_auto_approve_completes_immediately() {
        assert!(matches!(approval(true), StepOutcome::Completed { .. }));
    }

    #[test]
    fn approval_without_auto_approve_pauses() {
        assert!(matches!(approval(false), StepOutcome::AwaitingApproval { .. }));
    }

    #[test]
    fn notification_never_claims_delivery() {
        let outcome = notification("email", "a@example.com", "tpl", "hello");
        match outcome {
            StepOutcome::Completed { output } => assert_eq!(output["delivered"], false),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn decision_branches_true_on_match() {
        let input = json!({"status": "approved"});
        let outcome = decision("status", "equals", Some(&json!("approved")), 2, 5, &input).unwrap();
        match outcome {
            StepOutcome::Branched { target_order_index, .. } => assert_eq!(target_order_index, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn decision_branches_false_on_missing_field() {
        let input = json!({});
        let outcome = decision("status", "equals", Some(&json!("approved")), 2, 5, &input).unwrap();
        match outcome {
            StepOutcome::Branched { target_order_index, .. } => assert_eq!(target_order_index, 5),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn decision_rejects_unknown_operator() {
        let input = json!({});
        assert!(decision("status", "contains", None, 2, 5, &input).is_err());
    }
}

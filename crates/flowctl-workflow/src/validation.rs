// crates/flowctl-workflow/src/validation.rs
// ============================================================================
// Module: Activation Validation
// Description: Checks a definition's steps are internally consistent before
// it is allowed to move from `draft` to `active`.
// Purpose: Catch a decision step's dangling branch target before any
// execution can dispatch against it, rather than failing mid-run.
// Dependencies: crate::types
// ============================================================================

use std::collections::HashSet;

use crate::types::StepConfig;
use crate::types::WorkflowStep;

/// Validates that every `decision` step's branch targets reference an
/// existing `orderIndex` among `steps`, and that its condition field is
/// non-blank.
///
/// # Errors
///
/// Returns every violation found, rather than failing on the first one, so
/// an author can fix a definition in a single pass.
pub fn validate_for_activation(steps: &[WorkflowStep]) -> Result<(), Vec<String>> {
    let known_indices: HashSet<i64> = steps.iter().map(|step| step.order_index).collect();
    let mut violations = Vec::new();

    for step in steps {
        let StepConfig::Decision {
            condition_field,
            on_true_step_index,
            on_false_step_index,
            ..
        } = &step.config
        else {
            continue;
        };

        if condition_field.trim().is_empty() {
            violations.push(format!(
                "step {} (orderIndex {}): conditionField must not be blank",
                step.id, step.order_index
            ));
        }
        if !known_indices.contains(on_true_step_index) {
            violations.push(format!(
                "step {} (orderIndex {}): onTrueStepIndex {on_true_step_index} does not reference an existing step",
                step.id, step.order_index
            ));
        }
        if !known_indices.contains(on_false_step_index) {
            violations.push(format!(
                "step {} (orderIndex {}): onFalseStepIndex {on_false_step_index} does not reference an existing step",
                step.id, step.order_index
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::validate_for_activation;
    use crate::types::StepConfig;
    use crate::types::WorkflowStep;
    use flowctl_core::WorkflowDefinitionId;
    use flowctl_core::WorkflowStepId;

    fn step(order_index: i64, config: StepConfig) -> WorkflowStep {
        WorkflowStep {
            id: WorkflowStepId::new(format!("step-{order_index}")),
            workflow_definition_id: WorkflowDefinitionId::new("def-a"),
            order_index,
            config,
        }
    }

    #[test]
    fn decision_with_valid_targets_passes() {
        let steps = vec![
            step(
                0,
                StepConfig::Decision {
                    condition_field: "status".to_string(),
                    condition_operator: "equals".to_string(),
                    condition_value: None,
                    on_true_step_index: 1,
                    on_false_step_index: 2,
                },
            ),
            step(
                1,
                StepConfig::Notification {
                    channel: "email".to_string(),
                    recipient: "a@example.com".to_string(),
                    template: "t".to_string(),
                    message: "m".to_string(),
                },
            ),
            step(
                2,
                StepConfig::Notification {
                    channel: "email".to_string(),
                    recipient: "b@example.com".to_string(),
                    template: "t".to_string(),
                    message: "m".to_string(),
                },
            ),
        ];
        assert!(validate_for_activation(&steps).is_ok());
    }

    #[test]
    fn decision_with_dangling_target_fails() {
        let steps = vec![step(
            0,
            StepConfig::Decision {
                condition_field: "status".to_string(),
                condition_operator: "equals".to_string(),
                condition_value: None,
                on_true_step_index: 9,
                on_false_step_index: 0,
            },
        )];
        let err = validate_for_activation(&steps).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].contains("does not reference an existing step"));
    }

    #[test]
    fn decision_with_blank_condition_field_fails() {
        let steps = vec![step(
            0,
            StepConfig::Decision {
                condition_field: "   ".to_string(),
                condition_operator: "equals".to_string(),
                condition_value: None,
                on_true_step_index: 0,
                on_false_step_index: 0,
            },
        )];
        let err = validate_for_activation(&steps).unwrap_err();
        assert!(err.iter().any(|v| v.contains("must not be blank")));
    }
}

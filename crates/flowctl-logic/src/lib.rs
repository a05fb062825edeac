// crates/flowctl-logic/src/lib.rs
// ============================================================================
// Module: Flowctl Decision Logic
// Description: Tri-state condition evaluation for workflow decision steps.
// Purpose: Evaluate a single `field OP value` condition deterministically and
// produce a trace entry for per-step telemetry.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This crate evaluates the single comparator a workflow `decision` step
//! supports: `conditionField OP conditionValue` where `OP` is
//! one of [`ConditionOperator::Equals`], [`ConditionOperator::NotEquals`],
//! [`ConditionOperator::Truthy`], or [`ConditionOperator::Falsy`]. It is a
//! deliberately small descendant of a tri-state requirement algebra: the
//! workflow engine's decision step is a flat comparator, not a requirement
//! tree, so [`TriState`] here only needs one evaluation function rather than
//! a full boolean-logic evaluator with AND/OR/NOT composition.
//!
//! Missing evidence (a condition field absent from the input) evaluates to
//! [`TriState::Unknown`] rather than `False`, preserving fail-closed
//! semantics for callers that choose to treat `Unknown` as not-yet-decided.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Tri-State Value
// ============================================================================

/// Tri-state truth value for condition evaluation.
///
/// # Invariants
/// - Represents a closed set of truth values: true, false, or unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriState {
    /// Definitively true.
    True,
    /// Definitively false.
    False,
    /// Indeterminate because the condition field was absent.
    Unknown,
}

impl TriState {
    /// Returns true if the value is [`TriState::True`].
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

// ============================================================================
// SECTION: Condition Operator
// ============================================================================

/// The comparator a decision step evaluates its condition with.
///
/// # Invariants
/// - Exactly the four flat comparators this evaluator supports; an operator string that
///   does not parse to one of these must fail the decision step, not
///   silently default to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// True when the field value equals the expected value.
    Equals,
    /// True when the field value does not equal the expected value.
    NotEquals,
    /// True when the field value is JSON-truthy.
    Truthy,
    /// True when the field value is JSON-falsy.
    Falsy,
}

impl ConditionOperator {
    /// Parses an operator from its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownOperator`] when `name` does not match a known operator.
    pub fn parse(name: &str) -> Result<Self, UnknownOperator> {
        match name {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "truthy" => Ok(Self::Truthy),
            "falsy" => Ok(Self::Falsy),
            other => Err(UnknownOperator {
                name: other.to_string(),
            }),
        }
    }
}

/// Error returned when a decision step's operator does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown decision operator: {name}")]
pub struct UnknownOperator {
    /// The unrecognized operator name.
    pub name: String,
}

// ============================================================================
// SECTION: JSON Truthiness
// ============================================================================

/// Evaluates JSON truthiness the way a decision step's `truthy`/`falsy`
/// operators interpret a resolved field value.
///
/// # Invariants
/// - `null`, `false`, `0`, `""`, empty arrays, and empty objects are falsy.
/// - Every other value is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// A single decision-step evaluation trace entry, suitable for attaching to
/// the step handler's output as per-step telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTrace {
    /// The field name the condition was evaluated against.
    pub field: String,
    /// The operator applied.
    pub operator: ConditionOperator,
    /// The field's resolved value, if present in the input.
    pub field_value: Option<Value>,
    /// The expected value, for `equals`/`not_equals`.
    pub expected_value: Option<Value>,
    /// The tri-state outcome.
    pub outcome: TriState,
}

/// Evaluates `field_value OP expected_value` and returns the tri-state outcome.
///
/// `field_value` is `None` when the condition field was absent from the
/// step's input; this always evaluates to [`TriState::Unknown`] regardless of
/// operator, since there is nothing to compare.
#[must_use]
pub fn evaluate(
    field: &str,
    operator: ConditionOperator,
    field_value: Option<&Value>,
    expected_value: Option<&Value>,
) -> ConditionTrace {
    let outcome = match field_value {
        None => TriState::Unknown,
        Some(actual) => match operator {
            ConditionOperator::Equals => TriState::from(Some(actual) == expected_value),
            ConditionOperator::NotEquals => TriState::from(Some(actual) != expected_value),
            ConditionOperator::Truthy => TriState::from(is_truthy(actual)),
            ConditionOperator::Falsy => TriState::from(!is_truthy(actual)),
        },
    };
    ConditionTrace {
        field: field.to_string(),
        operator,
        field_value: field_value.cloned(),
        expected_value: expected_value.cloned(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::evaluate;
    use super::is_truthy;
    use super::ConditionOperator;
    use super::TriState;
    use serde_json::json;

    #[test]
    fn equals_matches_identical_values() {
        let trace = evaluate("status", ConditionOperator::Equals, Some(&json!("approved")), Some(&json!("approved")));
        assert_eq!(trace.outcome, TriState::True);
    }

    #[test]
    fn equals_missing_field_is_unknown() {
        let trace = evaluate("status", ConditionOperator::Equals, None, Some(&json!("approved")));
        assert_eq!(trace.outcome, TriState::Unknown);
    }

    #[test]
    fn truthy_empty_collections_are_falsy() {
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(null)));
    }

    #[test]
    fn falsy_operator_inverts_truthy() {
        let trace = evaluate("count", ConditionOperator::Falsy, Some(&json!(0)), None);
        assert_eq!(trace.outcome, TriState::True);
        let trace = evaluate("count", ConditionOperator::Falsy, Some(&json!(3)), None);
        assert_eq!(trace.outcome, TriState::False);
    }

    #[test]
    fn unknown_operator_name_is_rejected() {
        assert!(ConditionOperator::parse("greater_than").is_err());
    }
}

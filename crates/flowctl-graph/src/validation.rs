// crates/flowctl-graph/src/validation.rs
// ============================================================================
// Module: Graph Validation
// Description: Structural checks run against a projected snapshot before an
// install is allowed to proceed.
// Purpose: Catch orphan and cross-project baseType references before any
// storage mutation, per spec.md §4.8 step 5.
// Dependencies: flowctl-core, crate::snapshot, thiserror
// ============================================================================

use thiserror::Error;

use flowctl_core::RecordTypeKey;

use crate::snapshot::GraphSnapshot;

/// A structural problem found in a projected snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphValidationError {
    /// A record type's `baseType` does not resolve to any known record
    /// type in the projection.
    #[error("record type {record_type_key} declares baseType {base_type_key} which does not exist")]
    OrphanBaseType {
        /// The record type whose base type is missing.
        record_type_key: RecordTypeKey,
        /// The missing base type key.
        base_type_key: RecordTypeKey,
    },
    /// A record type's `baseType` resolves to a record type in a different
    /// project.
    #[error("record type {record_type_key} cannot inherit from {base_type_key}, which belongs to a different project")]
    CrossProjectBaseType {
        /// The record type with the cross-project base type.
        record_type_key: RecordTypeKey,
        /// The base type key belonging to another project.
        base_type_key: RecordTypeKey,
    },
    /// A record type's `baseType` forms an inheritance cycle.
    #[error("record type {record_type_key} participates in a baseType inheritance cycle")]
    InheritanceCycle {
        /// A record type on the cycle.
        record_type_key: RecordTypeKey,
    },
}

/// Validates every record type's `baseType` reference in `snapshot`:
/// it must exist, must belong to the same project, and inheritance chains
/// must not cycle.
///
/// # Errors
///
/// Returns every [`GraphValidationError`] found; an empty vec means the
/// snapshot is structurally valid.
#[must_use]
pub fn validate_snapshot(snapshot: &GraphSnapshot) -> Vec<GraphValidationError> {
    let mut errors = Vec::new();

    for rt in &snapshot.record_types {
        let Some(base_key) = &rt.base_type else { continue };
        match snapshot.find_record_type(base_key) {
            None => errors.push(GraphValidationError::OrphanBaseType {
                record_type_key: rt.key.clone(),
                base_type_key: base_key.clone(),
            }),
            Some(base) if base.project_id != rt.project_id => errors.push(GraphValidationError::CrossProjectBaseType {
                record_type_key: rt.key.clone(),
                base_type_key: base_key.clone(),
            }),
            Some(_) => {}
        }
    }

    for rt in &snapshot.record_types {
        if has_inheritance_cycle(snapshot, &rt.key) {
            errors.push(GraphValidationError::InheritanceCycle {
                record_type_key: rt.key.clone(),
            });
        }
    }

    errors
}

fn has_inheritance_cycle(snapshot: &GraphSnapshot, start: &RecordTypeKey) -> bool {
    let mut seen = vec![start.clone()];
    let mut current = start.clone();
    loop {
        let Some(node) = snapshot.find_record_type(&current) else { return false };
        let Some(base) = &node.base_type else { return false };
        if seen.contains(base) {
            return true;
        }
        seen.push(base.clone());
        current = base.clone();
        if seen.len() > snapshot.record_types.len() + 1 {
            return true;
        }
    }
}

// crates/flowctl-graph/src/diff.rs
// ============================================================================
// Module: Graph Diff
// Description: Structural diff between two graph snapshots.
// Purpose: Give the install engine's preview path and the promotion
// pipeline's `diffEnvironments` one shared comparison routine.
// Dependencies: flowctl-core, crate::snapshot, serde
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use flowctl_core::RecordTypeKey;

use crate::snapshot::FieldNode;
use crate::snapshot::GraphSnapshot;
use crate::snapshot::RecordTypeNode;

/// A single field's before/after values within a
/// [`RecordTypeModification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModification {
    /// Name of the modified field.
    pub field_name: String,
    /// Field definition before.
    pub before: FieldNode,
    /// Field definition after.
    pub after: FieldNode,
}

/// Field-level changes detected on one record type present in both
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTypeModification {
    /// Key of the modified record type.
    pub record_type_key: RecordTypeKey,
    /// Field names present in `b` but not `a`.
    pub field_adds: Vec<String>,
    /// Field names present in `a` but not `b`.
    pub field_removals: Vec<String>,
    /// Fields present in both with a changed type or `required` flag.
    pub field_modifications: Vec<FieldModification>,
}

/// Binding-level changes between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingChanges {
    /// SLA bindings added, as `"rtKey"`.
    pub slas_added: Vec<String>,
    /// SLA bindings removed, as `"rtKey"`.
    pub slas_removed: Vec<String>,
    /// Assignment bindings added, encoded `"rtKey:strategyType"`.
    pub assignments_added: Vec<String>,
    /// Workflow bindings added, by name.
    pub workflows_added: Vec<String>,
    /// Workflow bindings removed, by name.
    pub workflows_removed: Vec<String>,
}

/// The structural difference between two [`GraphSnapshot`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDiff {
    /// Record types present in `b` but not `a`.
    pub added_record_types: Vec<RecordTypeKey>,
    /// Record types present in `a` but not `b`.
    pub removed_record_types: Vec<RecordTypeKey>,
    /// Record types present in both with field-level changes.
    pub modified_record_types: Vec<RecordTypeModification>,
    /// Binding-level changes.
    pub binding_changes: BindingChanges,
}

fn fields_by_name(fields: &[FieldNode]) -> HashMap<&str, &FieldNode> {
    fields.iter().map(|f| (f.name.as_str(), f)).collect()
}

fn diff_record_type(a: &RecordTypeNode, b: &RecordTypeNode) -> Option<RecordTypeModification> {
    let a_fields = fields_by_name(&a.fields);
    let b_fields = fields_by_name(&b.fields);

    let field_adds: Vec<String> = b_fields.keys().filter(|name| !a_fields.contains_key(*name)).map(|s| (*s).to_string()).collect();
    let field_removals: Vec<String> = a_fields.keys().filter(|name| !b_fields.contains_key(*name)).map(|s| (*s).to_string()).collect();
    let field_modifications: Vec<FieldModification> = a_fields
        .iter()
        .filter_map(|(name, before)| {
            let after = b_fields.get(name)?;
            if before.field_type != after.field_type || before.required != after.required {
                Some(FieldModification {
                    field_name: (*name).to_string(),
                    before: (*before).clone(),
                    after: (*after).clone(),
                })
            } else {
                None
            }
        })
        .collect();

    if field_adds.is_empty() && field_removals.is_empty() && field_modifications.is_empty() {
        None
    } else {
        Some(RecordTypeModification {
            record_type_key: a.key.clone(),
            field_adds,
            field_removals,
            field_modifications,
        })
    }
}

/// Computes the structural diff from snapshot `a` to snapshot `b`
/// (spec.md §4.7 `diffGraphSnapshots`).
#[must_use]
pub fn diff_graph_snapshots(a: &GraphSnapshot, b: &GraphSnapshot) -> GraphDiff {
    let a_types: HashMap<&RecordTypeKey, &RecordTypeNode> = a.record_types.iter().map(|rt| (&rt.key, rt)).collect();
    let b_types: HashMap<&RecordTypeKey, &RecordTypeNode> = b.record_types.iter().map(|rt| (&rt.key, rt)).collect();

    let mut added_record_types: Vec<RecordTypeKey> = b_types.keys().filter(|key| !a_types.contains_key(*key)).map(|k| (*k).clone()).collect();
    added_record_types.sort();

    let mut removed_record_types: Vec<RecordTypeKey> = a_types.keys().filter(|key| !b_types.contains_key(*key)).map(|k| (*k).clone()).collect();
    removed_record_types.sort();

    let mut modified_record_types: Vec<RecordTypeModification> = a_types
        .iter()
        .filter_map(|(key, a_rt)| b_types.get(key).and_then(|b_rt| diff_record_type(a_rt, b_rt)))
        .collect();
    modified_record_types.sort_by(|x, y| x.record_type_key.cmp(&y.record_type_key));

    GraphDiff {
        added_record_types,
        removed_record_types,
        modified_record_types,
        binding_changes: diff_bindings(a, b),
    }
}

fn diff_bindings(a: &GraphSnapshot, b: &GraphSnapshot) -> BindingChanges {
    let a_slas: BTreeSet<&str> = a.bindings.slas.iter().map(|s| s.record_type_key.as_str()).collect();
    let b_slas: BTreeSet<&str> = b.bindings.slas.iter().map(|s| s.record_type_key.as_str()).collect();

    let a_assignments: BTreeSet<String> = a
        .bindings
        .assignments
        .iter()
        .map(|r| format!("{}:{}", r.record_type_key.as_str(), r.strategy.strategy_type()))
        .collect();
    let b_assignments: BTreeSet<String> = b
        .bindings
        .assignments
        .iter()
        .map(|r| format!("{}:{}", r.record_type_key.as_str(), r.strategy.strategy_type()))
        .collect();

    let a_workflows: BTreeSet<&str> = a.bindings.workflows.iter().map(|w| w.name.as_str()).collect();
    let b_workflows: BTreeSet<&str> = b.bindings.workflows.iter().map(|w| w.name.as_str()).collect();

    BindingChanges {
        slas_added: b_slas.difference(&a_slas).map(|s| (*s).to_string()).collect(),
        slas_removed: a_slas.difference(&b_slas).map(|s| (*s).to_string()).collect(),
        assignments_added: b_assignments.difference(&a_assignments).cloned().collect(),
        workflows_added: b_workflows.difference(&a_workflows).map(|s| (*s).to_string()).collect(),
        workflows_removed: a_workflows.difference(&b_workflows).map(|s| (*s).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::diff_graph_snapshots;
    use crate::snapshot::FieldNode;
    use crate::snapshot::GraphBindings;
    use crate::snapshot::GraphSnapshot;
    use crate::snapshot::RecordTypeNode;
    use flowctl_core::ProjectId;
    use flowctl_core::RecordTypeKey;
    use flowctl_core::TenantId;
    use flowctl_core::Timestamp;

    fn snapshot(types: Vec<RecordTypeNode>) -> GraphSnapshot {
        GraphSnapshot {
            tenant_id: TenantId::new("tenant-a"),
            built_at: Timestamp::from_unix_millis(0),
            edges: vec![],
            record_types: types,
            bindings: GraphBindings::default(),
        }
    }

    fn field(name: &str, ty: &str, required: bool) -> FieldNode {
        FieldNode {
            name: name.to_string(),
            field_type: ty.to_string(),
            required,
        }
    }

    fn node(key: &str, fields: Vec<FieldNode>) -> RecordTypeNode {
        RecordTypeNode {
            key: RecordTypeKey::new(key),
            project_id: ProjectId::new("proj-a"),
            name: None,
            base_type: None,
            fields,
        }
    }

    #[test]
    fn detects_added_and_removed_record_types() {
        let a = snapshot(vec![node("person", vec![])]);
        let b = snapshot(vec![node("employee", vec![])]);
        let diff = diff_graph_snapshots(&a, &b);
        assert_eq!(diff.added_record_types, vec![RecordTypeKey::new("employee")]);
        assert_eq!(diff.removed_record_types, vec![RecordTypeKey::new("person")]);
    }

    #[test]
    fn detects_field_adds_and_modifications() {
        let a = snapshot(vec![node("person", vec![field("name", "string", true)])]);
        let b = snapshot(vec![node(
            "person",
            vec![field("name", "string", false), field("age", "number", false)],
        )]);
        let diff = diff_graph_snapshots(&a, &b);
        assert_eq!(diff.modified_record_types.len(), 1);
        let modification = &diff.modified_record_types[0];
        assert_eq!(modification.field_adds, vec!["age".to_string()]);
        assert_eq!(modification.field_modifications.len(), 1);
        assert_eq!(modification.field_modifications[0].field_name, "name");
    }

    #[test]
    fn unchanged_record_types_produce_no_modification_entry() {
        let a = snapshot(vec![node("person", vec![field("name", "string", true)])]);
        let b = snapshot(vec![node("person", vec![field("name", "string", true)])]);
        let diff = diff_graph_snapshots(&a, &b);
        assert!(diff.modified_record_types.is_empty());
    }
}

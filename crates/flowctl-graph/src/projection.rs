// crates/flowctl-graph/src/projection.rs
// ============================================================================
// Module: Package Projection
// Description: Projects a GraphPackage onto a current snapshot without
// writing anything, producing the would-be post-install snapshot.
// Purpose: Let the install engine validate and preview an install before
// any storage mutation happens.
// Dependencies: flowctl-core, crate::package, crate::snapshot
// ============================================================================

use flowctl_core::ProjectId;
use flowctl_core::TenantId;

use crate::package::GraphPackage;
use crate::snapshot::derive_edges;
use crate::snapshot::ChangePolicyBinding;
use crate::snapshot::GraphSnapshot;
use crate::snapshot::RecordTypeNode;
use crate::snapshot::WorkflowBinding;

/// Projects `pkg` onto `current`, returning the snapshot that would result
/// from installing it into `project_id` for `tenant_id`, without mutating
/// storage (spec.md §4.8 step 5).
///
/// New record types are added; record types the package already owns are
/// replaced with the merged field set (existing fields kept, package fields
/// added or overwritten by key). Bindings declared by the package are
/// appended; duplicates against an identical prior binding are not
/// deduplicated here since ownership/skip-on-reinstall logic belongs to the
/// install engine, not the projection.
///
/// # Invariants
/// - Idempotent: projecting the same package onto the same snapshot twice
///   yields the same result (spec.md §8 round-trip law).
#[must_use]
pub fn project_package_onto_snapshot(current: &GraphSnapshot, pkg: &GraphPackage, project_id: &ProjectId, tenant_id: &TenantId) -> GraphSnapshot {
    let mut record_types: Vec<RecordTypeNode> = current.record_types.clone();

    for declared in &pkg.record_types {
        let merged_fields = match record_types.iter().find(|rt| rt.key == declared.key) {
            Some(existing) => {
                let mut fields = existing.fields.clone();
                for new_field in &declared.fields {
                    if let Some(slot) = fields.iter_mut().find(|f| f.name == new_field.name) {
                        *slot = new_field.clone();
                    } else {
                        fields.push(new_field.clone());
                    }
                }
                fields
            }
            None => declared.fields.clone(),
        };

        let node = RecordTypeNode {
            key: declared.key.clone(),
            project_id: project_id.clone(),
            name: declared.name.clone().or_else(|| record_types.iter().find(|rt| rt.key == declared.key).and_then(|rt| rt.name.clone())),
            base_type: declared.base_type.clone(),
            fields: merged_fields,
        };

        if let Some(slot) = record_types.iter_mut().find(|rt| rt.key == declared.key) {
            *slot = node;
        } else {
            record_types.push(node);
        }
    }

    let mut bindings = current.bindings.clone();
    for sla in &pkg.sla_policies {
        match bindings.slas.iter_mut().find(|s| s.record_type_key == sla.record_type_key) {
            Some(slot) => *slot = sla.clone(),
            None => bindings.slas.push(sla.clone()),
        }
    }
    for rule in &pkg.assignment_rules {
        match bindings.assignments.iter_mut().find(|a| a.record_type_key == rule.record_type_key) {
            Some(slot) => *slot = rule.clone(),
            None => bindings.assignments.push(rule.clone()),
        }
    }
    for workflow in &pkg.workflows {
        if !bindings.workflows.iter().any(|w| w.name == workflow.name) {
            bindings.workflows.push(WorkflowBinding { name: workflow.name.clone() });
        }
    }
    for declared in &pkg.record_types {
        if !bindings.change_policies.iter().any(|p| p.record_type_key == declared.key) {
            bindings.change_policies.push(ChangePolicyBinding {
                record_type_key: declared.key.clone(),
                owning_package_key: pkg.package_key.clone(),
            });
        }
    }

    let edges = derive_edges(&record_types);

    GraphSnapshot {
        tenant_id: tenant_id.clone(),
        built_at: current.built_at,
        record_types,
        edges,
        bindings,
    }
}

#[cfg(test)]
mod tests {
    use super::project_package_onto_snapshot;
    use crate::package::GraphPackage;
    use crate::package::PackageField;
    use crate::package::PackageRecordType;
    use crate::semver::PackageVersion;
    use crate::snapshot::GraphBindings;
    use crate::snapshot::GraphSnapshot;
    use flowctl_core::ProjectId;
    use flowctl_core::RecordTypeKey;
    use flowctl_core::TenantId;
    use flowctl_core::Timestamp;

    fn empty_snapshot() -> GraphSnapshot {
        GraphSnapshot {
            tenant_id: TenantId::new("tenant-a"),
            built_at: Timestamp::from_unix_millis(0),
            record_types: vec![],
            edges: vec![],
            bindings: GraphBindings::default(),
        }
    }

    fn sample_package() -> GraphPackage {
        GraphPackage {
            package_key: "hr.lite".to_string(),
            version: PackageVersion::new(0, 2, 0),
            depends_on: vec![],
            record_types: vec![PackageRecordType {
                key: RecordTypeKey::new("person"),
                name: Some("Person".to_string()),
                base_type: None,
                fields: vec![PackageField {
                    name: "full_name".to_string(),
                    field_type: "string".to_string(),
                    required: false,
                }],
            }],
            sla_policies: vec![],
            assignment_rules: vec![],
            workflows: vec![],
        }
    }

    #[test]
    fn projection_adds_new_record_types() {
        let current = empty_snapshot();
        let pkg = sample_package();
        let projected = project_package_onto_snapshot(&current, &pkg, &ProjectId::new("proj-a"), &TenantId::new("tenant-a"));
        assert_eq!(projected.record_types.len(), 1);
        assert_eq!(projected.record_types[0].key, RecordTypeKey::new("person"));
    }

    #[test]
    fn projection_is_idempotent() {
        let current = empty_snapshot();
        let pkg = sample_package();
        let project_id = ProjectId::new("proj-a");
        let tenant_id = TenantId::new("tenant-a");
        let once = project_package_onto_snapshot(&current, &pkg, &project_id, &tenant_id);
        let twice = project_package_onto_snapshot(&once, &pkg, &project_id, &tenant_id);
        assert_eq!(once.record_types, twice.record_types);
    }
}

// crates/flowctl-install/src/pipeline.rs
// ============================================================================
// Module: Install Pipeline
// Description: The ordered checksum → idempotency → version-guard →
// ownership → projection/validation → preview-exit → topological-apply →
// binding-apply → audit pipeline (spec.md §4.8).
// Purpose: Turn a `GraphPackage` into either a no-write report or a set of
// tenant-scoped mutations plus an append-only audit row.
// Dependencies: flowctl-core, flowctl-graph, flowctl-workflow, flowctl-audit,
// crate::store, crate::ownership, crate::row, crate::error
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use flowctl_audit::DomainEvent;
use flowctl_audit::DomainEventSink;
use flowctl_core::ProjectId;
use flowctl_core::RecordTypeKey;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::UserId;
use flowctl_graph::diff_graph_snapshots;
use flowctl_graph::project_package_onto_snapshot;
use flowctl_graph::validate_snapshot;
use flowctl_graph::GraphDiff;
use flowctl_graph::GraphPackage;
use flowctl_graph::GraphStore;
use flowctl_graph::GraphValidationError;
use flowctl_graph::PackageVersion;

use crate::error::InstallError;
use crate::ownership::owning_package_for_binding;
use crate::ownership::owning_package_for_record_type;
use crate::row::GraphPackageInstall;
use crate::store::InstallStore;
use crate::topo::topo_order_record_types;
use crate::topo::TopoError;

// ============================================================================
// SECTION: Options & Validation Errors
// ============================================================================

/// Options modifying `installGraphPackage`'s behavior (spec.md §4.8).
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Stop after computing the diff; perform no writes or audit row.
    pub preview_only: bool,
    /// Allow installing a version lower than the currently installed one.
    pub allow_downgrade: bool,
    /// Allow mutating a record type or binding owned by a different
    /// package.
    pub allow_foreign_type_mutation: bool,
}

/// A validation failure found during projection or ownership checking.
/// Each variant exposes a stable wire code via [`InstallValidationError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum InstallValidationError {
    /// A structural graph problem (orphan/cross-project baseType, cycle).
    Graph {
        /// Human-readable description of the graph problem.
        message: String,
    },
    /// The package attempts to mutate a record type owned by another
    /// package without `allowForeignTypeMutation`.
    PackageOwnershipConflict {
        /// The contested record type.
        record_type_key: RecordTypeKey,
        /// The package that owns it.
        owner_package_key: String,
    },
    /// The package attempts to mutate a binding (SLA, assignment rule)
    /// owned by another package without `allowForeignTypeMutation`.
    PackageBindingOwnershipConflict {
        /// The contested record type the binding targets.
        record_type_key: RecordTypeKey,
        /// The package that owns the binding.
        owner_package_key: String,
    },
    /// A derived record type's schema weakens a field the base type marks
    /// required.
    BaseTypeFieldWeakened {
        /// The derived record type.
        record_type_key: RecordTypeKey,
        /// The field whose `required` flag was weakened.
        field_name: String,
    },
}

impl InstallValidationError {
    /// Returns the stable, wire-visible error code for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Graph { .. } => "GRAPH_VALIDATION_ERROR",
            Self::PackageOwnershipConflict { .. } => "PACKAGE_OWNERSHIP_CONFLICT",
            Self::PackageBindingOwnershipConflict { .. } => "PACKAGE_BINDING_OWNERSHIP_CONFLICT",
            Self::BaseTypeFieldWeakened { .. } => "BASE_TYPE_FIELD_WEAKENED",
        }
    }
}

impl From<GraphValidationError> for InstallValidationError {
    fn from(err: GraphValidationError) -> Self {
        Self::Graph { message: err.to_string() }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// The outcome of one `installGraphPackage` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallReport {
    /// Whether the install (or preview) succeeded.
    pub success: bool,
    /// Checksum matched the latest install; no writes were made.
    pub noop: bool,
    /// Rejected by the version guard.
    pub rejected: bool,
    /// Human-readable reason for a noop or rejection.
    pub reason: Option<String>,
    /// Validation/ownership failures, populated only on a validation
    /// failure.
    pub validation_errors: Vec<InstallValidationError>,
    /// Diff between the pre- and post-install (or preview) snapshot.
    pub diff: Option<GraphDiff>,
    /// Count of record types, bindings, and workflows applied.
    pub applied_count: u64,
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Validates, orders, and applies `pkg` to `project_id`'s graph
/// (spec.md §4.8 `installGraphPackage`), in the exact nine-step order the
/// spec lists.
///
/// # Errors
///
/// Returns [`InstallError`] when a storage read/write aborts the call
/// outright. Validation failures, ownership conflicts, and version-guard
/// rejections are never raised; they are captured in the returned
/// [`InstallReport`].
#[allow(clippy::too_many_arguments, reason = "threads every caller-supplied identity, clock, and collaborator explicitly")]
pub fn install_graph_package(
    graph_store: &dyn GraphStore,
    install_store: &dyn InstallStore,
    events: &dyn DomainEventSink,
    tenant: &TenantContext,
    project_id: &ProjectId,
    pkg: &GraphPackage,
    opts: InstallOptions,
    installed_by: Option<UserId>,
    install_id: String,
    now: Timestamp,
) -> Result<InstallReport, InstallError> {
    // Step 1: checksum.
    let checksum = flowctl_core::checksum(pkg).map_err(|err| InstallError::Store(err.to_string()))?;

    // Step 2: idempotency.
    let latest = install_store
        .get_latest_install(project_id, &pkg.package_key)
        .map_err(|err| InstallError::Store(err.to_string()))?;
    if let Some(latest) = &latest {
        if latest.checksum == checksum {
            let reason = "checksum unchanged".to_string();
            events.emit(DomainEvent::GraphPackageInstallNoop {
                entity_id: project_id.as_str().to_string(),
                reason: reason.clone(),
            });
            return Ok(InstallReport {
                success: true,
                noop: true,
                reason: Some(reason),
                ..InstallReport::default()
            });
        }
    }

    // Step 3: version guard.
    if let Some(latest) = &latest {
        let installed_version = PackageVersion::parse(&latest.version).map_err(|err| InstallError::Store(err.to_string()))?;
        if pkg.version < installed_version && !opts.allow_downgrade {
            let reason = format!("package version {} is lower than installed version {installed_version}", pkg.version);
            events.emit(DomainEvent::GraphPackageInstallRejected {
                entity_id: project_id.as_str().to_string(),
                reason: reason.clone(),
            });
            return Ok(InstallReport {
                success: false,
                rejected: true,
                reason: Some(reason),
                ..InstallReport::default()
            });
        }
    }

    // Step 4: ownership check.
    let prior_installs = install_store
        .list_installs_for_project(project_id)
        .map_err(|err| InstallError::Store(err.to_string()))?;
    let mut validation_errors = Vec::new();
    if !opts.allow_foreign_type_mutation {
        for rt in &pkg.record_types {
            if let Some(owner) = owning_package_for_record_type(&prior_installs, &rt.key) {
                if owner != pkg.package_key {
                    validation_errors.push(InstallValidationError::PackageOwnershipConflict {
                        record_type_key: rt.key.clone(),
                        owner_package_key: owner.to_string(),
                    });
                }
            }
        }
        for binding_target in pkg.sla_policies.iter().map(|s| &s.record_type_key).chain(pkg.assignment_rules.iter().map(|r| &r.record_type_key)) {
            if let Some(owner) = owning_package_for_binding(&prior_installs, binding_target) {
                if owner != pkg.package_key {
                    validation_errors.push(InstallValidationError::PackageBindingOwnershipConflict {
                        record_type_key: binding_target.clone(),
                        owner_package_key: owner.to_string(),
                    });
                }
            }
        }
    }
    if !validation_errors.is_empty() {
        return Ok(InstallReport {
            success: false,
            validation_errors,
            ..InstallReport::default()
        });
    }

    // Step 5: projection + validation.
    let full_snapshot = flowctl_graph::build_graph_snapshot(graph_store, tenant, now)?;
    let current = full_snapshot.project_view(project_id);
    let projected = project_package_onto_snapshot(&current, pkg, project_id, &tenant.tenant_id);

    let mut errors: Vec<InstallValidationError> = validate_snapshot(&projected).into_iter().map(InstallValidationError::from).collect();
    for rt in &pkg.record_types {
        if let Some(weakened_field) = base_type_weakened_field(&current, rt) {
            errors.push(InstallValidationError::BaseTypeFieldWeakened {
                record_type_key: rt.key.clone(),
                field_name: weakened_field,
            });
        }
    }
    if !errors.is_empty() {
        return Ok(InstallReport {
            success: false,
            validation_errors: errors,
            ..InstallReport::default()
        });
    }

    let diff = diff_graph_snapshots(&current, &projected);

    // Step 6: preview exit.
    if opts.preview_only {
        return Ok(InstallReport {
            success: true,
            diff: Some(diff),
            ..InstallReport::default()
        });
    }

    // Step 7: topological apply.
    let mut applied_count: u64 = 0;
    let ordered = topo_order_record_types(&pkg.record_types).map_err(|TopoError(cycle)| InstallError::Store(format!("record type dependency cycle at {cycle}")))?;
    for rt in ordered {
        if diff.added_record_types.contains(&rt.key) {
            install_store
                .create_record_type(tenant, project_id, &rt.key, rt.name.as_deref(), rt.base_type.as_ref(), &rt.fields)
                .map_err(|err| InstallError::Store(err.to_string()))?;
            applied_count += 1;
        } else if let Some(modification) = diff.modified_record_types.iter().find(|m| m.record_type_key == rt.key) {
            if !modification.field_adds.is_empty() {
                let merged_fields = projected.find_record_type(&rt.key).map(|node| node.fields.clone()).unwrap_or_default();
                install_store
                    .update_record_type_schema(tenant, &rt.key, &merged_fields)
                    .map_err(|err| InstallError::Store(err.to_string()))?;
                applied_count += 1;
            }
        }
    }

    // Step 8: apply bindings.
    for sla in &pkg.sla_policies {
        install_store
            .update_record_type_sla_config(tenant, &sla.record_type_key, sla.duration_minutes)
            .map_err(|err| InstallError::Store(err.to_string()))?;
        applied_count += 1;
    }
    for rule in &pkg.assignment_rules {
        install_store
            .update_record_type_assignment_config(tenant, &rule.record_type_key, &rule.strategy)
            .map_err(|err| InstallError::Store(err.to_string()))?;
        applied_count += 1;
    }
    for workflow in &pkg.workflows {
        let existing = install_store
            .find_workflow_by_name(tenant, &workflow.name)
            .map_err(|err| InstallError::Store(err.to_string()))?;
        if existing.is_some() {
            continue;
        }
        let mut steps = workflow.steps.clone();
        steps.sort_by_key(|s| s.order_index);
        let def_id = install_store
            .create_workflow(tenant, &workflow.name, workflow.trigger_type, workflow.trigger_config.clone(), &steps, None, now)
            .map_err(|err| InstallError::Store(err.to_string()))?;
        install_store.activate_workflow(tenant, &def_id).map_err(|err| InstallError::Store(err.to_string()))?;
        applied_count += 1;
    }

    // Step 9: audit.
    let diff_value = serde_json::to_value(&diff).unwrap_or(serde_json::Value::Null);
    let install_row = GraphPackageInstall {
        id: install_id.clone(),
        project_id: project_id.clone(),
        package_key: pkg.package_key.clone(),
        version: pkg.version.to_string(),
        checksum,
        diff: diff_value,
        package_contents: pkg.clone(),
        installed_by,
        installed_at: now,
    };
    install_store.create_install(&install_row).map_err(|err| InstallError::Store(err.to_string()))?;
    events.emit(DomainEvent::GraphPackageInstalled {
        entity_id: install_id,
        affected_records: applied_count,
    });

    Ok(InstallReport {
        success: true,
        diff: Some(diff),
        applied_count,
        ..InstallReport::default()
    })
}

/// Returns the name of the first field that weakens a required baseType
/// field, if any (spec.md §4.8 "Base-type safety").
fn base_type_weakened_field(current: &flowctl_graph::GraphSnapshot, declared: &flowctl_graph::PackageRecordType) -> Option<String> {
    let base_key = declared.base_type.as_ref()?;
    let base = current.find_record_type(base_key)?;
    declared
        .fields
        .iter()
        .find(|field| {
            base.fields
                .iter()
                .any(|base_field| base_field.name == field.name && base_field.required && !field.required)
        })
        .map(|field| field.name.clone())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use panic-based failure reporting")]

    use super::base_type_weakened_field;
    use flowctl_graph::FieldNode;
    use flowctl_graph::GraphBindings;
    use flowctl_graph::GraphSnapshot;
    use flowctl_graph::PackageField;
    use flowctl_graph::PackageRecordType;
    use flowctl_graph::RecordTypeNode;
    use flowctl_core::ProjectId;
    use flowctl_core::RecordTypeKey;
    use flowctl_core::TenantId;
    use flowctl_core::Timestamp;

    fn field(name: &str, required: bool) -> FieldNode {
        FieldNode {
            name: name.to_string(),
            field_type: "string".to_string(),
            required,
        }
    }

    #[test]
    fn detects_weakened_required_field() {
        let current = GraphSnapshot {
            tenant_id: TenantId::new("tenant-a"),
            built_at: Timestamp::from_unix_millis(0),
            record_types: vec![RecordTypeNode {
                key: RecordTypeKey::new("person"),
                project_id: ProjectId::new("proj-a"),
                name: None,
                base_type: None,
                fields: vec![field("full_name", true)],
            }],
            edges: vec![],
            bindings: GraphBindings::default(),
        };
        let declared = PackageRecordType {
            key: RecordTypeKey::new("employee"),
            name: None,
            base_type: Some(RecordTypeKey::new("person")),
            fields: vec![PackageField {
                name: "full_name".to_string(),
                field_type: "string".to_string(),
                required: false,
            }],
        };
        assert_eq!(base_type_weakened_field(&current, &declared), Some("full_name".to_string()));
    }

    #[test]
    fn non_weakening_redefinition_is_allowed() {
        let current = GraphSnapshot {
            tenant_id: TenantId::new("tenant-a"),
            built_at: Timestamp::from_unix_millis(0),
            record_types: vec![RecordTypeNode {
                key: RecordTypeKey::new("person"),
                project_id: ProjectId::new("proj-a"),
                name: None,
                base_type: None,
                fields: vec![field("full_name", false)],
            }],
            edges: vec![],
            bindings: GraphBindings::default(),
        };
        let declared = PackageRecordType {
            key: RecordTypeKey::new("employee"),
            name: None,
            base_type: Some(RecordTypeKey::new("person")),
            fields: vec![PackageField {
                name: "full_name".to_string(),
                field_type: "string".to_string(),
                required: true,
            }],
        };
        assert_eq!(base_type_weakened_field(&current, &declared), None);
    }
}

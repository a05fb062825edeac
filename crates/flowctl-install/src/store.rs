// crates/flowctl-install/src/store.rs
// ============================================================================
// Module: Install Store Trait
// Description: The tenant-scoped storage surface the install engine reads
// and writes through: audit rows, record type mutation, and workflow
// authoring.
// Purpose: Let the install pipeline be tested against an in-memory fake and
// let `flowctl-store-sqlite` supply the real implementation.
// Dependencies: flowctl-core, flowctl-graph, flowctl-workflow, crate::row
// ============================================================================

use flowctl_core::ChangeId;
use flowctl_core::ProjectId;
use flowctl_core::RecordTypeKey;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_graph::AssignmentStrategy;
use flowctl_graph::PackageField;
use flowctl_graph::PackageWorkflowStep;
use flowctl_workflow::types::TriggerType;
use serde_json::Value;
use thiserror::Error;

use crate::row::GraphPackageInstall;

/// Error returned by an [`InstallStore`] implementation.
#[derive(Debug, Error)]
#[error("install store error: {0}")]
pub struct InstallStoreError(pub String);

/// The only storage surface the install engine consumes.
///
/// # Invariants
/// - Every read and write is scoped to the passed tenant/project; a write
///   that takes a child entity first verifies the parent belongs to the
///   same tenant (spec.md §4.11).
pub trait InstallStore: Send + Sync {
    /// Returns the most recent install row for `(project_id, package_key)`,
    /// if any.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn get_latest_install(&self, project_id: &ProjectId, package_key: &str) -> Result<Option<GraphPackageInstall>, InstallStoreError>;

    /// Returns the install row for `(project_id, package_key)` at the
    /// stated version, if any.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn get_install_by_version(&self, project_id: &ProjectId, package_key: &str, version: &str) -> Result<Option<GraphPackageInstall>, InstallStoreError>;

    /// Lists every install row ever recorded for `project_id`, across all
    /// package keys, used for the ownership scan (spec.md §4.8 step 4).
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn list_installs_for_project(&self, project_id: &ProjectId) -> Result<Vec<GraphPackageInstall>, InstallStoreError>;

    /// Appends a new install audit row.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn create_install(&self, install: &GraphPackageInstall) -> Result<(), InstallStoreError>;

    /// Creates a new record type with the given schema.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn create_record_type(
        &self,
        tenant: &TenantContext,
        project_id: &ProjectId,
        key: &RecordTypeKey,
        name: Option<&str>,
        base_type: Option<&RecordTypeKey>,
        fields: &[PackageField],
    ) -> Result<(), InstallStoreError>;

    /// Merges `fields` into an existing record type's schema.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn update_record_type_schema(&self, tenant: &TenantContext, key: &RecordTypeKey, fields: &[PackageField]) -> Result<(), InstallStoreError>;

    /// Upserts a record type's SLA duration.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn update_record_type_sla_config(&self, tenant: &TenantContext, key: &RecordTypeKey, duration_minutes: u32) -> Result<(), InstallStoreError>;

    /// Upserts a record type's assignment strategy.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn update_record_type_assignment_config(&self, tenant: &TenantContext, key: &RecordTypeKey, strategy: &AssignmentStrategy) -> Result<(), InstallStoreError>;

    /// Returns the id of an existing, any-status workflow definition with
    /// `name`, if one exists for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn find_workflow_by_name(&self, tenant: &TenantContext, name: &str) -> Result<Option<WorkflowDefinitionId>, InstallStoreError>;

    /// Creates a new, `draft` workflow definition with the given steps.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    #[allow(clippy::too_many_arguments, reason = "mirrors the full set of fields a package workflow declares")]
    fn create_workflow(
        &self,
        tenant: &TenantContext,
        name: &str,
        trigger_type: TriggerType,
        trigger_config: Value,
        steps: &[PackageWorkflowStep],
        change_id: Option<&ChangeId>,
        now: Timestamp,
    ) -> Result<WorkflowDefinitionId, InstallStoreError>;

    /// Activates a `draft` workflow definition.
    ///
    /// # Errors
    ///
    /// Returns [`InstallStoreError`] on a storage failure.
    fn activate_workflow(&self, tenant: &TenantContext, id: &WorkflowDefinitionId) -> Result<(), InstallStoreError>;
}

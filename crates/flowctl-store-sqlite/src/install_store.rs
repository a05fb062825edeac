// crates/flowctl-store-sqlite/src/install_store.rs
// ============================================================================
// Module: SQLite Install Store
// Description: `InstallStore` backed by `graph_package_installs`,
// `record_types`, and the workflow authoring tables.
// Purpose: Let the install pipeline (flowctl-install) persist audit rows,
// mutate record type schemas, and author/activate package workflows.
// Dependencies: flowctl-core, flowctl-graph, flowctl-install, flowctl-workflow,
// rusqlite, serde_json
// ============================================================================

use rusqlite::params;
use rusqlite::OptionalExtension;
use serde_json::Value;

use flowctl_core::ChangeId;
use flowctl_core::ProjectId;
use flowctl_core::RecordTypeKey;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_graph::AssignmentStrategy;
use flowctl_graph::GraphPackage;
use flowctl_graph::PackageField;
use flowctl_graph::PackageWorkflowStep;
use flowctl_install::GraphPackageInstall;
use flowctl_install::InstallStore;
use flowctl_install::InstallStoreError;
use flowctl_workflow::types::TriggerType;

use crate::SqliteStore;

fn trigger_type_name(trigger: TriggerType) -> &'static str {
    match trigger {
        TriggerType::Manual => "manual",
        TriggerType::RecordEvent => "record_event",
        TriggerType::Scheduled => "scheduled",
        TriggerType::Webhook => "webhook",
    }
}

fn row_to_install(
    id: String,
    project_id: String,
    package_key: String,
    version: String,
    checksum: String,
    diff_json: String,
    package_contents_json: String,
    installed_by: Option<String>,
    installed_at: i64,
) -> Result<GraphPackageInstall, InstallStoreError> {
    let diff: Value = serde_json::from_str(&diff_json).map_err(|err| InstallStoreError(err.to_string()))?;
    let package_contents: GraphPackage = serde_json::from_str(&package_contents_json).map_err(|err| InstallStoreError(err.to_string()))?;
    Ok(GraphPackageInstall {
        id,
        project_id: ProjectId::new(project_id),
        package_key,
        version,
        checksum,
        diff,
        package_contents,
        installed_by: installed_by.map(flowctl_core::UserId::new),
        installed_at: Timestamp::from_unix_millis(installed_at),
    })
}

impl InstallStore for SqliteStore {
    fn get_latest_install(&self, project_id: &ProjectId, package_key: &str) -> Result<Option<GraphPackageInstall>, InstallStoreError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, project_id, package_key, version, checksum, diff_json, package_contents_json, installed_by, installed_at
             FROM graph_package_installs
             WHERE project_id = ?1 AND package_key = ?2
             ORDER BY installed_at DESC LIMIT 1",
            params![project_id.as_str(), package_key],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            },
        )
        .optional()
        .map_err(|err| InstallStoreError(err.to_string()))?
        .map(|(id, project_id, package_key, version, checksum, diff_json, contents, installed_by, installed_at)| {
            row_to_install(id, project_id, package_key, version, checksum, diff_json, contents, installed_by, installed_at)
        })
        .transpose()
    }

    fn get_install_by_version(&self, project_id: &ProjectId, package_key: &str, version: &str) -> Result<Option<GraphPackageInstall>, InstallStoreError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, project_id, package_key, version, checksum, diff_json, package_contents_json, installed_by, installed_at
             FROM graph_package_installs
             WHERE project_id = ?1 AND package_key = ?2 AND version = ?3
             ORDER BY installed_at DESC LIMIT 1",
            params![project_id.as_str(), package_key, version],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            },
        )
        .optional()
        .map_err(|err| InstallStoreError(err.to_string()))?
        .map(|(id, project_id, package_key, version, checksum, diff_json, contents, installed_by, installed_at)| {
            row_to_install(id, project_id, package_key, version, checksum, diff_json, contents, installed_by, installed_at)
        })
        .transpose()
    }

    fn list_installs_for_project(&self, project_id: &ProjectId) -> Result<Vec<GraphPackageInstall>, InstallStoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, package_key, version, checksum, diff_json, package_contents_json, installed_by, installed_at
                 FROM graph_package_installs WHERE project_id = ?1 ORDER BY installed_at ASC",
            )
            .map_err(|err| InstallStoreError(err.to_string()))?;
        let rows = stmt
            .query_map(params![project_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })
            .map_err(|err| InstallStoreError(err.to_string()))?;
        let mut installs = Vec::new();
        for row in rows {
            let (id, project_id, package_key, version, checksum, diff_json, contents, installed_by, installed_at) =
                row.map_err(|err| InstallStoreError(err.to_string()))?;
            installs.push(row_to_install(id, project_id, package_key, version, checksum, diff_json, contents, installed_by, installed_at)?);
        }
        Ok(installs)
    }

    fn create_install(&self, install: &GraphPackageInstall) -> Result<(), InstallStoreError> {
        let conn = self.lock();
        let diff_json = serde_json::to_string(&install.diff).map_err(|err| InstallStoreError(err.to_string()))?;
        let contents_json = serde_json::to_string(&install.package_contents).map_err(|err| InstallStoreError(err.to_string()))?;
        conn.execute(
            "INSERT INTO graph_package_installs
                (id, project_id, package_key, version, checksum, diff_json, package_contents_json, installed_by, installed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                install.id,
                install.project_id.as_str(),
                install.package_key,
                install.version,
                install.checksum,
                diff_json,
                contents_json,
                install.installed_by.as_ref().map(flowctl_core::UserId::as_str),
                install.installed_at.as_unix_millis(),
            ],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;
        Ok(())
    }

    fn create_record_type(
        &self,
        tenant: &TenantContext,
        project_id: &ProjectId,
        key: &RecordTypeKey,
        name: Option<&str>,
        base_type: Option<&RecordTypeKey>,
        fields: &[PackageField],
    ) -> Result<(), InstallStoreError> {
        let conn = self.lock();
        let fields_json = serde_json::to_string(fields).map_err(|err| InstallStoreError(err.to_string()))?;
        conn.execute(
            "INSERT INTO record_types (tenant_id, project_id, key, name, base_type, fields_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (tenant_id, project_id, key) DO UPDATE SET
                name = excluded.name, base_type = excluded.base_type, fields_json = excluded.fields_json",
            params![
                tenant.tenant_id.as_str(),
                project_id.as_str(),
                key.as_str(),
                name,
                base_type.map(RecordTypeKey::as_str),
                fields_json,
            ],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;
        Ok(())
    }

    fn update_record_type_schema(&self, tenant: &TenantContext, key: &RecordTypeKey, fields: &[PackageField]) -> Result<(), InstallStoreError> {
        let conn = self.lock();
        let fields_json = serde_json::to_string(fields).map_err(|err| InstallStoreError(err.to_string()))?;
        conn.execute(
            "UPDATE record_types SET fields_json = ?1 WHERE tenant_id = ?2 AND key = ?3",
            params![fields_json, tenant.tenant_id.as_str(), key.as_str()],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;
        Ok(())
    }

    fn update_record_type_sla_config(&self, tenant: &TenantContext, key: &RecordTypeKey, duration_minutes: u32) -> Result<(), InstallStoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE record_types SET sla_duration_minutes = ?1 WHERE tenant_id = ?2 AND key = ?3",
            params![i64::from(duration_minutes), tenant.tenant_id.as_str(), key.as_str()],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;
        Ok(())
    }

    fn update_record_type_assignment_config(&self, tenant: &TenantContext, key: &RecordTypeKey, strategy: &AssignmentStrategy) -> Result<(), InstallStoreError> {
        let conn = self.lock();
        let strategy_json = serde_json::to_string(strategy).map_err(|err| InstallStoreError(err.to_string()))?;
        conn.execute(
            "UPDATE record_types SET assignment_strategy_json = ?1 WHERE tenant_id = ?2 AND key = ?3",
            params![strategy_json, tenant.tenant_id.as_str(), key.as_str()],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;
        Ok(())
    }

    fn find_workflow_by_name(&self, tenant: &TenantContext, name: &str) -> Result<Option<WorkflowDefinitionId>, InstallStoreError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id FROM workflow_definitions WHERE tenant_id = ?1 AND name = ?2 LIMIT 1",
            params![tenant.tenant_id.as_str(), name],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|err| InstallStoreError(err.to_string()))
        .map(|opt| opt.map(WorkflowDefinitionId::new))
    }

    fn create_workflow(
        &self,
        tenant: &TenantContext,
        name: &str,
        trigger_type: TriggerType,
        trigger_config: Value,
        steps: &[PackageWorkflowStep],
        change_id: Option<&ChangeId>,
        now: Timestamp,
    ) -> Result<WorkflowDefinitionId, InstallStoreError> {
        let conn = self.lock();
        let id = format!("wfdef-{}-{}", tenant.tenant_id.as_str(), name);
        let trigger_config_json = serde_json::to_string(&trigger_config).map_err(|err| InstallStoreError(err.to_string()))?;
        conn.execute(
            "INSERT INTO workflow_definitions
                (id, tenant_id, name, trigger_type, trigger_config_json, version, status, change_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, 'draft', ?6, ?7, ?7)",
            params![
                id,
                tenant.tenant_id.as_str(),
                name,
                trigger_type_name(trigger_type),
                trigger_config_json,
                change_id.map(ChangeId::as_str),
                now.as_unix_millis(),
            ],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;

        for step in steps {
            let step_id = format!("{id}-step-{}", step.order_index);
            let config_json = serde_json::to_string(&step.config).map_err(|err| InstallStoreError(err.to_string()))?;
            conn.execute(
                "INSERT INTO workflow_steps (id, workflow_definition_id, order_index, config_json) VALUES (?1, ?2, ?3, ?4)",
                params![step_id, id, step.order_index, config_json],
            )
            .map_err(|err| InstallStoreError(err.to_string()))?;
        }

        Ok(WorkflowDefinitionId::new(id))
    }

    fn activate_workflow(&self, tenant: &TenantContext, id: &WorkflowDefinitionId) -> Result<(), InstallStoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE workflow_definitions SET status = 'active' WHERE tenant_id = ?1 AND id = ?2",
            params![tenant.tenant_id.as_str(), id.as_str()],
        )
        .map_err(|err| InstallStoreError(err.to_string()))?;
        Ok(())
    }
}

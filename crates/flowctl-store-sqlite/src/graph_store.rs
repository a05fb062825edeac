// crates/flowctl-store-sqlite/src/graph_store.rs
// ============================================================================
// Module: SQLite Graph Store
// Description: `GraphStore` backed by the `record_types` and
// `workflow_definitions` tables.
// Purpose: Let `buildGraphSnapshot` (flowctl-graph) compose a tenant's
// current record types and bindings from durable storage.
// Dependencies: flowctl-core, flowctl-graph, rusqlite, serde_json
// ============================================================================

use rusqlite::params;

use flowctl_core::TenantContext;
use flowctl_graph::AssignmentBinding;
use flowctl_graph::ChangePolicyBinding;
use flowctl_graph::FieldNode;
use flowctl_graph::GraphBindings;
use flowctl_graph::GraphStore;
use flowctl_graph::GraphStoreError;
use flowctl_graph::RecordTypeNode;
use flowctl_graph::SlaBinding;
use flowctl_graph::WorkflowBinding;

use crate::SqliteStore;

impl GraphStore for SqliteStore {
    fn list_record_types(&self, tenant: &TenantContext) -> Result<Vec<RecordTypeNode>, GraphStoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT project_id, key, name, base_type, fields_json FROM record_types WHERE tenant_id = ?1")
            .map_err(|err| GraphStoreError(err.to_string()))?;
        let rows = stmt
            .query_map(params![tenant.tenant_id.as_str()], |row| {
                let project_id: String = row.get(0)?;
                let key: String = row.get(1)?;
                let name: Option<String> = row.get(2)?;
                let base_type: Option<String> = row.get(3)?;
                let fields_json: String = row.get(4)?;
                Ok((project_id, key, name, base_type, fields_json))
            })
            .map_err(|err| GraphStoreError(err.to_string()))?;

        let mut record_types = Vec::new();
        for row in rows {
            let (project_id, key, name, base_type, fields_json) = row.map_err(|err| GraphStoreError(err.to_string()))?;
            let fields: Vec<FieldNode> = serde_json::from_str(&fields_json).map_err(|err| GraphStoreError(err.to_string()))?;
            record_types.push(RecordTypeNode {
                key: flowctl_core::RecordTypeKey::new(key),
                project_id: flowctl_core::ProjectId::new(project_id),
                name,
                base_type: base_type.map(flowctl_core::RecordTypeKey::new),
                fields,
            });
        }
        Ok(record_types)
    }

    fn list_bindings(&self, tenant: &TenantContext) -> Result<GraphBindings, GraphStoreError> {
        let conn = self.lock();

        let mut workflow_stmt = conn
            .prepare("SELECT name FROM workflow_definitions WHERE tenant_id = ?1 AND status = 'active'")
            .map_err(|err| GraphStoreError(err.to_string()))?;
        let workflows: Vec<WorkflowBinding> = workflow_stmt
            .query_map(params![tenant.tenant_id.as_str()], |row| {
                let name: String = row.get(0)?;
                Ok(WorkflowBinding { name })
            })
            .map_err(|err| GraphStoreError(err.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|err| GraphStoreError(err.to_string()))?;

        let mut sla_stmt = conn
            .prepare("SELECT key, sla_duration_minutes FROM record_types WHERE tenant_id = ?1 AND sla_duration_minutes IS NOT NULL")
            .map_err(|err| GraphStoreError(err.to_string()))?;
        let slas: Vec<SlaBinding> = sla_stmt
            .query_map(params![tenant.tenant_id.as_str()], |row| {
                let key: String = row.get(0)?;
                let duration: i64 = row.get(1)?;
                Ok(SlaBinding {
                    record_type_key: flowctl_core::RecordTypeKey::new(key),
                    duration_minutes: u32::try_from(duration).unwrap_or(0),
                })
            })
            .map_err(|err| GraphStoreError(err.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|err| GraphStoreError(err.to_string()))?;

        let mut assignment_stmt = conn
            .prepare("SELECT key, assignment_strategy_json FROM record_types WHERE tenant_id = ?1 AND assignment_strategy_json IS NOT NULL")
            .map_err(|err| GraphStoreError(err.to_string()))?;
        let assignment_rows = assignment_stmt
            .query_map(params![tenant.tenant_id.as_str()], |row| {
                let key: String = row.get(0)?;
                let strategy_json: String = row.get(1)?;
                Ok((key, strategy_json))
            })
            .map_err(|err| GraphStoreError(err.to_string()))?;
        let mut assignments: Vec<AssignmentBinding> = Vec::new();
        for row in assignment_rows {
            let (key, strategy_json) = row.map_err(|err| GraphStoreError(err.to_string()))?;
            let strategy = serde_json::from_str(&strategy_json).map_err(|err| GraphStoreError(err.to_string()))?;
            assignments.push(AssignmentBinding {
                record_type_key: flowctl_core::RecordTypeKey::new(key),
                strategy,
            });
        }

        let mut owner_stmt = conn
            .prepare("SELECT key, owning_package_key FROM record_types WHERE tenant_id = ?1 AND owning_package_key IS NOT NULL")
            .map_err(|err| GraphStoreError(err.to_string()))?;
        let change_policies: Vec<ChangePolicyBinding> = owner_stmt
            .query_map(params![tenant.tenant_id.as_str()], |row| {
                let key: String = row.get(0)?;
                let owner: String = row.get(1)?;
                Ok(ChangePolicyBinding {
                    record_type_key: flowctl_core::RecordTypeKey::new(key),
                    owning_package_key: owner,
                })
            })
            .map_err(|err| GraphStoreError(err.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|err| GraphStoreError(err.to_string()))?;

        Ok(GraphBindings {
            workflows,
            slas,
            assignments,
            change_policies,
        })
    }
}

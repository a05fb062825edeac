// crates/flowctl-store-sqlite/src/intent_store.rs
// ============================================================================
// Module: SQLite Intent Store
// Description: `IntentStore` backed by `workflow_execution_intents`, with the
// `changes`/`modules` tables for module resolution.
// Purpose: Let the intent dispatcher (flowctl-intent) persist and drain
// pending intents with idempotency-key deduplication.
// Dependencies: flowctl-core, flowctl-intent, flowctl-workflow, rusqlite,
// serde_json
// ============================================================================

use rusqlite::params;
use rusqlite::OptionalExtension;
use serde_json::Value;

use flowctl_core::CapabilityProfile;
use flowctl_core::IntentId;
use flowctl_core::ModuleExecutionContext;
use flowctl_core::ModuleId;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_intent::IntentStatus;
use flowctl_intent::IntentStore;
use flowctl_intent::IntentStoreError;
use flowctl_intent::WorkflowExecutionIntent;
use flowctl_workflow::TriggerType;

use crate::SqliteStore;

fn status_name(status: IntentStatus) -> &'static str {
    match status {
        IntentStatus::Pending => "pending",
        IntentStatus::Dispatched => "dispatched",
        IntentStatus::Failed => "failed",
    }
}

fn parse_status(value: &str) -> IntentStatus {
    match value {
        "dispatched" => IntentStatus::Dispatched,
        "failed" => IntentStatus::Failed,
        _ => IntentStatus::Pending,
    }
}

fn trigger_type_name(trigger: TriggerType) -> &'static str {
    match trigger {
        TriggerType::Manual => "manual",
        TriggerType::RecordEvent => "record_event",
        TriggerType::Scheduled => "scheduled",
        TriggerType::Webhook => "webhook",
    }
}

fn parse_trigger_type(value: &str) -> TriggerType {
    match value {
        "record_event" => TriggerType::RecordEvent,
        "scheduled" => TriggerType::Scheduled,
        "webhook" => TriggerType::Webhook,
        _ => TriggerType::Manual,
    }
}

fn profile_from_name(name: &str) -> CapabilityProfile {
    CapabilityProfile::from_name(name).unwrap_or(CapabilityProfile::ReadOnly)
}

#[allow(clippy::too_many_arguments, reason = "mirrors the row columns read back from a single SELECT")]
fn row_to_intent(
    id: String,
    workflow_definition_id: String,
    trigger_type: String,
    trigger_payload_json: String,
    idempotency_key: Option<String>,
    status: String,
    execution_id: Option<String>,
    error: Option<String>,
    created_at: i64,
    dispatched_at: Option<i64>,
) -> Result<WorkflowExecutionIntent, IntentStoreError> {
    let trigger_payload: Value = serde_json::from_str(&trigger_payload_json).map_err(|err| IntentStoreError(err.to_string()))?;
    Ok(WorkflowExecutionIntent {
        id: IntentId::new(id),
        workflow_definition_id: WorkflowDefinitionId::new(workflow_definition_id),
        trigger_type: parse_trigger_type(&trigger_type),
        trigger_payload,
        idempotency_key,
        status: parse_status(&status),
        execution_id: execution_id.map(WorkflowExecutionId::new),
        error,
        created_at: Timestamp::from_unix_millis(created_at),
        dispatched_at: dispatched_at.map(Timestamp::from_unix_millis),
    })
}

impl IntentStore for SqliteStore {
    fn create_intent(
        &self,
        tenant: &TenantContext,
        workflow_definition_id: &WorkflowDefinitionId,
        trigger_type: TriggerType,
        trigger_payload: Value,
        idempotency_key: Option<&str>,
        id: IntentId,
        now: Timestamp,
    ) -> Result<WorkflowExecutionIntent, IntentStoreError> {
        let conn = self.lock();

        if let Some(key) = idempotency_key {
            let existing = conn
                .query_row(
                    "SELECT id, workflow_definition_id, trigger_type, trigger_payload_json, idempotency_key, status, execution_id, error, created_at, dispatched_at
                     FROM workflow_execution_intents WHERE tenant_id = ?1 AND idempotency_key = ?2",
                    params![tenant.tenant_id.as_str(), key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, Option<String>>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, Option<String>>(6)?,
                            row.get::<_, Option<String>>(7)?,
                            row.get::<_, i64>(8)?,
                            row.get::<_, Option<i64>>(9)?,
                        ))
                    },
                )
                .optional()
                .map_err(|err| IntentStoreError(err.to_string()))?;
            if let Some((id, wfdef, trigger, payload, key, status, exec, error, created, dispatched)) = existing {
                return row_to_intent(id, wfdef, trigger, payload, key, status, exec, error, created, dispatched);
            }
        }

        let trigger_payload_json = serde_json::to_string(&trigger_payload).map_err(|err| IntentStoreError(err.to_string()))?;
        conn.execute(
            "INSERT INTO workflow_execution_intents
                (id, tenant_id, workflow_definition_id, trigger_type, trigger_payload_json, idempotency_key, status, execution_id, error, created_at, dispatched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', NULL, NULL, ?7, NULL)",
            params![
                id.as_str(),
                tenant.tenant_id.as_str(),
                workflow_definition_id.as_str(),
                trigger_type_name(trigger_type),
                trigger_payload_json,
                idempotency_key,
                now.as_unix_millis(),
            ],
        )
        .map_err(|err| IntentStoreError(err.to_string()))?;

        Ok(WorkflowExecutionIntent {
            id,
            workflow_definition_id: workflow_definition_id.clone(),
            trigger_type,
            trigger_payload,
            idempotency_key: idempotency_key.map(str::to_owned),
            status: IntentStatus::Pending,
            execution_id: None,
            error: None,
            created_at: now,
            dispatched_at: None,
        })
    }

    fn list_pending_intents(&self, tenant: &TenantContext) -> Result<Vec<WorkflowExecutionIntent>, IntentStoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, workflow_definition_id, trigger_type, trigger_payload_json, idempotency_key, status, execution_id, error, created_at, dispatched_at
                 FROM workflow_execution_intents WHERE tenant_id = ?1 AND status = 'pending' ORDER BY created_at ASC",
            )
            .map_err(|err| IntentStoreError(err.to_string()))?;
        let rows = stmt
            .query_map(params![tenant.tenant_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, Option<i64>>(9)?,
                ))
            })
            .map_err(|err| IntentStoreError(err.to_string()))?;

        let mut intents = Vec::new();
        for row in rows {
            let (id, wfdef, trigger, payload, key, status, exec, error, created, dispatched) = row.map_err(|err| IntentStoreError(err.to_string()))?;
            intents.push(row_to_intent(id, wfdef, trigger, payload, key, status, exec, error, created, dispatched)?);
        }
        Ok(intents)
    }

    fn mark_dispatched(&self, tenant: &TenantContext, id: &IntentId, execution_id: &WorkflowExecutionId, now: Timestamp) -> Result<(), IntentStoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE workflow_execution_intents SET status = 'dispatched', execution_id = ?1, dispatched_at = ?2
             WHERE tenant_id = ?3 AND id = ?4",
            params![execution_id.as_str(), now.as_unix_millis(), tenant.tenant_id.as_str(), id.as_str()],
        )
        .map_err(|err| IntentStoreError(err.to_string()))?;
        Ok(())
    }

    fn mark_failed(&self, tenant: &TenantContext, id: &IntentId, error: &str, now: Timestamp) -> Result<(), IntentStoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE workflow_execution_intents SET status = 'failed', error = ?1, dispatched_at = ?2
             WHERE tenant_id = ?3 AND id = ?4",
            params![error, now.as_unix_millis(), tenant.tenant_id.as_str(), id.as_str()],
        )
        .map_err(|err| IntentStoreError(err.to_string()))?;
        Ok(())
    }

    fn resolve_module_context(&self, tenant: &TenantContext, workflow_definition_id: &WorkflowDefinitionId) -> Result<Option<ModuleExecutionContext>, IntentStoreError> {
        let conn = self.lock();

        let preferred = conn
            .query_row(
                "SELECT m.module_id, m.project_id, m.capability_profile, m.root_path
                 FROM workflow_definitions wd
                 JOIN changes c ON c.change_id = wd.change_id
                 JOIN modules m ON m.tenant_id = c.tenant_id AND m.module_id = c.module_id
                 WHERE wd.tenant_id = ?1 AND wd.id = ?2",
                params![tenant.tenant_id.as_str(), workflow_definition_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| IntentStoreError(err.to_string()))?;

        let resolved = match preferred {
            Some(found) => Some(found),
            None => conn
                .query_row(
                    "SELECT module_id, capability_profile, root_path FROM modules WHERE tenant_id = ?1 LIMIT 1",
                    params![tenant.tenant_id.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(|err| IntentStoreError(err.to_string()))?,
        };

        Ok(resolved.map(|(module_id, profile, root_path)| {
            ModuleExecutionContext::new(tenant.clone(), ModuleId::new(module_id), root_path, profile_from_name(&profile))
        }))
    }
}

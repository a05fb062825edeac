// crates/flowctl-store-sqlite/src/workflow_store.rs
// ============================================================================
// Module: SQLite Workflow Store
// Description: `WorkflowStore` backed by `workflow_definitions`,
// `workflow_steps`, `workflow_executions`, `workflow_step_executions`, and
// `record_locks`.
// Purpose: Let the workflow engine (flowctl-workflow) interpret and resume
// executions without depending on a concrete database itself.
// Dependencies: flowctl-core, flowctl-workflow, rusqlite, serde_json
// ============================================================================

use rusqlite::params;
use rusqlite::OptionalExtension;
use serde_json::Value;

use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_core::WorkflowStepExecutionId;
use flowctl_core::WorkflowStepId;
use flowctl_workflow::error::WorkflowError;
use flowctl_workflow::store::RecordLockOutcome;
use flowctl_workflow::store::WorkflowStore;
use flowctl_workflow::types::StepConfig;
use flowctl_workflow::types::TriggerType;
use flowctl_workflow::types::WorkflowDefinition;
use flowctl_workflow::types::WorkflowDefinitionStatus;
use flowctl_workflow::types::WorkflowExecution;
use flowctl_workflow::types::WorkflowExecutionStatus;
use flowctl_workflow::types::WorkflowStep;
use flowctl_workflow::types::WorkflowStepExecution;
use flowctl_workflow::types::WorkflowStepExecutionStatus;

use crate::SqliteStore;

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

fn definition_status_name(status: WorkflowDefinitionStatus) -> &'static str {
    match status {
        WorkflowDefinitionStatus::Draft => "draft",
        WorkflowDefinitionStatus::Active => "active",
        WorkflowDefinitionStatus::Retired => "retired",
    }
}

fn parse_definition_status(value: &str) -> WorkflowDefinitionStatus {
    match value {
        "active" => WorkflowDefinitionStatus::Active,
        "retired" => WorkflowDefinitionStatus::Retired,
        _ => WorkflowDefinitionStatus::Draft,
    }
}

fn execution_status_name(status: WorkflowExecutionStatus) -> &'static str {
    match status {
        WorkflowExecutionStatus::Running => "running",
        WorkflowExecutionStatus::Paused => "paused",
        WorkflowExecutionStatus::Completed => "completed",
        WorkflowExecutionStatus::Failed => "failed",
    }
}

fn parse_execution_status(value: &str) -> WorkflowExecutionStatus {
    match value {
        "paused" => WorkflowExecutionStatus::Paused,
        "completed" => WorkflowExecutionStatus::Completed,
        "failed" => WorkflowExecutionStatus::Failed,
        _ => WorkflowExecutionStatus::Running,
    }
}

fn step_execution_status_name(status: WorkflowStepExecutionStatus) -> &'static str {
    match status {
        WorkflowStepExecutionStatus::Pending => "pending",
        WorkflowStepExecutionStatus::Completed => "completed",
        WorkflowStepExecutionStatus::Failed => "failed",
        WorkflowStepExecutionStatus::AwaitingApproval => "awaiting_approval",
    }
}

fn parse_step_execution_status(value: &str) -> WorkflowStepExecutionStatus {
    match value {
        "completed" => WorkflowStepExecutionStatus::Completed,
        "failed" => WorkflowStepExecutionStatus::Failed,
        "awaiting_approval" => WorkflowStepExecutionStatus::AwaitingApproval,
        _ => WorkflowStepExecutionStatus::Pending,
    }
}

impl WorkflowStore for SqliteStore {
    fn get_definition(&self, tenant: &TenantContext, id: &WorkflowDefinitionId) -> Result<Option<WorkflowDefinition>, WorkflowError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT name, trigger_type, trigger_config_json, version, status, change_id, created_at, updated_at
                 FROM workflow_definitions WHERE tenant_id = ?1 AND id = ?2",
                params![tenant.tenant_id.as_str(), id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;

        let Some((name, trigger_type, trigger_config_json, version, status, change_id, created_at, updated_at)) = row else {
            return Ok(None);
        };
        let trigger_config: Value = serde_json::from_str(&trigger_config_json).map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(Some(WorkflowDefinition {
            id: id.clone(),
            tenant_id: tenant.tenant_id.clone(),
            name,
            trigger_type: parse_trigger_type(&trigger_type),
            trigger_config,
            version: u32::try_from(version).unwrap_or(0),
            status: parse_definition_status(&status),
            change_id: change_id.map(flowctl_core::ChangeId::new),
            created_at: Timestamp::from_unix_millis(created_at),
            updated_at: Timestamp::from_unix_millis(updated_at),
        }))
    }

    fn list_steps(&self, _tenant: &TenantContext, definition_id: &WorkflowDefinitionId) -> Result<Vec<WorkflowStep>, WorkflowError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, order_index, config_json FROM workflow_steps WHERE workflow_definition_id = ?1 ORDER BY order_index ASC")
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(params![definition_id.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(|err| WorkflowError::Store(err.to_string()))?;

        let mut steps = Vec::new();
        for row in rows {
            let (id, order_index, config_json) = row.map_err(|err| WorkflowError::Store(err.to_string()))?;
            let config: StepConfig = serde_json::from_str(&config_json).map_err(|err| WorkflowError::Store(err.to_string()))?;
            steps.push(WorkflowStep {
                id: WorkflowStepId::new(id),
                workflow_definition_id: definition_id.clone(),
                order_index,
                config,
            });
        }
        Ok(steps)
    }

    fn create_execution(&self, execution: &WorkflowExecution) -> Result<(), WorkflowError> {
        let conn = self.lock();
        let input_json = serde_json::to_string(&execution.input).map_err(|err| WorkflowError::Store(err.to_string()))?;
        let accumulated_json = execution
            .accumulated_input
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        conn.execute(
            "INSERT INTO workflow_executions
                (id, tenant_id, workflow_definition_id, intent_id, input_json, status, paused_at_step_id, accumulated_input_json, started_at, completed_at, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                execution.id.as_str(),
                execution.tenant_id.as_str(),
                execution.workflow_definition_id.as_str(),
                execution.intent_id.as_str(),
                input_json,
                execution_status_name(execution.status),
                execution.paused_at_step_id.as_ref().map(WorkflowStepId::as_str),
                accumulated_json,
                execution.started_at.as_unix_millis(),
                execution.completed_at.map(Timestamp::as_unix_millis),
                execution.error.as_deref(),
            ],
        )
        .map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(())
    }

    fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), WorkflowError> {
        let conn = self.lock();
        let accumulated_json = execution
            .accumulated_input
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        conn.execute(
            "UPDATE workflow_executions SET
                status = ?1, paused_at_step_id = ?2, accumulated_input_json = ?3, completed_at = ?4, error = ?5
             WHERE tenant_id = ?6 AND id = ?7",
            params![
                execution_status_name(execution.status),
                execution.paused_at_step_id.as_ref().map(WorkflowStepId::as_str),
                accumulated_json,
                execution.completed_at.map(Timestamp::as_unix_millis),
                execution.error.as_deref(),
                execution.tenant_id.as_str(),
                execution.id.as_str(),
            ],
        )
        .map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(())
    }

    fn get_execution(&self, tenant: &TenantContext, id: &WorkflowExecutionId) -> Result<Option<WorkflowExecution>, WorkflowError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT workflow_definition_id, intent_id, input_json, status, paused_at_step_id, accumulated_input_json, started_at, completed_at, error
                 FROM workflow_executions WHERE tenant_id = ?1 AND id = ?2",
                params![tenant.tenant_id.as_str(), id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, Option<i64>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;

        let Some((workflow_definition_id, intent_id, input_json, status, paused_at_step_id, accumulated_json, started_at, completed_at, error)) = row else {
            return Ok(None);
        };
        let input: Value = serde_json::from_str(&input_json).map_err(|err| WorkflowError::Store(err.to_string()))?;
        let accumulated_input = accumulated_json.map(|json| serde_json::from_str(&json)).transpose().map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(Some(WorkflowExecution {
            id: id.clone(),
            tenant_id: tenant.tenant_id.clone(),
            workflow_definition_id: WorkflowDefinitionId::new(workflow_definition_id),
            intent_id: flowctl_core::IntentId::new(intent_id),
            input,
            status: parse_execution_status(&status),
            paused_at_step_id: paused_at_step_id.map(WorkflowStepId::new),
            accumulated_input,
            started_at: Timestamp::from_unix_millis(started_at),
            completed_at: completed_at.map(Timestamp::from_unix_millis),
            error,
        }))
    }

    fn create_step_execution(&self, step_execution: &WorkflowStepExecution) -> Result<(), WorkflowError> {
        let conn = self.lock();
        let output_json = step_execution
            .output
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        conn.execute(
            "INSERT INTO workflow_step_executions (id, workflow_execution_id, workflow_step_id, status, output_json, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                step_execution.id.as_str(),
                step_execution.workflow_execution_id.as_str(),
                step_execution.workflow_step_id.as_str(),
                step_execution_status_name(step_execution.status),
                output_json,
                step_execution.executed_at.map(Timestamp::as_unix_millis),
            ],
        )
        .map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(())
    }

    fn update_step_execution(&self, step_execution: &WorkflowStepExecution) -> Result<(), WorkflowError> {
        let conn = self.lock();
        let output_json = step_execution
            .output
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        conn.execute(
            "UPDATE workflow_step_executions SET status = ?1, output_json = ?2, executed_at = ?3 WHERE id = ?4",
            params![
                step_execution_status_name(step_execution.status),
                output_json,
                step_execution.executed_at.map(Timestamp::as_unix_millis),
                step_execution.id.as_str(),
            ],
        )
        .map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(())
    }

    fn get_step_execution(&self, _tenant: &TenantContext, id: &WorkflowStepExecutionId) -> Result<Option<WorkflowStepExecution>, WorkflowError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT workflow_execution_id, workflow_step_id, status, output_json, executed_at FROM workflow_step_executions WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| WorkflowError::Store(err.to_string()))?;

        let Some((workflow_execution_id, workflow_step_id, status, output_json, executed_at)) = row else {
            return Ok(None);
        };
        let output = output_json.map(|json| serde_json::from_str(&json)).transpose().map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(Some(WorkflowStepExecution {
            id: id.clone(),
            workflow_execution_id: WorkflowExecutionId::new(workflow_execution_id),
            workflow_step_id: WorkflowStepId::new(workflow_step_id),
            status: parse_step_execution_status(&status),
            output,
            executed_at: executed_at.map(Timestamp::from_unix_millis),
        }))
    }

    fn try_acquire_record_lock(
        &self,
        tenant: &TenantContext,
        record_type_id: &str,
        record_id: &str,
        execution_id: &WorkflowExecutionId,
    ) -> Result<RecordLockOutcome, WorkflowError> {
        let conn = self.lock();
        let changed = conn
            .execute(
                "INSERT INTO record_locks (tenant_id, record_type_id, record_id, execution_id)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (tenant_id, record_type_id, record_id) DO NOTHING",
                params![tenant.tenant_id.as_str(), record_type_id, record_id, execution_id.as_str()],
            )
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(if changed > 0 {
            RecordLockOutcome::Acquired
        } else {
            RecordLockOutcome::AlreadyExists
        })
    }

    fn record_lock_holder(&self, tenant: &TenantContext, record_type_id: &str, record_id: &str) -> Result<Option<WorkflowExecutionId>, WorkflowError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT execution_id FROM record_locks WHERE tenant_id = ?1 AND record_type_id = ?2 AND record_id = ?3",
            params![tenant.tenant_id.as_str(), record_type_id, record_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|err| WorkflowError::Store(err.to_string()))
        .map(|opt| opt.map(WorkflowExecutionId::new))
    }

    fn release_locks_for_execution(&self, execution_id: &WorkflowExecutionId) -> Result<(), WorkflowError> {
        let conn = self.lock();
        conn.execute("DELETE FROM record_locks WHERE execution_id = ?1", params![execution_id.as_str()])
            .map_err(|err| WorkflowError::Store(err.to_string()))?;
        Ok(())
    }
}

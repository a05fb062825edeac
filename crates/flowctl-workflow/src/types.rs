// crates/flowctl-workflow/src/types.rs
// ============================================================================
// Module: Workflow Data Model
// Description: Definitions, steps, executions, and step executions, plus
// the tagged step-config payload decoded once at the API edge.
// Purpose: Give the engine strongly-typed state to read and write instead
// of an open JSON map per step.
// Dependencies: flowctl-core, serde, serde_json
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use flowctl_core::ChangeId;
use flowctl_core::TenantId;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_core::WorkflowStepExecutionId;
use flowctl_core::WorkflowStepId;

// ============================================================================
// SECTION: Workflow Definition
// ============================================================================

/// How a workflow's executions get started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Started by an explicit API call.
    Manual,
    /// Started by a record create/update/delete event.
    RecordEvent,
    /// Started by a cron-style schedule.
    Scheduled,
    /// Started by an inbound webhook.
    Webhook,
}

/// Lifecycle status of a workflow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowDefinitionStatus {
    /// Not yet activatable; steps may still be edited freely.
    Draft,
    /// Activated; intents may dispatch executions against it.
    Active,
    /// Retired; no new executions may start.
    Retired,
}

/// A named, versioned workflow. Steps are stored as separate entities
/// (see [`WorkflowStep`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Identifier of this definition.
    pub id: WorkflowDefinitionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-readable name.
    pub name: String,
    /// How executions of this definition are started.
    pub trigger_type: TriggerType,
    /// Trigger-specific configuration (schedule cron string, webhook path, ...).
    pub trigger_config: Value,
    /// Monotonically increasing version number.
    pub version: u32,
    /// Lifecycle status.
    pub status: WorkflowDefinitionStatus,
    /// Id of the change that authored this definition, if any.
    pub change_id: Option<ChangeId>,
    /// Row creation time.
    pub created_at: Timestamp,
    /// Row last-update time.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Workflow Step
// ============================================================================

/// Who an `assignment` step's target resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeType {
    /// A specific user.
    User,
    /// A named group.
    Group,
    /// A named assignment rule to evaluate.
    Rule,
}

/// Per-`stepType` configuration, decoded once at the API edge instead of
/// kept as an open JSON map inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stepType", content = "config", rename_all = "snake_case")]
pub enum StepConfig {
    /// Resolves an assignee token.
    Assignment {
        /// Kind of assignee target.
        assignee_type: AssigneeType,
        /// Assignee identifier: user id, group name, or rule name.
        assignee_ref: String,
    },
    /// Gates on human approval, or auto-approves.
    Approval {
        /// Skip the pause and approve immediately.
        auto_approve: bool,
    },
    /// Records a notification to send (delivery itself is out of scope).
    Notification {
        /// Delivery channel (`email`, `slack`, ...).
        channel: String,
        /// Recipient identifier.
        recipient: String,
        /// Template name.
        template: String,
        /// Rendered message body.
        message: String,
    },
    /// Evaluates a flat comparator against accumulated input and branches.
    Decision {
        /// Field path to read from accumulated input.
        condition_field: String,
        /// Comparator operator name (`equals`, `not_equals`, `truthy`, `falsy`).
        condition_operator: String,
        /// Value to compare against, when the operator needs one.
        condition_value: Option<Value>,
        /// `orderIndex` to jump to when the condition is true.
        on_true_step_index: i64,
        /// `orderIndex` to jump to when the condition is false.
        on_false_step_index: i64,
    },
    /// Mutates a record from static fields plus values pulled from input.
    RecordMutation {
        /// Record type id the mutation's lock check is scoped to.
        record_type_id: String,
        /// Field in accumulated input holding the target record id.
        record_id_field: String,
        /// Static field-to-value mutations applied unconditionally.
        mutations: serde_json::Map<String, Value>,
        /// Field-to-input-path mapping pulled from accumulated input.
        source_mapping: serde_json::Map<String, Value>,
    },
    /// Acquires an advisory lock on a record for the life of this execution.
    RecordLock {
        /// Record type id the lock is scoped to.
        record_type_id: String,
        /// Field in accumulated input holding the target record id.
        record_id_field: String,
    },
}

/// One step within a [`WorkflowDefinition`], ordered densely by `orderIndex`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Identifier of this step.
    pub id: WorkflowStepId,
    /// Owning definition.
    pub workflow_definition_id: WorkflowDefinitionId,
    /// Dense, zero-based position among this definition's steps.
    pub order_index: i64,
    /// Step-type-specific configuration.
    pub config: StepConfig,
}

// ============================================================================
// SECTION: Workflow Execution
// ============================================================================

/// Lifecycle status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowExecutionStatus {
    /// Steps are actively being interpreted.
    Running,
    /// Suspended at an `approval` step awaiting a decision.
    Paused,
    /// Reached the end of the step sequence without error.
    Completed,
    /// A step handler or branch target failed.
    Failed,
}

/// One run of a [`WorkflowDefinition`] against a concrete input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Identifier of this execution.
    pub id: WorkflowExecutionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Definition this execution is interpreting.
    pub workflow_definition_id: WorkflowDefinitionId,
    /// Intent that authorized this execution; always present.
    pub intent_id: flowctl_core::IntentId,
    /// Original trigger input.
    pub input: Value,
    /// Current lifecycle status.
    pub status: WorkflowExecutionStatus,
    /// Step this execution is paused at, when `status == Paused`.
    pub paused_at_step_id: Option<WorkflowStepId>,
    /// Input accumulated across completed steps, carried across a pause.
    pub accumulated_input: Option<Value>,
    /// When this execution began.
    pub started_at: Timestamp,
    /// When this execution reached a terminal status.
    pub completed_at: Option<Timestamp>,
    /// Failure cause, when `status == Failed`.
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Workflow Step Execution
// ============================================================================

/// Lifecycle status of a single step's execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStepExecutionStatus {
    /// Created but not yet run.
    Pending,
    /// Ran to completion.
    Completed,
    /// Ran and failed.
    Failed,
    /// Ran, produced an `approval` pause, and is waiting on a resume.
    AwaitingApproval,
}

/// The record of one step having run (or paused) within a
/// [`WorkflowExecution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStepExecution {
    /// Identifier of this step execution row.
    pub id: WorkflowStepExecutionId,
    /// Owning execution.
    pub workflow_execution_id: WorkflowExecutionId,
    /// Step this row records the execution of.
    pub workflow_step_id: WorkflowStepId,
    /// Current status.
    pub status: WorkflowStepExecutionStatus,
    /// Step handler output, once run.
    pub output: Option<Value>,
    /// When this step finished running (or paused).
    pub executed_at: Option<Timestamp>,
}

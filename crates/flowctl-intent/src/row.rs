// crates/flowctl-intent/src/row.rs
// ============================================================================
// Module: Execution Intent Rows
// Description: The durable precondition a trigger creates before a workflow
// execution may start.
// Purpose: Give the dispatcher and its store a typed row shape instead of a
// dynamic `{type, payload}` map.
// Dependencies: flowctl-core, flowctl-workflow, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use flowctl_core::IntentId;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_workflow::TriggerType;

/// An intent's position in its lifecycle (spec.md §4.6).
///
/// # Invariants
/// - `Dispatched` and `Failed` are terminal; dispatch never revisits an
///   intent once it leaves `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Created, not yet picked up by the dispatcher.
    Pending,
    /// Dispatch called `executeWorkflow` successfully.
    Dispatched,
    /// Dispatch could not resolve a module, load an active definition, or
    /// `executeWorkflow` aborted outright.
    Failed,
}

/// The durable precondition for every workflow execution (spec.md §3
/// `WorkflowExecutionIntent`). Direct execution without a corresponding
/// intent is not possible through this crate's entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecutionIntent {
    /// Identifier of this intent.
    pub id: IntentId,
    /// Definition this intent will start an execution of.
    pub workflow_definition_id: WorkflowDefinitionId,
    /// What kind of trigger created this intent.
    pub trigger_type: TriggerType,
    /// Payload the trigger captured, passed through as the execution's
    /// input.
    pub trigger_payload: Value,
    /// Caller-supplied deduplication key. A second insert carrying a key
    /// already present for the tenant returns the pre-existing row instead
    /// of creating a duplicate (spec.md §4.6 "Idempotency").
    pub idempotency_key: Option<String>,
    /// Current lifecycle position.
    pub status: IntentStatus,
    /// Identifier of the execution this intent dispatched to, once
    /// `Dispatched`.
    pub execution_id: Option<WorkflowExecutionId>,
    /// Cause recorded when dispatch marks this intent `Failed`.
    pub error: Option<String>,
    /// When this intent was created; dispatch drains intents oldest-first
    /// by this field.
    pub created_at: Timestamp,
    /// When dispatch resolved this intent (successfully or not).
    pub dispatched_at: Option<Timestamp>,
}

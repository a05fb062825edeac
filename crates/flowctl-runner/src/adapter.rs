// crates/flowctl-runner/src/adapter.rs
// ============================================================================
// Module: Runner Adapter Trait
// Description: The uniform surface the workflow engine, intent dispatcher,
// and control plane use to execute an admitted request.
// Purpose: Let callers swap the local and remote adapters without caring
// which one actually ran the action.
// Dependencies: flowctl-core, flowctl-audit
// ============================================================================

use flowctl_audit::DomainEventSink;
use flowctl_core::execution::ExecutionRequest;
use flowctl_core::execution::ExecutionResult;

/// Executes admitted [`ExecutionRequest`]s and always returns an
/// [`ExecutionResult`] (never raises, regardless of the underlying failure).
///
/// # Invariants
/// - `execution_id` is supplied by the caller; no adapter generates its own.
/// - Every call emits exactly one `execution_started` event followed by
///   exactly one `execution_completed` or `execution_failed` event on
///   `events`.
pub trait RunnerAdapter: Send + Sync {
    /// Executes a single workflow step (`requestedAction: workflow_step`).
    fn execute_workflow_step(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &dyn DomainEventSink,
    ) -> ExecutionResult;

    /// Executes an agent task (`requestedAction: agent_task`).
    fn execute_task(&self, execution_id: &str, request: &ExecutionRequest, events: &dyn DomainEventSink) -> ExecutionResult;

    /// Executes a single named agent action (`requestedAction: agent_action`,
    /// plus `workspace_start`/`workspace_stop`/`skill_invoke`, all dispatched
    /// through the same action-name handler).
    fn execute_agent_action(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &dyn DomainEventSink,
    ) -> ExecutionResult;
}

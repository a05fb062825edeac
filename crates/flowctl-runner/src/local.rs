// crates/flowctl-runner/src/local.rs
// ============================================================================
// Module: Local Runner Adapter
// Description: In-process dispatch of admitted ExecutionRequests (C4).
// Purpose: Run workspace lifecycle and agent actions inside this process
// without a remote hop, matching spec.md §4.4's local adapter flow.
// Dependencies: flowctl-boundary, flowctl-core, flowctl-audit
// ============================================================================

//! ## Overview
//! Every call runs the same four-step flow: boundary-validate, emit
//! `execution_started`, dispatch to the action handler, emit
//! `execution_completed` or `execution_failed`. A boundary rejection returns
//! immediately without emitting `execution_started`, since the call never began.

use flowctl_audit::DomainEvent;
use flowctl_audit::DomainEventSink;
use flowctl_boundary::validate_module_boundary_path;
use flowctl_core::capability::assert_capability;
use flowctl_core::capability::Capability;
use flowctl_core::context::ModuleExecutionContext;
use flowctl_core::execution::ExecutionRequest;
use flowctl_core::execution::ExecutionResult;
use flowctl_core::execution::RequestedAction;

use crate::adapter::RunnerAdapter;

/// In-process runner adapter. Holds no state of its own; every dependency an
/// action handler needs travels on the [`ExecutionRequest`] itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAdapter;

impl LocalAdapter {
    /// Creates a local adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RunnerAdapter for LocalAdapter {
    fn execute_workflow_step(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &dyn DomainEventSink,
    ) -> ExecutionResult {
        dispatch(execution_id, request, events, |request| match &request.requested_action {
            RequestedAction::WorkflowStep { payload } => ExecutionResult::success(
                Some(payload.clone()),
                vec![format!("workflow step dispatched by local adapter (execution {execution_id})")],
            ),
            other => unexpected_action(other),
        })
    }

    fn execute_task(&self, execution_id: &str, request: &ExecutionRequest, events: &dyn DomainEventSink) -> ExecutionResult {
        dispatch(execution_id, request, events, |request| match &request.requested_action {
            RequestedAction::AgentTask { payload } => ExecutionResult::success(
                Some(payload.clone()),
                vec![format!("agent task dispatched by local adapter (execution {execution_id})")],
            ),
            other => unexpected_action(other),
        })
    }

    fn execute_agent_action(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &dyn DomainEventSink,
    ) -> ExecutionResult {
        dispatch(execution_id, request, events, |request| match &request.requested_action {
            RequestedAction::AgentAction { name, payload } => {
                dispatch_named_action(execution_id, name, payload, &request.module_execution_context)
            }
            RequestedAction::WorkspaceStart { payload } => {
                dispatch_named_action(execution_id, "workspace_start", payload, &request.module_execution_context)
            }
            RequestedAction::WorkspaceStop { payload } => {
                dispatch_named_action(execution_id, "workspace_stop", payload, &request.module_execution_context)
            }
            RequestedAction::SkillInvoke { name, payload } => {
                dispatch_named_action(execution_id, name, payload, &request.module_execution_context)
            }
            other => unexpected_action(other),
        })
    }
}

/// Shared per-call flow: boundary-validate, emit `execution_started`,
/// dispatch, emit `execution_completed`/`execution_failed`.
fn dispatch(
    execution_id: &str,
    request: &ExecutionRequest,
    events: &dyn DomainEventSink,
    handler: impl FnOnce(&ExecutionRequest) -> ExecutionResult,
) -> ExecutionResult {
    if let Err(err) = flowctl_boundary::admit(request) {
        return ExecutionResult::failure(err.code(), vec![format!("boundary rejected execution {execution_id}: {err}")]);
    }

    events.emit(DomainEvent::ExecutionStarted {
        entity_id: execution_id.to_string(),
    });

    let result = handler(request);

    if result.success {
        events.emit(DomainEvent::ExecutionCompleted {
            entity_id: execution_id.to_string(),
        });
    } else {
        events.emit(DomainEvent::ExecutionFailed {
            entity_id: execution_id.to_string(),
            error: result.error.clone().unwrap_or_else(|| "UNKNOWN_ERROR".to_string()),
        });
    }

    result
}

/// Returns a failure result for a requested action that does not match the
/// entry point it was dispatched through.
fn unexpected_action(action: &RequestedAction) -> ExecutionResult {
    ExecutionResult::failure(
        "ACTION_MISMATCH",
        vec![format!("requested action '{}' does not match this entry point", action.kind_label())],
    )
}

/// Dispatches a single named action inside the local adapter, per spec.md
/// §4.4's action table.
fn dispatch_named_action(
    execution_id: &str,
    name: &str,
    payload: &serde_json::Value,
    module_ctx: &ModuleExecutionContext,
) -> ExecutionResult {
    match name {
        "workspace_start" => workspace_start(execution_id, module_ctx),
        "workspace_stop" => ExecutionResult::success(None, vec![format!("workspace stopped for execution {execution_id}")]),
        "run_command" => run_command(payload, module_ctx),
        "get_diff" => capability_checked_read(module_ctx, Capability::GitDiff, "diff"),
        "get_logs" => capability_checked_read(module_ctx, Capability::FsRead, "logs"),
        other => ExecutionResult::failure("UNKNOWN_ACTION", vec![format!("no handler registered for action '{other}'")]),
    }
}

/// Provisions a synthetic container id and preview URL, deterministically
/// derived from the execution id and module id so repeated calls for the
/// same execution are idempotent.
fn workspace_start(execution_id: &str, module_ctx: &ModuleExecutionContext) -> ExecutionResult {
    let digest = match flowctl_core::checksum(&(execution_id, module_ctx.module_id.as_str())) {
        Ok(digest) => digest,
        Err(err) => {
            return ExecutionResult::failure("WORKSPACE_PROVISION_FAILED", vec![format!("failed to derive workspace identity: {err}")]);
        }
    };
    let container_id = format!("ctr-{}", &digest[..12]);
    let preview_url = format!("https://preview.flowctl.internal/{container_id}");
    ExecutionResult::success(
        Some(serde_json::json!({ "containerId": container_id, "previewUrl": preview_url })),
        vec![format!("workspace provisioned for execution {execution_id}")],
    )
}

/// Runs `run_command`, path-validating `targetPath` against the module
/// boundary when the payload carries one.
fn run_command(payload: &serde_json::Value, module_ctx: &ModuleExecutionContext) -> ExecutionResult {
    if let Err(denied) = assert_capability(&module_ctx.capabilities, Capability::CmdRun) {
        return ExecutionResult::failure("CAPABILITY_NOT_GRANTED", vec![denied.to_string()]);
    }

    if let Some(target_path) = payload.get("targetPath").and_then(serde_json::Value::as_str) {
        if let Err(err) = validate_module_boundary_path(&module_ctx.module_id, &module_ctx.module_root_path, target_path) {
            return ExecutionResult::failure("PATH_BOUNDARY_VIOLATION", vec![err.to_string()]);
        }
    }

    ExecutionResult::success(Some(serde_json::json!({ "ran": true })), vec!["command executed inside module boundary".to_string()])
}

/// Runs a read-only, capability-checked action (`get_diff`, `get_logs`).
fn capability_checked_read(module_ctx: &ModuleExecutionContext, required: Capability, label: &str) -> ExecutionResult {
    match assert_capability(&module_ctx.capabilities, required) {
        Ok(()) => ExecutionResult::success(Some(serde_json::json!({})), vec![format!("{label} read succeeded")]),
        Err(denied) => ExecutionResult::failure("CAPABILITY_NOT_GRANTED", vec![denied.to_string()]),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use panic-based failure reporting")]

    use super::LocalAdapter;
    use crate::adapter::RunnerAdapter;
    use flowctl_audit::LogEventSink;
    use flowctl_core::capability::Capability;
    use flowctl_core::capability::CapabilityProfile;
    use flowctl_core::context::ContextSource;
    use flowctl_core::context::ModuleExecutionContext;
    use flowctl_core::context::TenantContext;
    use flowctl_core::execution::ExecutionRequest;
    use flowctl_core::execution::RequestedAction;
    use flowctl_core::identifiers::ModuleId;
    use flowctl_core::identifiers::TenantId;
    use serde_json::json;

    fn request(action: RequestedAction, capabilities: Vec<Capability>, profile: CapabilityProfile) -> ExecutionRequest {
        let tenant = TenantContext::new(TenantId::new("tenant-a"), None, None, ContextSource::Internal);
        let module_ctx = ModuleExecutionContext::new(tenant.clone(), ModuleId::new("module-a"), "src/components", profile);
        ExecutionRequest {
            tenant_context: tenant,
            module_execution_context: module_ctx,
            requested_action: action,
            requested_capabilities: capabilities,
        }
    }

    #[test]
    fn boundary_rejection_returns_failure_without_starting() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let mut req = request(RequestedAction::AgentTask { payload: json!({}) }, vec![], CapabilityProfile::ReadOnly);
        req.tenant_context.tenant_id = TenantId::new("   ");

        let result = adapter.execute_task("exec-1", &req, &sink);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("MISSING_TENANT_CONTEXT"));
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn agent_task_dispatch_succeeds_and_emits_lifecycle_events() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let req = request(RequestedAction::AgentTask { payload: json!({"x": 1}) }, vec![], CapabilityProfile::ReadOnly);

        let result = adapter.execute_task("exec-1", &req, &sink);

        assert!(result.success);
        assert_eq!(result.output, Some(json!({"x": 1})));
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("execution_started"));
        assert!(lines[1].contains("execution_completed"));
    }

    #[test]
    fn unknown_agent_action_fails_with_unknown_action() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let req = request(
            RequestedAction::AgentAction { name: "teleport".to_string(), payload: json!({}) },
            vec![],
            CapabilityProfile::SystemPrivileged,
        );

        let result = adapter.execute_agent_action("exec-1", &req, &sink);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("UNKNOWN_ACTION"));
    }

    #[test]
    fn run_command_rejects_path_traversal() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let req = request(
            RequestedAction::AgentAction {
                name: "run_command".to_string(),
                payload: json!({"targetPath": "../etc/passwd"}),
            },
            vec![],
            CapabilityProfile::CodeModuleDefault,
        );

        let result = adapter.execute_agent_action("exec-1", &req, &sink);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("PATH_BOUNDARY_VIOLATION"));
    }

    #[test]
    fn run_command_without_cmd_run_capability_is_denied() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let req = request(
            RequestedAction::AgentAction { name: "run_command".to_string(), payload: json!({}) },
            vec![],
            CapabilityProfile::ReadOnly,
        );

        let result = adapter.execute_agent_action("exec-1", &req, &sink);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("CAPABILITY_NOT_GRANTED"));
    }

    #[test]
    fn workspace_start_is_deterministic_for_the_same_execution() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let req = request(RequestedAction::WorkspaceStart { payload: json!({}) }, vec![], CapabilityProfile::SystemPrivileged);

        let first = adapter.execute_agent_action("exec-1", &req, &sink);
        let second = adapter.execute_agent_action("exec-1", &req, &sink);

        assert_eq!(first.output, second.output);
        assert!(first.output.unwrap()["containerId"].as_str().unwrap().starts_with("ctr-"));
    }

    #[test]
    fn execution_mismatch_is_rejected_by_the_wrong_entry_point() {
        let adapter = LocalAdapter::new();
        let sink = LogEventSink::new();
        let req = request(RequestedAction::AgentTask { payload: json!({}) }, vec![], CapabilityProfile::ReadOnly);

        let result = adapter.execute_workflow_step("exec-1", &req, &sink);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("ACTION_MISMATCH"));
    }
}

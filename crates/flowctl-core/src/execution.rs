// crates/flowctl-core/src/execution.rs
// ============================================================================
// Module: Flowctl Execution Envelope
// Description: The request/result envelope crossing the control-plane to
// runner boundary.
// Purpose: Give every runner adapter one uniform, typed request and result
// shape regardless of action kind.
// Dependencies: crate::capability, crate::context, serde, serde_json
// ============================================================================

//! ## Overview
//! [`ExecutionRequest`] is the only shape a runner adapter (`flowctl-runner`)
//! ever receives. Per design note §9 ("dynamic JSON payloads"), the
//! `requested_action` carries a typed payload per action kind rather than an
//! open map; callers decode once at the boundary and keep strongly-typed
//! values inside the engine from then on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::capability::Capability;
use crate::context::ModuleExecutionContext;
use crate::context::TenantContext;

// ============================================================================
// SECTION: Requested Action
// ============================================================================

/// The action an [`ExecutionRequest`] asks the runner to perform, tagged
/// with its action-specific input payload.
///
/// # Invariants
/// - Exactly one variant per `requestedAction` value named in the data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "input", rename_all = "snake_case")]
pub enum RequestedAction {
    /// Execute a single workflow step.
    WorkflowStep {
        /// Free-form step input, interpreted by the workflow engine's step handler.
        payload: Value,
    },
    /// Run an agent task.
    AgentTask {
        /// Free-form task input.
        payload: Value,
    },
    /// Run a single agent action (e.g. `run_command`, `get_diff`, `get_logs`).
    AgentAction {
        /// Name of the action to dispatch inside the local adapter.
        name: String,
        /// Free-form action input.
        payload: Value,
    },
    /// Provision and start a workspace.
    WorkspaceStart {
        /// Free-form workspace-start input.
        payload: Value,
    },
    /// Tear down a running workspace.
    WorkspaceStop {
        /// Free-form workspace-stop input.
        payload: Value,
    },
    /// Invoke a named skill.
    SkillInvoke {
        /// Name of the skill to invoke.
        name: String,
        /// Free-form skill input.
        payload: Value,
    },
}

impl RequestedAction {
    /// Returns a stable, wire-visible label for this action kind.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::WorkflowStep { .. } => "workflow_step",
            Self::AgentTask { .. } => "agent_task",
            Self::AgentAction { .. } => "agent_action",
            Self::WorkspaceStart { .. } => "workspace_start",
            Self::WorkspaceStop { .. } => "workspace_stop",
            Self::SkillInvoke { .. } => "skill_invoke",
        }
    }
}

// ============================================================================
// SECTION: Execution Request
// ============================================================================

/// A fully formed request to execute something at the runner boundary.
///
/// # Invariants
/// - `tenant_context` must equal `module_execution_context.tenant_context`.
/// - `requested_capabilities` must be a subset of
///   `module_execution_context.capabilities`.
/// - Both invariants are enforced by `flowctl-boundary`, not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Outer tenant context this request was issued under.
    pub tenant_context: TenantContext,
    /// Module execution context the request executes under.
    pub module_execution_context: ModuleExecutionContext,
    /// The action being requested.
    pub requested_action: RequestedAction,
    /// The subset of the module's granted capabilities this request needs.
    pub requested_capabilities: Vec<Capability>,
}

// ============================================================================
// SECTION: Execution Result
// ============================================================================

/// The uniform result every runner adapter call returns.
///
/// # Invariants
/// - Every adapter call produces one of these; nothing is ever allowed to
///   raise past the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the execution succeeded.
    pub success: bool,
    /// Free-form output payload on success.
    pub output: Option<Value>,
    /// Human-readable log lines accumulated during execution.
    pub logs: Vec<String>,
    /// Machine-readable error code on failure.
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Builds a successful result.
    #[must_use]
    pub fn success(output: Option<Value>, logs: Vec<String>) -> Self {
        Self {
            success: true,
            output,
            logs,
            error: None,
        }
    }

    /// Builds a failure result with a machine-readable error code.
    #[must_use]
    pub fn failure(error: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: false,
            output: None,
            logs,
            error: Some(error.into()),
        }
    }
}

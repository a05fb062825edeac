// crates/flowctl-server/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: `POST /execute` and `GET /health` (spec.md §6).
// Purpose: Translate HTTP into RunnerAdapter calls and back; hold no
// business logic of its own.
// Dependencies: flowctl-audit, flowctl-core, flowctl-runner, axum
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::extract::State;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Serialize;

use flowctl_audit::DomainEventSink;
use flowctl_core::execution::ExecutionRequest;
use flowctl_core::execution::ExecutionResult;
use flowctl_core::execution::RequestedAction;
use flowctl_runner::RunnerAdapter;

use crate::readiness::ReadinessProbe;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    adapter: Arc<dyn RunnerAdapter>,
    events: Arc<dyn DomainEventSink>,
    readiness: Arc<dyn ReadinessProbe>,
    adapter_label: &'static str,
    execution_seq: Arc<AtomicU64>,
}

impl AppState {
    /// Builds server state from a runner adapter, event sink, and
    /// readiness probe.
    #[must_use]
    pub fn new(
        adapter: Arc<dyn RunnerAdapter>,
        events: Arc<dyn DomainEventSink>,
        readiness: Arc<dyn ReadinessProbe>,
        adapter_label: &'static str,
    ) -> Self {
        Self {
            adapter,
            events,
            readiness,
            adapter_label,
            execution_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_execution_id(&self, request: &ExecutionRequest) -> String {
        let seq = self.execution_seq.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        let digest = flowctl_core::checksum(&(
            request.tenant_context.tenant_id.as_str(),
            request.module_execution_context.module_id.as_str(),
            request.requested_action.kind_label(),
            seq,
            nanos,
        ))
        .unwrap_or_else(|_| format!("fallback-{seq}"));
        format!("exec-{}", &digest[..16])
    }
}

/// Builds the router serving spec.md §6's two endpoints.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/execute", post(execute))
        .route("/health", get(health))
        .with_state(state)
}

/// `POST /execute`: decodes an [`ExecutionRequest`], dispatches it to the
/// adapter entry point matching its action kind, and returns the
/// [`ExecutionResult`] verbatim. Axum's `Json` extractor already turns a
/// malformed body or a request missing `tenant_context`/
/// `module_execution_context` into `400 Bad Request` before this handler
/// runs; a request that parses but fails boundary admission still reaches
/// here and comes back `200` with `success: false`, per
/// [`flowctl_runner::RunnerAdapter`]'s contract that nothing past the
/// boundary ever raises.
///
/// [`RunnerAdapter`] is a synchronous trait (the remote adapter calls out
/// with a blocking HTTP client), so dispatch runs on a blocking-pool thread
/// rather than inline on the async executor.
///
/// # Panics
///
/// Panics if the blocking task dispatching to the adapter is cancelled or
/// panics itself, which can only happen if the adapter implementation panics.
#[allow(clippy::expect_used, reason = "propagates a blocking-task panic rather than masking it as a failed execution")]
async fn execute(State(state): State<AppState>, Json(request): Json<ExecutionRequest>) -> Json<ExecutionResult> {
    let execution_id = state.next_execution_id(&request);
    let result = tokio::task::spawn_blocking(move || dispatch(&state, &execution_id, &request))
        .await
        .expect("adapter dispatch task panicked");
    Json(result)
}

fn dispatch(state: &AppState, execution_id: &str, request: &ExecutionRequest) -> ExecutionResult {
    match &request.requested_action {
        RequestedAction::WorkflowStep { .. } => state.adapter.execute_workflow_step(execution_id, request, state.events.as_ref()),
        RequestedAction::AgentTask { .. } => state.adapter.execute_task(execution_id, request, state.events.as_ref()),
        RequestedAction::AgentAction { .. } | RequestedAction::WorkspaceStart { .. } | RequestedAction::WorkspaceStop { .. } | RequestedAction::SkillInvoke { .. } => {
            state.adapter.execute_agent_action(execution_id, request, state.events.as_ref())
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
struct HealthResponse {
    /// `"ok"` when the storage facade is reachable, `"degraded"` otherwise.
    status: &'static str,
    /// The resolved runner adapter kind (`"local"` or `"remote"`).
    adapter: &'static str,
}

/// `GET /health`: reports the resolved adapter kind and storage readiness.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.readiness.is_ready() { "ok" } else { "degraded" };
    Json(HealthResponse {
        status,
        adapter: state.adapter_label,
    })
}

// crates/flowctl-runner/src/remote.rs
// ============================================================================
// Module: Remote Runner Adapter
// Description: Dispatches admitted ExecutionRequests over HTTP to a
// configured runner URL (C4).
// Purpose: Let the runner boundary live in a separate process without the
// workflow engine or control plane knowing the difference.
// Dependencies: flowctl-boundary, flowctl-core, flowctl-audit,
// flowctl-providers, reqwest
// ============================================================================

//! ## Overview
//! The remote adapter still runs the boundary-validate / `execution_started`
//! / dispatch / `execution_completed`-or-`execution_failed` flow locally;
//! only the dispatch step differs, POSTing the request JSON instead of
//! calling an in-process handler. A timeout, connection failure, or
//! malformed response body all become a failure [`ExecutionResult`]; nothing
//! here ever panics or propagates an error past the adapter boundary. These
//! methods block the calling thread (the underlying client is
//! `reqwest::blocking`); callers on the async control plane run them via
//! `tokio::task::spawn_blocking`.

use reqwest::blocking::Client;
use thiserror::Error;

use flowctl_audit::DomainEvent;
use flowctl_audit::DomainEventSink;
use flowctl_core::execution::ExecutionRequest;
use flowctl_core::execution::ExecutionResult;
use flowctl_providers::build_http_client;
use flowctl_providers::HttpClientConfig;
use flowctl_providers::HttpClientError;

use crate::adapter::RunnerAdapter;

/// Error constructing a [`RemoteAdapter`].
#[derive(Debug, Error)]
#[error("failed to build remote runner adapter: {0}")]
pub struct RemoteAdapterError(#[from] HttpClientError);

/// HTTP-dispatching runner adapter.
pub struct RemoteAdapter {
    client: Client,
    runner_url: String,
}

impl RemoteAdapter {
    /// Builds a remote adapter targeting `runner_url`, with requests timing
    /// out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteAdapterError`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(runner_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, RemoteAdapterError> {
        let client = build_http_client(&HttpClientConfig {
            timeout,
            user_agent: "flowctl-runner/0.1".to_string(),
        })?;
        Ok(Self {
            client,
            runner_url: runner_url.into(),
        })
    }
}

impl RunnerAdapter for RemoteAdapter {
    fn execute_workflow_step(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &dyn DomainEventSink,
    ) -> ExecutionResult {
        dispatch_remote(self, execution_id, request, events)
    }

    fn execute_task(&self, execution_id: &str, request: &ExecutionRequest, events: &dyn DomainEventSink) -> ExecutionResult {
        dispatch_remote(self, execution_id, request, events)
    }

    fn execute_agent_action(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &dyn DomainEventSink,
    ) -> ExecutionResult {
        dispatch_remote(self, execution_id, request, events)
    }
}

/// Shared per-call flow: boundary-validate, emit `execution_started`, POST
/// the request, emit `execution_completed`/`execution_failed`.
fn dispatch_remote(
    adapter: &RemoteAdapter,
    execution_id: &str,
    request: &ExecutionRequest,
    events: &dyn DomainEventSink,
) -> ExecutionResult {
    if let Err(err) = flowctl_boundary::admit(request) {
        return ExecutionResult::failure(err.code(), vec![format!("boundary rejected execution {execution_id}: {err}")]);
    }

    events.emit(DomainEvent::ExecutionStarted {
        entity_id: execution_id.to_string(),
    });

    let result = post_execution(adapter, request);

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

/// POSTs `request` to the configured runner URL and decodes the response as
/// an [`ExecutionResult`]. Every failure mode (timeout, connection refusal,
/// a non-2xx status, or a body that does not parse as JSON) becomes a
/// failure result rather than a raised error.
fn post_execution(adapter: &RemoteAdapter, request: &ExecutionRequest) -> ExecutionResult {
    let response = match adapter.client.post(&adapter.runner_url).json(request).send() {
        Ok(response) => response,
        Err(err) if err.is_timeout() => {
            return ExecutionResult::failure("RUNNER_TIMEOUT", vec![format!("remote runner timed out: {err}")]);
        }
        Err(err) => {
            return ExecutionResult::failure("RUNNER_UNREACHABLE", vec![format!("remote runner call failed: {err}")]);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        return ExecutionResult::failure("RUNNER_NON_SUCCESS_STATUS", vec![format!("remote runner returned status {status}")]);
    }

    match response.json::<ExecutionResult>() {
        Ok(result) => result,
        Err(err) => ExecutionResult::failure("RUNNER_MALFORMED_RESPONSE", vec![format!("remote runner response was not a valid ExecutionResult: {err}")]),
    }
}

// crates/flowctl-intent/src/lib.rs
// ============================================================================
// Module: Flowctl Intent Library
// Description: Durable, idempotency-keyed workflow execution intents and the
// dispatch loop that drains them into real workflow executions.
// Purpose: Make a `WorkflowExecutionIntent` row the sole precondition for
// starting a workflow execution, so retries, re-deliveries, and
// crash-recovery never start the same execution twice.
// Dependencies: flowctl-core, flowctl-workflow, serde, serde_json, thiserror,
// tokio
// ============================================================================

//! ## Overview
//! `flowctl-intent` sits between a trigger (manual call, record event,
//! schedule, webhook) and the workflow engine in `flowctl-workflow`. A
//! trigger never calls [`flowctl_workflow::execute_workflow`] directly; it
//! calls [`dispatch::create_execution_intent`], which persists a
//! [`row::WorkflowExecutionIntent`] keyed by an idempotency key. A separate
//! drain ([`dispatch::dispatch_once`], run on an interval by
//! [`dispatch::run_dispatch_loop`]) resolves each pending intent's module
//! context, starts the workflow execution, and records the outcome back onto
//! the intent row (spec.md §4.6).

pub mod dispatch;
pub mod error;
pub mod row;
pub mod store;

pub use dispatch::create_execution_intent;
pub use dispatch::dispatch_once;
pub use dispatch::run_dispatch_loop;
pub use dispatch::DispatchSummary;
pub use dispatch::IntentOutcome;
pub use error::IntentError;
pub use row::IntentStatus;
pub use row::WorkflowExecutionIntent;
pub use store::IntentStore;
pub use store::IntentStoreError;

// crates/flowctl-cli/src/main.rs
// ============================================================================
// Module: Flowctl Composition Root
// Description: Resolves config, opens the sqlite store, builds the runner
// adapter and event sink, and runs the HTTP surface and intent dispatch
// loop concurrently until a shutdown signal arrives.
// Purpose: Own every collaborator instance explicitly instead of relying
// on module-level singletons (spec.md "Global singletons in the source").
// Dependencies: clap, flowctl-audit, flowctl-config, flowctl-core,
// flowctl-intent, flowctl-runner, flowctl-server, flowctl-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! This binary is the single explicitly-constructed service root the
//! platform's runner, workflow, and intent crates are built to be driven
//! by: no crate downstream of this one reads an environment variable,
//! opens a socket, or touches the wall clock on its own.

mod readiness;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Parser;
use thiserror::Error;

use flowctl_audit::ChannelEventSink;
use flowctl_audit::DomainEventSink;
use flowctl_config::ConfigError;
use flowctl_config::RunnerAdapterKind;
use flowctl_config::RunnerConfig;
use flowctl_core::ContextSource;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowExecutionId;
use flowctl_intent::dispatch_once;
use flowctl_intent::run_dispatch_loop;
use flowctl_intent::DispatchSummary;
use flowctl_intent::IntentError;
use flowctl_runner::LocalAdapter;
use flowctl_runner::RemoteAdapter;
use flowctl_runner::RemoteAdapterError;
use flowctl_runner::RunnerAdapter;
use flowctl_server::AppState;
use flowctl_server::Server;
use flowctl_server::ServerError;
use flowctl_store_sqlite::SqliteStore;
use flowctl_store_sqlite::SqliteStoreError;

use readiness::SqliteReadiness;

/// Composition-root arguments.
#[derive(Parser, Debug)]
#[command(name = "flowctl")]
struct Cli {
    /// Path to the sqlite database file. Defaults to an in-memory,
    /// non-persisted store.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

/// Top-level composition-root failure.
#[derive(Debug, Error)]
enum CliError {
    /// An environment variable failed to parse.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Opening or migrating the sqlite store failed.
    #[error(transparent)]
    Store(#[from] SqliteStoreError),
    /// Constructing the remote runner adapter's HTTP client failed.
    #[error(transparent)]
    Adapter(#[from] RemoteAdapterError),
    /// Binding or serving the HTTP surface failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = write_stderr_line(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let runner_config = RunnerConfig::from_env()?;

    let store = Arc::new(match &cli.db {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_in_memory()?,
    });

    let (event_sink, event_receiver) = ChannelEventSink::new(1024);
    let events: Arc<dyn DomainEventSink> = Arc::new(event_sink);
    drop(tokio::task::spawn_blocking(move || {
        while let Ok(event) = event_receiver.recv() {
            let line = match event.error() {
                Some(error) => format!("{} entity={} error={error}", event.event_type(), event.entity_id()),
                None => format!("{} entity={}", event.event_type(), event.entity_id()),
            };
            let _ = write_stdout_line(&line);
        }
    }));

    let (adapter, adapter_label): (Arc<dyn RunnerAdapter>, &'static str) = match runner_config.adapter {
        RunnerAdapterKind::Local => (Arc::new(LocalAdapter::new()), "local"),
        RunnerAdapterKind::Remote => (
            Arc::new(RemoteAdapter::new(runner_config.runner_url.clone(), runner_config.timeout)?),
            "remote",
        ),
    };

    let readiness = Arc::new(SqliteReadiness::new(Arc::clone(&store)));
    let state = AppState::new(adapter, Arc::clone(&events), readiness, adapter_label);
    let addr = SocketAddr::from(([0, 0, 0, 0], runner_config.runner_port));
    let server = Server::bind(addr, state).await?;
    let _ = write_stdout_line(&format!("listening on {}", server.local_addr()));

    let dispatch_store = Arc::clone(&store);
    let dispatch_loop = run_dispatch_loop(Duration::from_secs(5), move || drain_all_tenants(&dispatch_store), |result| {
        if let Err(err) = result {
            let _ = write_stderr_line(&format!("dispatch tick failed: {err}"));
        }
    });

    tokio::select! {
        result = server.serve() => result?,
        () = dispatch_loop => {}
    }

    Ok(())
}

/// Drains every tenant's pending intents once, aggregating outcomes into a
/// single summary for the tick.
fn drain_all_tenants(store: &SqliteStore) -> Result<DispatchSummary, IntentError> {
    let tenant_ids = store.list_tenant_ids().map_err(|err| IntentError::Store(err.to_string()))?;
    let now = current_timestamp();
    let mut outcomes = Vec::new();
    for tenant_id in tenant_ids {
        let tenant = TenantContext::new(tenant_id, None, None, ContextSource::Internal);
        let summary = dispatch_once(store, store, &tenant, |id| WorkflowExecutionId::new(format!("exec-{}", id.as_str())), now)?;
        outcomes.extend(summary.outcomes);
    }
    Ok(DispatchSummary { outcomes })
}

fn current_timestamp() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    Timestamp::from_unix_millis(millis)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

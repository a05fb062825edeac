// crates/flowctl-install/src/multi.rs
// ============================================================================
// Module: Multi-Package Install Orchestration
// Description: Installs several packages into one project in `dependsOn`
// order, aborting after the first failing package.
// Purpose: Implement spec.md §4.8 "Multi-package orchestration" without
// requiring callers to pre-sort their package list.
// Dependencies: flowctl-core, flowctl-graph, flowctl-audit, crate::pipeline
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use flowctl_audit::DomainEventSink;
use flowctl_core::ProjectId;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::UserId;
use flowctl_graph::GraphPackage;
use flowctl_graph::GraphStore;

use crate::error::InstallError;
use crate::pipeline::install_graph_package;
use crate::pipeline::InstallOptions;
use crate::pipeline::InstallReport;
use crate::store::InstallStore;

/// One package's outcome within a multi-package install run.
#[derive(Debug, Clone)]
pub struct PackageInstallOutcome {
    /// Key of the package this outcome describes.
    pub package_key: String,
    /// The pipeline's report for this package.
    pub report: InstallReport,
}

/// The outcome of an `installGraphPackages` call.
#[derive(Debug, Clone, Default)]
pub struct MultiInstallReport {
    /// Per-package outcomes, in application order, up to and including the
    /// first unsuccessful one.
    pub outcomes: Vec<PackageInstallOutcome>,
    /// True if installation stopped before every package was attempted
    /// because an earlier package failed or was rejected.
    pub stopped_early: bool,
}

/// A dependency on an unlisted or cyclic package was found while ordering
/// `packages` by `dependsOn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOrderError {
    /// The package key at which ordering failed.
    pub package_key: String,
    /// Human-readable cause: missing dependency or cycle.
    pub reason: String,
}

/// Installs `packages` into `project_id` in `dependsOn` order, calling
/// [`install_graph_package`] once per package and stopping at the first
/// package whose report is not successful (spec.md §4.8 "Multi-package
/// orchestration"). `install_id_for` is called once per attempted package to
/// mint that package's audit row id.
///
/// # Errors
///
/// Returns [`InstallError`] if a storage read/write aborts a package's
/// pipeline outright, or a [`DependencyOrderError`] wrapped as
/// [`InstallError::Store`] if `packages` cannot be topologically ordered.
pub fn install_graph_packages(
    graph_store: &dyn GraphStore,
    install_store: &dyn InstallStore,
    events: &dyn DomainEventSink,
    tenant: &TenantContext,
    project_id: &ProjectId,
    packages: &[GraphPackage],
    opts: InstallOptions,
    installed_by: Option<UserId>,
    now: Timestamp,
    mut install_id_for: impl FnMut(&str) -> String,
) -> Result<MultiInstallReport, InstallError> {
    let ordered = order_by_dependencies(packages).map_err(|err| InstallError::Store(format!("{}: {}", err.package_key, err.reason)))?;

    let mut outcomes = Vec::with_capacity(ordered.len());
    let mut stopped_early = false;

    for pkg in ordered {
        let install_id = install_id_for(&pkg.package_key);
        let report = install_graph_package(graph_store, install_store, events, tenant, project_id, pkg, opts, installed_by.clone(), install_id, now)?;
        let succeeded = report.success;
        outcomes.push(PackageInstallOutcome {
            package_key: pkg.package_key.clone(),
            report,
        });
        if !succeeded {
            stopped_early = true;
            break;
        }
    }

    Ok(MultiInstallReport { outcomes, stopped_early })
}

/// Orders `packages` so that every package appears after all packages it
/// declares in `dependsOn` (restricted to keys present in `packages`; a
/// dependency on a package installed in a prior, separate call is not an
/// ordering constraint here).
fn order_by_dependencies(packages: &[GraphPackage]) -> Result<Vec<&GraphPackage>, DependencyOrderError> {
    let by_key: HashMap<&str, &GraphPackage> = packages.iter().map(|p| (p.package_key.as_str(), p)).collect();

    let mut ordered = Vec::with_capacity(packages.len());
    let mut visited: HashSet<&str> = HashSet::new();
    let mut in_progress: HashSet<&str> = HashSet::new();

    for pkg in packages {
        visit(pkg, &by_key, &mut visited, &mut in_progress, &mut ordered)?;
    }
    Ok(ordered)
}

fn visit<'a>(
    pkg: &'a GraphPackage,
    by_key: &HashMap<&'a str, &'a GraphPackage>,
    visited: &mut HashSet<&'a str>,
    in_progress: &mut HashSet<&'a str>,
    ordered: &mut Vec<&'a GraphPackage>,
) -> Result<(), DependencyOrderError> {
    let key = pkg.package_key.as_str();
    if visited.contains(key) {
        return Ok(());
    }
    if in_progress.contains(key) {
        return Err(DependencyOrderError {
            package_key: pkg.package_key.clone(),
            reason: "dependency cycle".to_string(),
        });
    }
    in_progress.insert(key);

    for dep in &pkg.depends_on {
        if let Some(dep_pkg) = by_key.get(dep.package_key.as_str()) {
            visit(dep_pkg, by_key, visited, in_progress, ordered)?;
        }
    }

    in_progress.remove(key);
    visited.insert(key);
    ordered.push(pkg);
    Ok(())
}

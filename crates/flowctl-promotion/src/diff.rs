// crates/flowctl-promotion/src/diff.rs
// ============================================================================
// Module: Environment Diff
// Description: Compares two environments' currently-installed package sets.
// Purpose: Give `preview` the delta it attaches to a promotion intent, and
// `execute` the per-package install/skip decision (spec.md §4.9).
// Dependencies: crate::row
// ============================================================================

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::row::EnvironmentPackageInstall;

/// One package's promotion disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDelta {
    /// Key of the package.
    pub package_key: String,
    /// Version currently installed in the source environment.
    pub from_version: String,
    /// Version currently installed in the target environment, if any.
    pub to_version: Option<String>,
}

/// The structural difference between a source and target environment's
/// package sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionDiff {
    /// Packages that differ (absent, or a different checksum) in the
    /// target and will be installed by `execute`.
    pub to_install: Vec<PackageDelta>,
    /// Package keys already current (same checksum) in the target and
    /// will be skipped by `execute`.
    pub up_to_date: Vec<String>,
}

/// Computes the diff from `source`'s package set to `target`'s
/// (spec.md §4.9 `diffEnvironments`). A package is `up_to_date` when the
/// target holds an install with the same checksum; otherwise it is queued
/// in `to_install`, whether the target lacks it entirely or holds a
/// different version.
#[must_use]
pub fn diff_environments(source: &[EnvironmentPackageInstall], target: &[EnvironmentPackageInstall]) -> PromotionDiff {
    let target_by_key: HashMap<&str, &EnvironmentPackageInstall> = target.iter().map(|install| (install.package_key.as_str(), install)).collect();

    let mut to_install = Vec::new();
    let mut up_to_date = Vec::new();

    for install in source {
        match target_by_key.get(install.package_key.as_str()) {
            Some(target_install) if target_install.checksum == install.checksum => {
                up_to_date.push(install.package_key.clone());
            }
            Some(target_install) => to_install.push(PackageDelta {
                package_key: install.package_key.clone(),
                from_version: install.version.clone(),
                to_version: Some(target_install.version.clone()),
            }),
            None => to_install.push(PackageDelta {
                package_key: install.package_key.clone(),
                from_version: install.version.clone(),
                to_version: None,
            }),
        }
    }

    to_install.sort_by(|a, b| a.package_key.cmp(&b.package_key));
    up_to_date.sort();

    PromotionDiff { to_install, up_to_date }
}

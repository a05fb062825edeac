// crates/flowctl-install/src/ownership.rs
// ============================================================================
// Module: Package Ownership Scan
// Description: Determines, from prior install rows, which package owns a
// record type key or a binding target.
// Purpose: Implement spec.md §4.8 step 4's ownership check by scanning
// `packageContents` rather than maintaining a separate ownership index.
// Dependencies: flowctl-core, flowctl-graph, crate::row
// ============================================================================

use flowctl_core::RecordTypeKey;

use crate::row::GraphPackageInstall;

/// Returns the package key that first declared `record_type_key`, by
/// scanning every prior install row's `packageContents` for this project
/// (spec.md §4.8 step 4).
#[must_use]
pub fn owning_package_for_record_type<'a>(installs: &'a [GraphPackageInstall], record_type_key: &RecordTypeKey) -> Option<&'a str> {
    installs
        .iter()
        .find(|install| install.package_contents.record_types.iter().any(|rt| &rt.key == record_type_key))
        .map(|install| install.package_key.as_str())
}

/// Returns the package key that declared an SLA or assignment-rule binding
/// on `record_type_key`, if any prior install declared one.
#[must_use]
pub fn owning_package_for_binding<'a>(installs: &'a [GraphPackageInstall], record_type_key: &RecordTypeKey) -> Option<&'a str> {
    installs
        .iter()
        .find(|install| {
            install.package_contents.sla_policies.iter().any(|sla| &sla.record_type_key == record_type_key)
                || install
                    .package_contents
                    .assignment_rules
                    .iter()
                    .any(|rule| &rule.record_type_key == record_type_key)
        })
        .map(|install| install.package_key.as_str())
}

// crates/flowctl-graph/src/package.rs
// ============================================================================
// Module: Graph Package
// Description: The declarative, versioned bundle of record types and
// bindings an install targets onto a tenant's graph.
// Purpose: Give the install engine and the diff/projection logic one
// strongly-typed package shape instead of an open package JSON map.
// Dependencies: flowctl-core, flowctl-workflow, serde, serde_json
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use flowctl_core::RecordTypeKey;
use flowctl_workflow::types::StepConfig;
use flowctl_workflow::types::TriggerType;

use crate::semver::PackageVersion;

/// A dependency on another package, referenced by key only (version
/// constraints are not modelled; topological order is by key presence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependency {
    /// Key of the depended-on package.
    pub package_key: String,
}

/// One field declaration within a package record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageField {
    /// Field name, unique within its record type.
    pub name: String,
    /// Field type name (`string`, `number`, `boolean`, `reference`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the field is required. Defaults to `false` when absent on
    /// the wire, matching spec.md §4.8 step 7's `required=false` default
    /// for newly created record types.
    #[serde(default)]
    pub required: bool,
}

/// One record type declared by a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecordType {
    /// Globally-unique-within-project key.
    pub key: RecordTypeKey,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Optional base type this type inherits from.
    pub base_type: Option<RecordTypeKey>,
    /// Declared fields.
    pub fields: Vec<PackageField>,
}

/// An SLA policy binding declared by a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSlaPolicy {
    /// Record type the SLA applies to.
    pub record_type_key: RecordTypeKey,
    /// SLA duration in minutes.
    pub duration_minutes: u32,
}

/// How an assignment rule picks an assignee. The discriminant name doubles
/// as the `strategyType` half of `diffGraphSnapshots`'s
/// `assignmentsAdded: "rtKey:strategyType"` encoding (spec.md §4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategyType", rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// Assign to users in rotation.
    RoundRobin,
    /// Assign to the least-loaded eligible user.
    LoadBalanced,
    /// Assign to a fixed user or group.
    Fixed {
        /// Target user or group identifier.
        target: String,
    },
}

impl AssignmentStrategy {
    /// Returns the wire-stable strategy type name used in diff encodings.
    #[must_use]
    pub const fn strategy_type(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::LoadBalanced => "load_balanced",
            Self::Fixed { .. } => "fixed",
        }
    }
}

/// An assignment rule binding declared by a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageAssignmentRule {
    /// Record type the rule applies to.
    pub record_type_key: RecordTypeKey,
    /// The resolution strategy.
    pub strategy: AssignmentStrategy,
}

/// One step within a package-declared workflow, reusing the engine's own
/// tagged step configuration rather than a parallel shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageWorkflowStep {
    /// Dense, zero-based position among the workflow's steps.
    pub order_index: i64,
    /// Step-type-specific configuration.
    pub config: StepConfig,
}

/// A workflow declared by a package, installed as a new
/// [`flowctl_workflow::types::WorkflowDefinition`] the first time a workflow
/// with this name is seen for the tenant (spec.md §4.8 step 8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageWorkflow {
    /// Workflow name; existence of an active definition with this name is
    /// the skip/create signal on reinstall.
    pub name: String,
    /// How executions of this workflow are started.
    pub trigger_type: TriggerType,
    /// Trigger-specific configuration.
    #[serde(default)]
    pub trigger_config: Value,
    /// Steps in declared order.
    pub steps: Vec<PackageWorkflowStep>,
}

/// A declarative, versioned bundle of record types and bindings installable
/// onto a tenant's graph (spec.md §3 `GraphPackage`, in-memory only).
///
/// # Invariants
/// - Never persisted directly; the install engine's audit row carries its
///   full serialized contents instead (spec.md §3 `GraphPackageInstall`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPackage {
    /// Stable key identifying this package across versions.
    pub package_key: String,
    /// Declared version.
    pub version: PackageVersion,
    /// Other packages this one depends on, by key.
    #[serde(default)]
    pub depends_on: Vec<PackageDependency>,
    /// Declared record types.
    #[serde(default)]
    pub record_types: Vec<PackageRecordType>,
    /// Declared SLA policies.
    #[serde(default)]
    pub sla_policies: Vec<PackageSlaPolicy>,
    /// Declared assignment rules.
    #[serde(default)]
    pub assignment_rules: Vec<PackageAssignmentRule>,
    /// Declared workflows.
    #[serde(default)]
    pub workflows: Vec<PackageWorkflow>,
}

#[cfg(test)]
mod tests {
    use super::AssignmentStrategy;

    #[test]
    fn strategy_type_names_are_stable() {
        assert_eq!(AssignmentStrategy::RoundRobin.strategy_type(), "round_robin");
        assert_eq!(
            AssignmentStrategy::Fixed {
                target: "team-a".to_string()
            }
            .strategy_type(),
            "fixed"
        );
    }
}

// crates/flowctl-graph/src/lib.rs
// ============================================================================
// Module: Flowctl Graph Library
// Description: Builds tenant/project graph snapshots, diffs them, and
// projects packages onto them without mutating storage (C7).
// Purpose: Give the install engine and promotion pipeline a shared,
// storage-agnostic view of a tenant's schema graph.
// Dependencies: flowctl-core, flowctl-workflow, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `flowctl-graph` owns three things: the [`package::GraphPackage`] shape a
//! package author writes, the [`snapshot::GraphSnapshot`] view of a tenant's
//! current graph, and the pure functions that relate them,
//! [`diff::diff_graph_snapshots`] and
//! [`projection::project_package_onto_snapshot`]. Nothing here performs
//! storage writes; the install engine (`flowctl-install`) is the only
//! caller that turns a projection into mutations.

pub mod diff;
pub mod package;
pub mod projection;
pub mod semver;
pub mod snapshot;
pub mod store;
pub mod validation;

pub use diff::diff_graph_snapshots;
pub use diff::BindingChanges;
pub use diff::FieldModification;
pub use diff::GraphDiff;
pub use diff::RecordTypeModification;
pub use package::AssignmentStrategy;
pub use package::GraphPackage;
pub use package::PackageAssignmentRule;
pub use package::PackageDependency;
pub use package::PackageField;
pub use package::PackageRecordType;
pub use package::PackageSlaPolicy;
pub use package::PackageWorkflow;
pub use package::PackageWorkflowStep;
pub use projection::project_package_onto_snapshot;
pub use semver::PackageVersion;
pub use semver::PackageVersionError;
pub use snapshot::derive_edges;
pub use snapshot::ChangePolicyBinding;
pub use snapshot::EdgeKind;
pub use snapshot::FieldNode;
pub use snapshot::GraphBindings;
pub use snapshot::GraphEdge;
pub use snapshot::GraphSnapshot;
pub use snapshot::RecordTypeNode;
pub use snapshot::WorkflowBinding;
pub use store::build_graph_snapshot;
pub use store::GraphStore;
pub use store::GraphStoreError;
pub use validation::validate_snapshot;
pub use validation::GraphValidationError;

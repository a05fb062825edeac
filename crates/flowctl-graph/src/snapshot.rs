// crates/flowctl-graph/src/snapshot.rs
// ============================================================================
// Module: Graph Snapshot
// Description: An in-memory projection of a tenant's (or project's) schema
// graph and its bindings at a point in time.
// Purpose: Give the install engine and promotion pipeline one composable
// view to diff and project packages onto, instead of querying storage ad
// hoc from every consumer.
// Dependencies: flowctl-core, crate::package, serde
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use flowctl_core::ProjectId;
use flowctl_core::RecordTypeKey;
use flowctl_core::TenantId;
use flowctl_core::Timestamp;

use crate::package::PackageAssignmentRule;
use crate::package::PackageField;
use crate::package::PackageSlaPolicy;

/// One field on a record type node.
pub type FieldNode = PackageField;

/// A record type as it exists in the tenant's graph right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTypeNode {
    /// Compound-identity key: unique as `(project_id, key)` at rest
    /// (spec.md §9 "Graph identity").
    pub key: RecordTypeKey,
    /// Project this record type belongs to.
    pub project_id: ProjectId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Optional base type this type inherits from.
    pub base_type: Option<RecordTypeKey>,
    /// Current field set.
    pub fields: Vec<FieldNode>,
}

/// The kind of relationship a [`GraphEdge`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `to` is the `from` record type's base type.
    Inheritance,
    /// `from` holds a `reference`-typed field pointing at `to`.
    Reference,
}

/// A directed edge between two record type nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Edge kind.
    pub kind: EdgeKind,
    /// Source record type key.
    pub from: RecordTypeKey,
    /// Target record type key.
    pub to: RecordTypeKey,
}

/// A workflow binding, keyed by name (spec.md §4.8 step 8's skip/create
/// signal) and the record type it is scoped to, when applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowBinding {
    /// Workflow name.
    pub name: String,
}

/// An SLA binding on a record type.
pub type SlaBinding = PackageSlaPolicy;

/// An assignment rule binding on a record type.
pub type AssignmentBinding = PackageAssignmentRule;

/// A change-policy binding (governs which packages may mutate a record
/// type without `allowForeignTypeMutation`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePolicyBinding {
    /// Record type the policy covers.
    pub record_type_key: RecordTypeKey,
    /// Key of the package that owns this record type.
    pub owning_package_key: String,
}

/// Every binding kind the graph tracks alongside record types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphBindings {
    /// Installed workflows.
    pub workflows: Vec<WorkflowBinding>,
    /// SLA policies.
    pub slas: Vec<SlaBinding>,
    /// Assignment rules.
    pub assignments: Vec<AssignmentBinding>,
    /// Change (ownership) policies.
    pub change_policies: Vec<ChangePolicyBinding>,
}

impl GraphBindings {
    /// Restricts every binding kind to ones whose `record_type_key` (or, for
    /// workflows, always-included since workflows are not record-type
    /// scoped) falls within `in_project`.
    #[must_use]
    pub fn filter_to_types(&self, in_project: &HashSet<RecordTypeKey>) -> Self {
        Self {
            workflows: self.workflows.clone(),
            slas: self
                .slas
                .iter()
                .filter(|b| in_project.contains(&b.record_type_key))
                .cloned()
                .collect(),
            assignments: self
                .assignments
                .iter()
                .filter(|b| in_project.contains(&b.record_type_key))
                .cloned()
                .collect(),
            change_policies: self
                .change_policies
                .iter()
                .filter(|b| in_project.contains(&b.record_type_key))
                .cloned()
                .collect(),
        }
    }
}

/// A point-in-time view of a tenant's (or project's) schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Tenant this snapshot was built for.
    pub tenant_id: TenantId,
    /// When this snapshot was composed.
    pub built_at: Timestamp,
    /// Record type nodes.
    pub record_types: Vec<RecordTypeNode>,
    /// Derived inheritance and reference edges.
    pub edges: Vec<GraphEdge>,
    /// Workflow/SLA/assignment/change-policy bindings.
    pub bindings: GraphBindings,
}

impl GraphSnapshot {
    /// Looks up a record type node by key.
    #[must_use]
    pub fn find_record_type(&self, key: &RecordTypeKey) -> Option<&RecordTypeNode> {
        self.record_types.iter().find(|rt| &rt.key == key)
    }

    /// Returns the project-scoped view of this snapshot: record types
    /// belonging to `project_id`, edges touching at least one in-project
    /// node, and bindings scoped to in-project types (spec.md §4.7
    /// `getProjectGraphSnapshot`).
    #[must_use]
    pub fn project_view(&self, project_id: &ProjectId) -> Self {
        let in_project: HashSet<RecordTypeKey> = self
            .record_types
            .iter()
            .filter(|rt| &rt.project_id == project_id)
            .map(|rt| rt.key.clone())
            .collect();

        let record_types = self
            .record_types
            .iter()
            .filter(|rt| in_project.contains(&rt.key))
            .cloned()
            .collect();

        let edges = self
            .edges
            .iter()
            .filter(|edge| in_project.contains(&edge.from) || in_project.contains(&edge.to))
            .cloned()
            .collect();

        Self {
            tenant_id: self.tenant_id.clone(),
            built_at: self.built_at,
            record_types,
            edges,
            bindings: self.bindings.filter_to_types(&in_project),
        }
    }
}

/// Derives inheritance and reference edges from a record type node set.
/// Inheritance edges come from `base_type`; reference edges come from any
/// field whose `field_type` is `reference` and whose name matches a known
/// record type key (the convention the install engine's projection step
/// follows when resolving reference field targets).
#[must_use]
pub fn derive_edges(record_types: &[RecordTypeNode]) -> Vec<GraphEdge> {
    let known_keys: HashMap<&str, &RecordTypeKey> = record_types.iter().map(|rt| (rt.key.as_str(), &rt.key)).collect();
    let mut edges = Vec::new();
    for rt in record_types {
        if let Some(base) = &rt.base_type {
            edges.push(GraphEdge {
                kind: EdgeKind::Inheritance,
                from: rt.key.clone(),
                to: base.clone(),
            });
        }
        for field in &rt.fields {
            if field.field_type == "reference" {
                if let Some(target) = known_keys.get(field.name.as_str()) {
                    edges.push(GraphEdge {
                        kind: EdgeKind::Reference,
                        from: rt.key.clone(),
                        to: (*target).clone(),
                    });
                }
            }
        }
    }
    edges
}

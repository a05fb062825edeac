// crates/flowctl-install/src/topo.rs
// ============================================================================
// Module: Record Type Topological Order
// Description: Orders a package's own record types by `baseType` so a base
// type is always created before any type that derives from it.
// Purpose: Satisfy spec.md §4.8 step 7's creation-order requirement without
// assuming declaration order already respects inheritance.
// Dependencies: flowctl-core, flowctl-graph
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use flowctl_core::RecordTypeKey;
use flowctl_graph::PackageRecordType;

/// A dependency cycle was found among the package's own record types,
/// reported as the key first revisited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoError(pub RecordTypeKey);

/// Returns `record_types` ordered so that for any type whose `baseType` is
/// also declared in this same package, the base type appears first. A
/// `baseType` referencing a record type outside this package (already
/// installed by a prior package) is not a same-package dependency and does
/// not affect ordering.
///
/// # Errors
///
/// Returns [`TopoError`] if the package declares an inheritance cycle among
/// its own record types.
pub fn topo_order_record_types(record_types: &[PackageRecordType]) -> Result<Vec<&PackageRecordType>, TopoError> {
    let own_keys: HashSet<&RecordTypeKey> = record_types.iter().map(|rt| &rt.key).collect();
    let by_key: HashMap<&RecordTypeKey, &PackageRecordType> = record_types.iter().map(|rt| (&rt.key, rt)).collect();

    let mut ordered = Vec::with_capacity(record_types.len());
    let mut visited: HashSet<&RecordTypeKey> = HashSet::new();
    let mut in_progress: HashSet<&RecordTypeKey> = HashSet::new();

    for rt in record_types {
        visit(rt, &by_key, &own_keys, &mut visited, &mut in_progress, &mut ordered)?;
    }
    Ok(ordered)
}

fn visit<'a>(
    rt: &'a PackageRecordType,
    by_key: &HashMap<&'a RecordTypeKey, &'a PackageRecordType>,
    own_keys: &HashSet<&'a RecordTypeKey>,
    visited: &mut HashSet<&'a RecordTypeKey>,
    in_progress: &mut HashSet<&'a RecordTypeKey>,
    ordered: &mut Vec<&'a PackageRecordType>,
) -> Result<(), TopoError> {
    if visited.contains(&rt.key) {
        return Ok(());
    }
    if in_progress.contains(&rt.key) {
        return Err(TopoError(rt.key.clone()));
    }
    in_progress.insert(&rt.key);

    if let Some(base_key) = &rt.base_type {
        if own_keys.contains(base_key) {
            if let Some(base_rt) = by_key.get(base_key) {
                visit(base_rt, by_key, own_keys, visited, in_progress, ordered)?;
            }
        }
    }

    in_progress.remove(&rt.key);
    visited.insert(&rt.key);
    ordered.push(rt);
    Ok(())
}

//! Transition-target resolution.
//!
//! Targets are dot-separated paths with `*` wildcard segments. Lookup
//! order: absolute from the machine root when the first segment is the
//! machine's ID, then among the owner's siblings, then an ancestor walk
//! starting at the owner itself. Resolution never mutates the tree.

use crate::tree::{NodeId, Scope};

pub fn resolve_target(scope: &Scope, machine: NodeId, owner: NodeId, target: &str) -> Option<NodeId> {
    let segments: Vec<&str> = target.split('.').map(str::trim).collect();
    if segments.is_empty() || segments[0].is_empty() {
        return None;
    }

    // Absolute from the machine root.
    if segments[0] == scope.node(machine).id {
        return descend(scope, machine, &segments[1..]);
    }

    // Siblings of the transition's owner.
    if let Some(parent) = scope.node(owner).parent
        && let Some(found) = descend(scope, parent, &segments)
    {
        return Some(found);
    }

    // Ancestor walk. The owner is included so machine-level transitions
    // and own-child targets have somewhere to resolve from.
    let mut current = Some(owner);
    while let Some(node) = current {
        if let Some(found) = descend(scope, node, &segments) {
            return Some(found);
        }
        current = scope.node(node).parent;
    }

    None
}

/// Resolves `segments` as a descendant chain of `from`. A `*` segment
/// matches any single child; children are tried in document order and
/// the first full match wins.
fn descend(scope: &Scope, from: NodeId, segments: &[&str]) -> Option<NodeId> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(from);
    };
    for &child in &scope.node(from).states {
        if (*first == "*" || scope.node(child).id == *first)
            && let Some(found) = descend(scope, child, rest)
        {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
#[path = "../tests/t_resolve.rs"]
mod tests;

//! Dependency binding.
//!
//! For each declared slot of a node, the binder searches the pre-order
//! subtree of the node's scope root for compatible candidates (excluding the
//! node itself):
//!
//! - exactly one candidate is bound;
//! - several are disambiguated by the first whose name equals the slot's
//!   field identity (case-sensitive);
//! - otherwise a required slot fails with [`BindingError`] and an optional
//!   slot is left unset.

use arbor_types::NodeId;

use crate::{component::DependencySlot, error::BindingError, tree::Tree};

/// Compatible candidates for `declared`, as seen from `requester`.
pub fn candidates(tree: &Tree, requester: NodeId, declared: &str) -> Vec<NodeId> {
    tree.visible_from(requester)
        .into_iter()
        .filter(|&c| c != requester && tree.node(c).is_some_and(|n| n.satisfies(declared)))
        .collect()
}

/// Picks the node a slot should bind to, or `None` for an unresolved optional slot.
pub fn resolve_slot(
    tree: &Tree,
    owner: NodeId,
    slot: &DependencySlot,
) -> Result<Option<NodeId>, BindingError> {
    let found = candidates(tree, owner, slot.declared);
    let chosen = match found.as_slice() {
        [only] => Some(*only),
        _ => found
            .iter()
            .copied()
            .find(|&c| tree.name(c) == Some(slot.field)),
    };

    match chosen {
        Some(target) => Ok(Some(target)),
        None if slot.optional => Ok(None),
        None => Err(BindingError {
            owner_path: tree.full_path(owner),
            slot: slot.field.to_string(),
            declared: slot.declared.to_string(),
            candidates: found.len(),
        }),
    }
}

/// Fills every slot of a single node.
pub fn bind_node(tree: &mut Tree, id: NodeId) -> Result<(), BindingError> {
    let Some(node) = tree.node(id) else {
        return Ok(());
    };
    let slots = node.dependencies();
    for (position, slot) in slots.iter().enumerate() {
        let target = resolve_slot(tree, id, slot)?;
        if let Some(node) = tree.node_mut(id) {
            node.bindings[position] = target;
        }
    }
    Ok(())
}

/// Binds every node of the subtree in pre-order, stopping at the first error.
///
/// Returns the number of slots that ended up bound.
pub fn bind_subtree(tree: &mut Tree, root: NodeId) -> Result<usize, BindingError> {
    let mut bound = 0;
    for id in tree.subtree(root) {
        bind_node(tree, id)?;
        bound += tree
            .node(id)
            .map_or(0, |n| n.bindings.iter().filter(|b| b.is_some()).count());
    }
    tracing::debug!(root = %tree.full_path(root), bound, "bound subtree");
    Ok(bound)
}

/// Binds `id`, then lets every other node pick it up.
///
/// After the node's own slots are filled, a single pre-order sweep over the
/// rest of the tree resolves the slots that are still unset and whose
/// declared type the node satisfies. The sweep does not recurse into nodes
/// it binds along the way.
pub fn bind_with_back_references(tree: &mut Tree, id: NodeId) -> Result<(), BindingError> {
    bind_node(tree, id)?;
    let Some(node) = tree.node(id) else {
        return Ok(());
    };
    let (kind, provides) = (node.kind(), node.provides());
    let satisfied = |declared: &str| {
        declared == crate::component::ANY_KIND || declared == kind || provides.contains(&declared)
    };

    for other in tree.subtree(tree.root()) {
        if other == id {
            continue;
        }
        let Some(node) = tree.node(other) else {
            continue;
        };
        let slots = node.dependencies();
        for (position, slot) in slots.iter().enumerate() {
            let unset = tree.node(other).is_some_and(|n| n.bindings[position].is_none());
            if !unset || !satisfied(slot.declared) {
                continue;
            }
            let target = resolve_slot(tree, other, slot)?;
            if let Some(node) = tree.node_mut(other) {
                node.bindings[position] = target;
            }
        }
    }
    Ok(())
}

/// Resets every slot of a single node.
pub fn unbind_node(tree: &mut Tree, id: NodeId) {
    if let Some(node) = tree.node_mut(id) {
        node.bindings.fill(None);
    }
}

/// Resets every slot in the subtree. Idempotent.
pub fn unbind_subtree(tree: &mut Tree, root: NodeId) {
    for id in tree.subtree(root) {
        unbind_node(tree, id);
    }
}

/// Whether every slot in the subtree is unset.
pub fn is_unbound(tree: &Tree, root: NodeId) -> bool {
    tree.subtree(root)
        .into_iter()
        .filter_map(|id| tree.node(id))
        .all(|n| n.bindings.iter().all(Option::is_none))
}

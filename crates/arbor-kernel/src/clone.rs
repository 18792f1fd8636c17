//! Deep copies of subtrees.
//!
//! A copy carries names, kinds, hidden flags, attributes, component state
//! and child order. Bindings always start unset: they pointed into the
//! source tree and must be re-established by the binder.

use arbor_types::NodeId;

use crate::{error::TreeError, node::Node, tree::Tree};

impl Tree {
    /// Copies the subtree rooted at `id` into a new, independent tree.
    ///
    /// The copy's root has no parent regardless of where `id` sat.
    pub fn clone_subtree(&self, id: NodeId) -> Result<Tree, TreeError> {
        let mut copy = Tree::from_node(self.copy_node(id)?);
        let root = copy.root();
        for &child in self.children(id) {
            copy_into(self, child, &mut copy, root)?;
        }
        tracing::debug!(source = %self.full_path(id), nodes = copy.len(), "cloned subtree");
        Ok(copy)
    }

    /// Copies `source_id` from `source` and inserts it at `index` under `parent`.
    pub fn graft(
        &mut self,
        parent: NodeId,
        index: usize,
        source: &Tree,
        source_id: NodeId,
    ) -> Result<NodeId, TreeError> {
        let top = self.attach(parent, index, source.copy_node(source_id)?)?;
        for &child in source.children(source_id) {
            copy_into(source, child, self, top)?;
        }
        Ok(top)
    }

    fn copy_node(&self, id: NodeId) -> Result<Node, TreeError> {
        self.get(id)?
            .detached_copy()
            .ok_or_else(|| TreeError::ComponentInUse(self.full_path(id)))
    }
}

fn copy_into(source: &Tree, id: NodeId, dest: &mut Tree, parent: NodeId) -> Result<(), TreeError> {
    let index = dest.children(parent).len();
    let copied = dest.attach(parent, index, source.copy_node(id)?)?;
    for &child in source.children(id) {
        copy_into(source, child, dest, copied)?;
    }
    Ok(())
}

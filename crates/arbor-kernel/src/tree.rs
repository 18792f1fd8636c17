//! The component tree: an arena of [`Node`]s addressed by [`NodeId`].
//!
//! Children are owned through the `children` index list of their parent;
//! the `parent` field is a plain index and never keeps anything alive.
//! Removing a node frees its whole subtree and bumps the generation of
//! every freed slot, so handles held across the removal report
//! [`TreeError::StaleNode`] instead of aliasing a reused slot.
//!
//! Read-only queries (`children`, `subtree`, `full_path`, ...) treat a stale
//! handle as an empty node. Mutations return a [`TreeError`].

use arbor_types::{Attributes, NodeId, Value};

use crate::{component::Component, error::TreeError, node::Node};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A rooted, ordered tree of component nodes.
#[derive(Debug)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    len: usize,
}

impl Tree {
    /// Creates a tree holding a single root node.
    pub fn new(component: Box<dyn Component>, name: impl Into<String>) -> Self {
        Self::from_node(Node::new(component, name.into()))
    }

    pub(crate) fn from_node(node: Node) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
            len: 0,
        };
        tree.root = tree.allocate(node);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.node(id).ok_or(TreeError::StaleNode(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.node_mut(id).ok_or(TreeError::StaleNode(id))
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index())
            && slot.generation == id.generation()
            && slot.node.take().is_some()
        {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index() as u32);
            self.len -= 1;
        }
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Appends a new node as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        component: Box<dyn Component>,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let index = self.get(parent)?.children.len();
        self.attach(parent, index, Node::new(component, name.into()))
    }

    /// Inserts a new node at `index` among the children of `parent`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        component: Box<dyn Component>,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.attach(parent, index, Node::new(component, name.into()))
    }

    pub(crate) fn attach(
        &mut self,
        parent: NodeId,
        index: usize,
        mut node: Node,
    ) -> Result<NodeId, TreeError> {
        self.check_insert_index(parent, index)?;
        node.parent = Some(parent);
        let id = self.allocate(node);
        self.get_mut(parent)?.children.insert(index, id);
        Ok(id)
    }

    fn check_insert_index(&self, parent: NodeId, index: usize) -> Result<(), TreeError> {
        let len = self.get(parent)?.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds {
                parent: self.full_path(parent),
                index,
                len,
            });
        }
        Ok(())
    }

    /// Detaches `child` from `parent` and frees its whole subtree.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let position = self.child_position(parent, child)?;
        tracing::debug!(node = %self.full_path(child), "removing subtree");

        let doomed = self.subtree(child);
        self.get_mut(parent)?.children.remove(position);
        for id in doomed {
            self.release(id);
        }
        Ok(())
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        let children = &self.get(parent)?.children;
        children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| TreeError::NotAChild {
                parent: self.full_path(parent),
                child,
            })
    }

    /// Reparents `id` under `new_parent` at `index`.
    ///
    /// The index is interpreted after `id` has been detached, so moving a
    /// node within its own parent behaves like remove-then-insert.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        let old_parent = self.get(id)?.parent.ok_or(TreeError::RootOperation)?;
        self.get(new_parent)?;

        if new_parent == id || self.ancestors(new_parent).any(|a| a == id) {
            return Err(TreeError::WouldCycle {
                node: self.full_path(id),
                parent: self.full_path(new_parent),
            });
        }

        let position = self.child_position(old_parent, id)?;
        let target_len =
            self.get(new_parent)?.children.len() - usize::from(old_parent == new_parent);
        if index > target_len {
            return Err(TreeError::IndexOutOfBounds {
                parent: self.full_path(new_parent),
                index,
                len: target_len,
            });
        }

        self.get_mut(old_parent)?.children.remove(position);
        self.get_mut(new_parent)?.children.insert(index, id);
        self.get_mut(id)?.parent = Some(new_parent);
        tracing::debug!(node = %self.full_path(id), "moved node");
        Ok(())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&current| self.parent(current))
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if !self.contains(id) {
            return order;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    /// Pre-order walk of the subtree below `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = self.subtree(id);
        if !order.is_empty() {
            order.remove(0);
        }
        order
    }

    /// Descendants of `id` that satisfy `kind` (a kind or capability tag).
    pub fn descendants_of_kind(&self, id: NodeId, kind: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&d| self.node(d).is_some_and(|node| node.satisfies(kind)))
            .collect()
    }

    /// Nearest strict ancestor satisfying `kind`.
    pub fn find_ancestor(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| self.node(a).is_some_and(|node| node.satisfies(kind)))
    }

    /// Nearest scope boundary among `id` and its ancestors, else the root.
    pub fn scope_root(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        if node.boundary {
            return Some(id);
        }
        Some(
            self.ancestors(id)
                .find(|&a| self.node(a).is_some_and(|n| n.boundary))
                .unwrap_or(self.root),
        )
    }

    /// Every node visible from `id`: the pre-order subtree of its scope root.
    pub fn visible_from(&self, id: NodeId) -> Vec<NodeId> {
        self.scope_root(id)
            .map(|scope| self.subtree(scope))
            .unwrap_or_default()
    }

    /// First child of `id` named exactly `name`.
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.node(c).is_some_and(|node| node.name == name))
    }

    /// Dotted path from the root, e.g. `.Simulations.Base.Clock`.
    pub fn full_path(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return format!("<removed {id}>");
        };
        let mut names = vec![node.name.as_str()];
        names.extend(
            self.ancestors(id)
                .filter_map(|a| self.node(a))
                .map(|n| n.name.as_str()),
        );
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('.');
            path.push_str(name);
        }
        path
    }

    // ========================================================================
    // Node data
    // ========================================================================

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(Node::name)
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), TreeError> {
        self.get_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<(), TreeError> {
        self.get_mut(id)?.hidden = hidden;
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.node(id)?.attributes.get(name)
    }

    /// Stores an attribute without type checks, returning the previous value.
    ///
    /// Use the locator for checked assignment of existing members.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, TreeError> {
        Ok(self.get_mut(id)?.attributes.insert(name.into(), value))
    }

    pub fn replace_attributes(
        &mut self,
        id: NodeId,
        attributes: Attributes,
    ) -> Result<(), TreeError> {
        self.get_mut(id)?.attributes = attributes;
        Ok(())
    }

    pub fn binding(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.node(id)?.binding(field)
    }

    pub fn downcast<T: Component>(&self, id: NodeId) -> Option<&T> {
        self.node(id)?.downcast::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id)?.downcast_mut::<T>()
    }

    /// Lends the component out; the node keeps its identity meanwhile.
    pub(crate) fn take_component(&mut self, id: NodeId) -> Option<Box<dyn Component>> {
        self.node_mut(id)?.component.take()
    }

    /// Returns a lent component. Dropped if the node was removed meanwhile.
    pub(crate) fn restore_component(&mut self, id: NodeId, component: Box<dyn Component>) {
        if let Some(node) = self.node_mut(id) {
            node.component = Some(component);
        }
    }
}

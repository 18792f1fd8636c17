//! Typed lifecycle events.
//!
//! Events are delivered in pre-order to every node whose component exposes
//! the matching hook. While a hook runs, its component is lent out of the
//! tree and the hook receives a [`HookContext`] with mutable access to the
//! rest of the tree, so it can resolve addresses or follow its bindings.

use arbor_types::{NodeId, Value};

use crate::{
    component::{Component, Timestep},
    error::{EventError, HookError, LoadError, PathError},
    locator::{self, Resolved},
    tree::Tree,
};

/// The tree as seen by a running hook.
pub struct HookContext<'t> {
    tree: &'t mut Tree,
    node: NodeId,
}

impl<'t> HookContext<'t> {
    pub fn new(tree: &'t mut Tree, node: NodeId) -> Self {
        Self { tree, node }
    }

    /// The node whose hook is running.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tree(&self) -> &Tree {
        self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        self.tree
    }

    pub fn name(&self) -> &str {
        self.tree.name(self.node).unwrap_or_default()
    }

    pub fn full_path(&self) -> String {
        self.tree.full_path(self.node)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.tree.attribute(self.node, name)
    }

    /// Node bound to the slot `field`, if any.
    pub fn dependency(&self, field: &str) -> Option<NodeId> {
        self.tree.binding(self.node, field)
    }

    /// Resolves an address relative to the running node.
    pub fn get(&self, address: &str) -> Result<Resolved, PathError> {
        locator::get(self.tree, self.node, address)
    }

    pub fn get_value(&self, address: &str) -> Result<Value, PathError> {
        locator::get_value(self.tree, self.node, address)
    }

    pub fn set(&mut self, address: &str, value: Value) -> Result<(), PathError> {
        locator::set(self.tree, self.node, address, value)
    }

    pub fn find_by_type(&self, declared: &str) -> Option<NodeId> {
        locator::find_by_type(self.tree, self.node, declared)
    }
}

/// A lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Loaded,
    Commencing,
    Timestep(Timestep),
    Completed,
}

impl Event {
    pub fn name(self) -> &'static str {
        match self {
            Event::Loaded => "Loaded",
            Event::Commencing => "Commencing",
            Event::Timestep(_) => "Timestep",
            Event::Completed => "Completed",
        }
    }
}

/// Runs the hook for `event` on one node, if its component has one.
fn deliver(tree: &mut Tree, id: NodeId, event: Event) -> Result<(), HookError> {
    let Some(mut component) = tree.take_component(id) else {
        return Ok(());
    };
    let result = call_hook(component.as_mut(), tree, id, event);
    tree.restore_component(id, component);
    result
}

fn call_hook(
    component: &mut dyn Component,
    tree: &mut Tree,
    id: NodeId,
    event: Event,
) -> Result<(), HookError> {
    let mut cx = HookContext::new(tree, id);
    match event {
        Event::Loaded => match component.loaded_hook() {
            Some(hook) => hook.loaded(&mut cx),
            None => Ok(()),
        },
        Event::Commencing => match component.commencing_hook() {
            Some(hook) => hook.commencing(&mut cx),
            None => Ok(()),
        },
        Event::Timestep(step) => match component.timestep_hook() {
            Some(hook) => hook.timestep(&mut cx, step),
            None => Ok(()),
        },
        Event::Completed => match component.completed_hook() {
            Some(hook) => hook.completed(&mut cx),
            None => Ok(()),
        },
    }
}

/// Replays `Loaded` over the subtree in pre-order.
///
/// Failures do not stop the walk: every failing node is reported, with its
/// name and path, in the returned list.
pub fn replay_loaded(tree: &mut Tree, root: NodeId) -> Vec<LoadError> {
    let mut errors = Vec::new();
    for id in tree.subtree(root) {
        if let Err(source) = deliver(tree, id, Event::Loaded) {
            let error = LoadError {
                node: tree.name(id).unwrap_or_default().to_string(),
                path: tree.full_path(id),
                source,
            };
            tracing::warn!(node = %error.path, error = %error.source, "load hook failed");
            errors.push(error);
        }
    }
    errors
}

/// Delivers `event` over the subtree in pre-order, stopping at the first failure.
///
/// Returns the number of nodes visited.
pub fn publish(tree: &mut Tree, root: NodeId, event: Event) -> Result<usize, EventError> {
    let order = tree.subtree(root);
    for &id in &order {
        deliver(tree, id, event).map_err(|source| EventError {
            event: event.name(),
            path: tree.full_path(id),
            source,
        })?;
    }
    Ok(order.len())
}

//! A single component node as stored in the tree arena.

use arbor_types::{Attributes, NodeId, Value};

use crate::component::{ANY_KIND, Component, DependencySlot};

/// Identity, structure and behaviour of one node.
///
/// The kind tag, capability tags and dependency table are captured from the
/// component when the node is created, so they stay queryable while the
/// component itself is lent out to a lifecycle hook.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) kind: &'static str,
    pub(crate) provides: &'static [&'static str],
    pub(crate) boundary: bool,
    pub(crate) slots: &'static [DependencySlot],
    pub(crate) hidden: bool,
    pub(crate) attributes: Attributes,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) bindings: Vec<Option<NodeId>>,
}

impl Node {
    pub(crate) fn new(component: Box<dyn Component>, name: String) -> Self {
        let slots = component.dependencies();
        Self {
            name,
            kind: component.kind(),
            provides: component.provides(),
            boundary: component.is_scope_boundary(),
            slots,
            hidden: false,
            attributes: component.default_attributes(),
            parent: None,
            children: Vec::new(),
            component: Some(component),
            bindings: vec![None; slots.len()],
        }
    }

    /// Copies everything except structure and bindings.
    pub(crate) fn detached_copy(&self) -> Option<Self> {
        let component = self.component.as_ref()?.box_clone();
        Some(Self {
            name: self.name.clone(),
            kind: self.kind,
            provides: self.provides,
            boundary: self.boundary,
            slots: self.slots,
            hidden: self.hidden,
            attributes: self.attributes.clone(),
            parent: None,
            children: Vec::new(),
            component: Some(component),
            bindings: vec![None; self.slots.len()],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn provides(&self) -> &'static [&'static str] {
        self.provides
    }

    pub fn is_scope_boundary(&self) -> bool {
        self.boundary
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn dependencies(&self) -> &'static [DependencySlot] {
        self.slots
    }

    /// Current binding of every slot, in declaration order.
    pub fn bindings(&self) -> &[Option<NodeId>] {
        &self.bindings
    }

    /// Current binding of the slot with the given field identity.
    pub fn binding(&self, field: &str) -> Option<NodeId> {
        let position = self.slots.iter().position(|slot| slot.field == field)?;
        self.bindings[position]
    }

    /// Returns `None` while the component is lent out to a running hook.
    pub fn component(&self) -> Option<&dyn Component> {
        self.component.as_deref()
    }

    pub fn component_mut(&mut self) -> Option<&mut (dyn Component + 'static)> {
        self.component.as_deref_mut()
    }

    /// Downcasts the component to a concrete type.
    pub fn downcast<T: Component>(&self) -> Option<&T> {
        self.component.as_deref()?.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.component.as_deref_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Whether this node can fill a slot declared with `declared`.
    pub fn satisfies(&self, declared: &str) -> bool {
        declared == ANY_KIND || declared == self.kind || self.provides.contains(&declared)
    }
}

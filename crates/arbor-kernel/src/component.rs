//! The component contract.
//!
//! A component is the behaviour attached to a tree node. The host never
//! hard-codes which components exist: each kind describes itself through the
//! [`Component`] trait (kind tag, capability tags, dependency slots, runtime
//! members) and opts into lifecycle events by returning one of the hook
//! traits from the matching accessor.

use std::{any::Any, fmt::Debug};

use arbor_types::{Attributes, Value, ValueType};

use crate::{error::HookError, events::HookContext};

/// Declared type that every node satisfies.
pub const ANY_KIND: &str = "Model";

/// A named dependency a component asks the binder to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySlot {
    /// Field identity, also used to disambiguate several candidates by name.
    pub field: &'static str,
    /// Kind or capability tag a candidate must satisfy.
    pub declared: &'static str,
    /// Optional slots stay unset instead of failing when nothing matches.
    pub optional: bool,
}

impl DependencySlot {
    pub const fn required(field: &'static str, declared: &'static str) -> Self {
        Self {
            field,
            declared,
            optional: false,
        }
    }

    pub const fn optional(field: &'static str, declared: &'static str) -> Self {
        Self {
            field,
            declared,
            optional: true,
        }
    }
}

/// Outcome of writing a runtime member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberWrite {
    Written,
    Unknown,
    ReadOnly,
    Mismatch(ValueType),
}

/// Behaviour attached to a node.
///
/// Only `kind` is required. Everything else has a neutral default, so a
/// component with no dependencies, members or hooks is a one-liner.
pub trait Component: ComponentClone + AsAny + Debug + Send + 'static {
    /// Kind tag, matched against dependency declarations and used as the
    /// discriminator in persisted documents.
    fn kind(&self) -> &'static str;

    /// Additional tags this component can be bound as.
    fn provides(&self) -> &'static [&'static str] {
        &[]
    }

    /// Nodes of a boundary kind confine dependency searches to their subtree.
    fn is_scope_boundary(&self) -> bool {
        false
    }

    fn dependencies(&self) -> &'static [DependencySlot] {
        &[]
    }

    /// Attributes a freshly created node of this kind starts with.
    fn default_attributes(&self) -> Attributes {
        Attributes::new()
    }

    /// Reads a non-persisted runtime member.
    fn member(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_member(&mut self, _name: &str, _value: Value) -> MemberWrite {
        MemberWrite::Unknown
    }

    fn loaded_hook(&mut self) -> Option<&mut dyn OnLoaded> {
        None
    }

    fn commencing_hook(&mut self) -> Option<&mut dyn OnCommencing> {
        None
    }

    fn timestep_hook(&mut self) -> Option<&mut dyn OnTimestep> {
        None
    }

    fn completed_hook(&mut self) -> Option<&mut dyn OnCompleted> {
        None
    }
}

/// Called after a node is constructed, cloned or substituted into a tree.
pub trait OnLoaded {
    fn loaded(&mut self, cx: &mut HookContext<'_>) -> Result<(), HookError>;
}

/// Called once before the first step of a run.
pub trait OnCommencing {
    fn commencing(&mut self, cx: &mut HookContext<'_>) -> Result<(), HookError>;
}

/// Called once per simulated step.
pub trait OnTimestep {
    fn timestep(&mut self, cx: &mut HookContext<'_>, step: Timestep) -> Result<(), HookError>;
}

/// Called once after the last step of a run.
pub trait OnCompleted {
    fn completed(&mut self, cx: &mut HookContext<'_>) -> Result<(), HookError>;
}

/// Position of the current step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestep {
    pub index: u64,
}

// ============================================================================
// Object-safe helpers
// ============================================================================

/// Deep copy of a boxed component, implemented for every `Clone` component.
pub trait ComponentClone {
    fn box_clone(&self) -> Box<dyn Component>;
}

impl<T: Component + Clone> ComponentClone for T {
    fn box_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Downcasting support for concrete component access.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//! # arbor-kernel: Composition core of `Arbor`
//!
//! The kernel holds a tree of components and wires them together. It is
//! pure: no files, no clocks, no threads. Everything here operates on a
//! [`Tree`] borrowed by the caller.
//!
//! ## Architecture
//!
//! - [`tree`] / [`node`]: the arena of component nodes and structural edits
//! - [`component`]: the contract every component kind implements
//! - [`registry`]: kind tag → factory, used when reading documents
//! - [`binder`]: fills declared dependency slots from the enclosing scope
//! - [`address`] / [`locator`]: path addresses resolved to live handles
//! - [`clone`]: deep, independent subtree copies
//! - [`events`]: typed lifecycle hooks delivered in pre-order
//!
//! ## Example
//!
//! ```ignore
//! let mut tree = Tree::new(Box::new(Simulations::default()), "Simulations");
//! let sim = tree.add_child(tree.root(), Box::new(Simulation::default()), "Base")?;
//! tree.add_child(sim, Box::new(Clock::default()), "Clock")?;
//!
//! binder::bind_subtree(&mut tree, sim)?;
//! let start = locator::get_value(&tree, sim, "Clock.Start")?;
//! ```

pub mod address;
pub mod binder;
pub mod clone;
pub mod component;
pub mod error;
pub mod events;
pub mod locator;
pub mod node;
pub mod registry;
pub mod tree;


// Re-export commonly used items
pub use address::Address;
pub use component::{
    ANY_KIND, Component, DependencySlot, MemberWrite, OnCommencing, OnCompleted, OnLoaded,
    OnTimestep, Timestep,
};
pub use error::{BindingError, EventError, HookError, LoadError, PathError, TreeError};
pub use events::{Event, HookContext};
pub use locator::{Resolved, Target, VariableHandle};
pub use node::Node;
pub use registry::Registry;
pub use tree::Tree;

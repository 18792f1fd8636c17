//! # Arbor
//!
//! Composition host for trees of interchangeable simulation components.
//!
//! A document describes a tree of components: simulations, the models inside
//! them, experiments that vary those models. Arbor loads the tree, wires each
//! component's declared dependencies from its enclosing simulation, resolves
//! path addresses to live values and executes independent copies of each
//! simulation, optionally in parallel.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                             Arbor                              │
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌────────────┐  │
//! │  │  Format  │ → │  Kernel   │ → │   Runs   │ → │  Executor  │  │
//! │  │  (JSON)  │   │(tree/bind)│   │ (clones) │   │  (clock)   │  │
//! │  └──────────┘   └───────────┘   └──────────┘   └────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use arbor::{ArborConfig, ClockExecutor, Host};
//!
//! let host = Host::new(&ArborConfig::load()?);
//! let outcome = host.load_file("wheat.arbor")?;
//!
//! let runs = host.runs_for(&outcome, None)?;
//! for outcome in host.execute_all(runs, |_| Box::new(ClockExecutor)) {
//!     println!("{}: {:?}", outcome.run.name(), outcome.result);
//! }
//! ```
//!
//! # Modules
//!
//! - **Host**: [`Host`], [`RunInstance`] - loading, runs, persistence
//! - **Built-ins**: [`builtin`] - component kinds every document can use
//! - **Kernel**: [`binder`], [`locator`], [`events`] - re-exported core

pub mod builtin;
mod error;
mod executor;
mod expander;
mod host;
mod run;

#[cfg(test)]
mod tests;

// Host layer - main API
pub use error::{ExecutionError, ExperimentError, HostError, PersistenceError, Result};
pub use executor::{ClockExecutor, ExecutionSummary, Executor};
pub use expander::{ExperimentExpander, Prepare};
pub use host::{Host, LoadOutcome};
pub use run::{RunInstance, RunOutcome, RunState};

// Re-export the kernel
pub use arbor_kernel::{
    ANY_KIND, Address, BindingError, Component, DependencySlot, Event, EventError, HookContext,
    HookError, LoadError, MemberWrite, Node, OnCommencing, OnCompleted, OnLoaded, OnTimestep,
    PathError, Registry, Resolved, Timestep, Tree, TreeError, VariableHandle, binder, events,
    locator,
};

// Re-export shared types
pub use arbor_types::{Attributes, NodeId, Value, ValueType};

// Re-export persistence
pub use arbor_format::{CURRENT_VERSION, FormatError, JsonSerializer, Serializer};
pub use arbor_io::{AtomicWriter, FileBackend, IoError, StdBackend};

// Re-export configuration
pub use arbor_config::{ArborConfig, ConfigLoader};

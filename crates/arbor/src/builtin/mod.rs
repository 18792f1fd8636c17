//! Built-in component kinds.
//!
//! These are the kinds every document can use without registering anything:
//! the document root, simulations, folders, replacements, experiments, the
//! clock and an in-memory report.

mod clock;
mod containers;
mod experiment;
mod report;

use arbor_kernel::Registry;

pub use clock::{Clock, DATE_FORMAT};
pub use containers::{Folder, Model, Replacements, Simulation, Simulations};
pub use experiment::{Experiment, Factor, FactorialExperiment, Factors};
pub use report::{Column, Report, columns};

pub const SIMULATIONS: &str = "Simulations";
pub const SIMULATION: &str = "Simulation";
pub const FOLDER: &str = "Folder";
pub const REPLACEMENTS: &str = "Replacements";
pub const EXPERIMENT: &str = "Experiment";
pub const FACTORS: &str = "Factors";
pub const FACTOR: &str = "Factor";
pub const CLOCK: &str = "Clock";
pub const REPORT: &str = "Report";

/// Registers every built-in kind.
pub fn register_builtins(registry: &mut Registry) {
    registry
        .register::<Simulations>()
        .register::<Simulation>()
        .register::<Folder>()
        .register::<Replacements>()
        .register::<Experiment>()
        .register::<Factors>()
        .register::<Factor>()
        .register::<Clock>()
        .register::<Report>()
        .register::<Model>();
}

/// A registry holding the built-in kinds only.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    registry
}

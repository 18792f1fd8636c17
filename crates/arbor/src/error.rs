//! Error types for the Arbor host.

use std::path::PathBuf;

use arbor_format::FormatError;
use arbor_io::IoError;
use arbor_kernel::{BindingError, EventError, LoadError, PathError, TreeError};

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Failure to read or write a document.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

/// Errors raised while executing a run.
#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("no Clock found under {0}")]
    NoClock(String),

    #[error("clock {path} has an invalid {field} date '{value}'")]
    InvalidDate {
        path: String,
        field: &'static str,
        value: String,
    },

    #[error("clock {path} ends ({end}) before it starts ({start})")]
    EmptyRange {
        path: String,
        start: String,
        end: String,
    },

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Errors from expanding an experiment into runs.
#[derive(thiserror::Error, Debug)]
pub enum ExperimentError {
    #[error("experiment {0} has no base Simulation")]
    NoBaseSimulation(String),

    #[error("factor {path} is invalid: {reason}")]
    InvalidFactor { path: String, reason: String },

    #[error("cannot apply factor {factor} to run {run}: {source}")]
    Apply {
        run: String,
        factor: String,
        #[source]
        source: PathError,
    },
}

/// Errors from the Arbor host.
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Experiment(#[from] ExperimentError),

    /// `Loaded` hooks failed while preparing a run.
    #[error("{} load error(s) in run {run}; first: {}", errors.len(), first_error(errors))]
    LoadFailed { run: String, errors: Vec<LoadError> },

    #[error("no Simulation found in the document")]
    NoSimulation,

    #[error("no model named '{0}' found")]
    ModelNotFound(String),

    #[error("run {0} panicked")]
    Panicked(String),
}

fn first_error(errors: &[LoadError]) -> String {
    errors
        .first()
        .map_or_else(String::new, ToString::to_string)
}

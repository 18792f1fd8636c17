//! Error kinds raised by the kernel.
//!
//! Every variant carries the data needed to render an actionable message:
//! node paths rather than raw handles wherever a path can be computed.

use arbor_types::{NodeId, ValueType};

/// Structural errors from tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} is no longer part of the tree")]
    StaleNode(NodeId),

    #[error("moving {node} under {parent} would create a cycle")]
    WouldCycle { node: String, parent: String },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: NodeId },

    #[error("the root node cannot be removed or moved")]
    RootOperation,

    #[error("child index {index} is out of bounds for {parent} ({len} children)")]
    IndexOutOfBounds {
        parent: String,
        index: usize,
        len: usize,
    },

    #[error("component of {0} is in use by a running hook")]
    ComponentInUse(String),
}

/// A required dependency slot could not be filled unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "cannot resolve dependency '{slot}' ({declared}) of {owner_path}: found {candidates} matches"
)]
pub struct BindingError {
    pub owner_path: String,
    pub slot: String,
    pub declared: String,
    pub candidates: usize,
}

/// Errors from parsing or resolving a path address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("cannot resolve '{segment}' in address '{address}'")]
    NotFound { address: String, segment: String },

    #[error("type mismatch at '{address}': expected {expected}, found {found}")]
    TypeMismatch {
        address: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("'{address}' resolves to a node, not a value")]
    NotAValue { address: String },

    #[error("'{address}' resolves to a value, not a node")]
    NotANode { address: String },

    #[error("'{address}' is read-only")]
    ReadOnly { address: String },

    #[error("cannot store a NaN or infinite number at '{address}'")]
    NonFinite { address: String },

    #[error("address '{address}' refers to a node that was removed")]
    Stale { address: String },
}

/// Failure reported by a lifecycle hook.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HookError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl HookError {
    pub fn failed(message: impl Into<String>) -> Self {
        HookError::Failed(message.into())
    }
}

/// A `Loaded` hook failure, collected rather than propagated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to load {path}: {source}")]
pub struct LoadError {
    /// Name of the node whose hook failed.
    pub node: String,
    /// Full path of that node at the time of the failure.
    pub path: String,
    #[source]
    pub source: HookError,
}

/// A lifecycle hook other than `Loaded` failed and stopped the walk.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{event} hook of {path} failed: {source}")]
pub struct EventError {
    pub event: &'static str,
    pub path: String,
    #[source]
    pub source: HookError,
}

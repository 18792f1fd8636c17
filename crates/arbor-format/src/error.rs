//! Error types for reading and writing documents.

use arbor_kernel::TreeError;
use arbor_types::ValueType;
use thiserror::Error;

/// Document format errors.
#[derive(Error, Debug)]
pub enum FormatError {
    /// JSON syntax or shape error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document written by a newer version of the format.
    #[error("document version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u32 },

    /// Document structure the upgrade pass cannot interpret.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// No component registered for a node's kind.
    #[error("unknown component kind '{kind}' at {path}")]
    UnknownKind { kind: String, path: String },

    /// A persisted attribute disagrees with the type the component declares.
    #[error("attribute '{attribute}' of {path} must be {expected}, found {found}")]
    AttributeType {
        path: String,
        attribute: String,
        expected: ValueType,
        found: ValueType,
    },

    /// An attribute holds a NaN or infinite float, which JSON cannot represent.
    #[error("attribute '{attribute}' of {path} is not a finite number")]
    NonFinite { path: String, attribute: String },

    /// Tree construction failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;

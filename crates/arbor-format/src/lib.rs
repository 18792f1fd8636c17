//! Document format for Arbor trees.
//!
//! Provides the persisted representation of a component tree:
//! - Tagged node records (`kind`, `name`, `hidden`, `attributes`, `children`)
//! - Version upgrades applied to the raw JSON before typed parsing
//! - The [`Serializer`] collaborator used by the host to read and write files

pub mod convert;
pub mod error;
pub mod record;
pub mod serializer;
pub mod upgrade;

pub use convert::{build_tree, to_record};
pub use error::{FormatError, Result};
pub use record::{CURRENT_VERSION, Document, NodeRecord};
pub use serializer::{JsonSerializer, Serializer};

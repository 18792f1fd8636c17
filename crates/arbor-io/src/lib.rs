//! # arbor-io: File Backend Abstraction for Arbor
//!
//! This crate provides the file operations the host needs to persist
//! documents, behind a trait so the write protocol can be tested with
//! backends that fail on purpose:
//!
//! - **`StdBackend`** (default): blocking `std::fs` operations
//! - **`AtomicWriter`**: temp file → backup rotation → final move, with
//!   rollback when the final move fails
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │        arbor (Host)      │
//! │   (uses AtomicWriter)    │
//! └────────────┬─────────────┘
//!              │
//! ┌────────────┴─────────────┐
//! │         arbor-io         │
//! │  ┌─────────┐  ┌────────┐ │
//! │  │ Atomic  │→ │  File  │ │
//! │  │ Writer  │  │Backend │ │
//! │  └─────────┘  └────────┘ │
//! └──────────────────────────┘
//! ```

mod atomic;
mod backend;
mod error;
mod std_backend;

pub use atomic::{AtomicWriter, DEFAULT_BACKUP_SUFFIX};
pub use backend::FileBackend;
pub use error::IoError;
pub use std_backend::StdBackend;

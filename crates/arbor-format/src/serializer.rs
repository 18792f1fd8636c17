//! The serializer collaborator.

use arbor_kernel::{Registry, Tree};

use crate::convert::{build_tree, to_record};
use crate::error::Result;
use crate::record::{CURRENT_VERSION, Document};
use crate::upgrade;

/// Reads and writes whole trees.
pub trait Serializer: Send + Sync {
    /// Upgrades a raw document in place, returning the version it started at.
    fn upgrade(&self, raw: &mut serde_json::Value) -> Result<u64>;

    fn serialize(&self, tree: &Tree) -> Result<String>;

    /// Parses, upgrades and builds a tree. Lifecycle hooks are not run.
    fn deserialize(&self, text: &str, registry: &Registry) -> Result<Tree>;
}

/// JSON documents, see [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Parses and upgrades without building a tree.
    pub fn read_document(&self, text: &str) -> Result<Document> {
        let mut raw: serde_json::Value = serde_json::from_str(text)?;
        self.upgrade(&mut raw)?;
        Ok(serde_json::from_value(raw)?)
    }

    pub fn write_document(&self, document: &Document) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(document)?
        } else {
            serde_json::to_string(document)?
        };
        Ok(text)
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for JsonSerializer {
    fn upgrade(&self, raw: &mut serde_json::Value) -> Result<u64> {
        upgrade::upgrade(raw)
    }

    fn serialize(&self, tree: &Tree) -> Result<String> {
        let document = Document {
            version: CURRENT_VERSION,
            root: to_record(tree, tree.root())?,
        };
        self.write_document(&document)
    }

    fn deserialize(&self, text: &str, registry: &Registry) -> Result<Tree> {
        let document = self.read_document(text)?;
        let tree = build_tree(&document.root, registry)?;
        tracing::debug!(nodes = tree.len(), "deserialized tree");
        Ok(tree)
    }
}

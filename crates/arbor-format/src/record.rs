//! Persisted document model.

use arbor_types::Attributes;
use serde::{Deserialize, Serialize};

/// Format version written by this build.
pub const CURRENT_VERSION: u32 = 3;

/// A whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub root: NodeRecord,
}

/// One node, tagged with its component kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRecord {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            hidden: false,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: NodeRecord) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<arbor_types::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Number of records in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeRecord::count).sum::<usize>()
    }
}

//! Structural components: the document root, simulations and plain containers.

use std::path::{Path, PathBuf};

use arbor_format::CURRENT_VERSION;
use arbor_kernel::{Component, MemberWrite};
use arbor_types::{Attributes, Value};

/// Document root. Holds the file identity the document was loaded from.
#[derive(Debug, Clone, Default)]
pub struct Simulations {
    file: Option<PathBuf>,
}

impl Simulations {
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: Option<PathBuf>) {
        self.file = file;
    }
}

impl Component for Simulations {
    fn kind(&self) -> &'static str {
        super::SIMULATIONS
    }

    fn default_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("Version".into(), Value::Int(i64::from(CURRENT_VERSION)));
        attributes
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "FileName" => Some(file_name_value(self.file.as_deref())),
            _ => None,
        }
    }

    fn set_member(&mut self, name: &str, _value: Value) -> MemberWrite {
        match name {
            "FileName" => MemberWrite::ReadOnly,
            _ => MemberWrite::Unknown,
        }
    }
}

/// A runnable simulation and the scope boundary for dependency searches.
///
/// Runs created from an experiment carry the factor levels that produced them.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    file: Option<PathBuf>,
    factors: Vec<(String, Value)>,
}

impl Simulation {
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: Option<PathBuf>) {
        self.file = file;
    }

    pub fn factors(&self) -> &[(String, Value)] {
        &self.factors
    }

    pub fn set_factors(&mut self, factors: Vec<(String, Value)>) {
        self.factors = factors;
    }
}

impl Component for Simulation {
    fn kind(&self) -> &'static str {
        super::SIMULATION
    }

    fn is_scope_boundary(&self) -> bool {
        true
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "FileName" => Some(file_name_value(self.file.as_deref())),
            "Factors" => Some(Value::Record(self.factors.iter().cloned().collect())),
            _ => None,
        }
    }

    fn set_member(&mut self, name: &str, _value: Value) -> MemberWrite {
        match name {
            "FileName" | "Factors" => MemberWrite::ReadOnly,
            _ => MemberWrite::Unknown,
        }
    }
}

fn file_name_value(file: Option<&Path>) -> Value {
    Value::Text(file.map(|f| f.display().to_string()).unwrap_or_default())
}

/// Groups nodes without adding behaviour.
#[derive(Debug, Clone, Default)]
pub struct Folder;

impl Component for Folder {
    fn kind(&self) -> &'static str {
        super::FOLDER
    }
}

/// Holds replacement subtrees substituted into every run by type and name.
#[derive(Debug, Clone, Default)]
pub struct Replacements;

impl Component for Replacements {
    fn kind(&self) -> &'static str {
        super::REPLACEMENTS
    }
}

/// Generic component carrying only attributes.
#[derive(Debug, Clone, Default)]
pub struct Model;

impl Component for Model {
    fn kind(&self) -> &'static str {
        arbor_kernel::ANY_KIND
    }
}

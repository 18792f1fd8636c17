//! CLI command implementations.

pub mod check;
pub mod config;
pub mod get;
pub mod list;
pub mod run;
pub mod set;
pub mod upgrade;
pub mod version;

use anyhow::{Context, Result};
use arbor::{ArborConfig, Host, LoadOutcome, Value};

use crate::style::print_warn;

/// Loads `file`, printing every `Loaded` failure as a warning.
pub fn load(config: &ArborConfig, file: &str) -> Result<(Host, LoadOutcome)> {
    let host = Host::new(config);
    let outcome = host
        .load_file(file)
        .with_context(|| format!("Failed to load {file}"))?;
    for error in &outcome.errors {
        print_warn(&error.to_string());
    }
    Ok((host, outcome))
}

/// Text for a value: text as is, everything else as JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

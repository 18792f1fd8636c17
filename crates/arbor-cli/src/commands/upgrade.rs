//! Rewrites a document in the current format version.

use anyhow::{Context, Result};
use arbor::{ArborConfig, CURRENT_VERSION, Host};

use crate::style::print_success;

pub fn run(config: &ArborConfig, file: &str) -> Result<()> {
    let host = Host::new(config);
    let from = host
        .upgrade_file(file)
        .with_context(|| format!("Failed to upgrade {file}"))?;
    print_success(&format!("{file}: v{from} -> v{CURRENT_VERSION}"));
    Ok(())
}

//! Writes a value by address and saves the document.

use anyhow::{Context, Result};
use arbor::{ArborConfig, Value, locator};

use crate::style::print_success;

pub fn run(config: &ArborConfig, file: &str, address: &str, raw: &str) -> Result<()> {
    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("Value must be JSON, got {raw}"))?;
    let (host, mut outcome) = super::load(config, file)?;

    let root = outcome.tree.root();
    locator::set(&mut outcome.tree, root, address, value)
        .with_context(|| format!("Cannot set {address}"))?;
    host.write(&outcome.tree, file)
        .with_context(|| format!("Failed to save {file}"))?;

    print_success(&format!("{address} = {raw}"));
    Ok(())
}

//! Shows the effective configuration.

use anyhow::{Result, bail};
use arbor_config::{ArborConfig, ConfigLoader};

use crate::style::{Paint, print_labeled};

pub fn show(config: &ArborConfig, format: &str) -> Result<()> {
    match format {
        "toml" => print!("{}", config.to_toml()?),
        "json" => println!("{}", serde_json::to_string_pretty(config)?),
        other => bail!("Unknown format '{other}' (expected toml or json)"),
    }

    println!();
    println!("{}", "Sources".header());
    for (layer, file) in ConfigLoader::new().paths().config_files() {
        let state = if file.exists() { "" } else { " (not found)" };
        print_labeled(layer.label(), &format!("{}{}", file.display(), state.muted()));
    }
    Ok(())
}

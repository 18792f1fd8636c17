//! Lists the runs a document produces.

use anyhow::Result;
use arbor::ArborConfig;

use crate::style::Paint;

pub fn run(config: &ArborConfig, file: &str) -> Result<()> {
    let (host, outcome) = super::load(config, file)?;
    let names = host.simulation_names(&outcome.tree)?;

    println!("{}", file.header());
    for name in &names {
        println!("  {name}");
    }
    let noun = if names.len() == 1 { "run" } else { "runs" };
    println!("{}", format!("({} {noun})", names.len()).muted());
    Ok(())
}

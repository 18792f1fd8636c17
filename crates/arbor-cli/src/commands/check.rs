//! Binds every run and reports dependency errors.

use anyhow::{Result, bail};
use arbor::ArborConfig;

use crate::style::{print_success, print_table};

pub fn run(config: &ArborConfig, file: &str) -> Result<()> {
    let (host, outcome) = super::load(config, file)?;
    let mut runs = host.runs_for(&outcome, None)?;

    let mut problems = outcome.errors.len();
    let mut rows = Vec::with_capacity(runs.len());
    for run in &mut runs {
        let status = match host.bind(run) {
            Ok(bound) => format!("ok ({bound} bound)"),
            Err(error) => {
                problems += 1;
                error.to_string()
            }
        };
        host.unbind(run);
        rows.push(vec![run.name().to_string(), status]);
    }
    print_table(&["Run".to_string(), "Binding".to_string()], &rows);

    if problems > 0 {
        bail!("{problems} problem(s) found in {file}");
    }
    print_success(&format!("{} runs bind cleanly", runs.len()));
    Ok(())
}

//! Executes the runs of a document.

use anyhow::{Result, bail};
use arbor::builtin::{REPORT, Report};
use arbor::{ArborConfig, ClockExecutor, Executor, RunOutcome};

use crate::style::{print_error, print_report, print_success, print_table};

pub fn run(
    config: &ArborConfig,
    file: &str,
    simulation: Option<&str>,
    sequential: bool,
) -> Result<()> {
    let mut config = config.clone();
    if sequential {
        config.execution.parallel = false;
    }
    let (host, outcome) = super::load(&config, file)?;
    let runs = host.runs_for(&outcome, simulation)?;
    let total = runs.len();

    let outcomes = host.execute_all(runs, |_| Box::new(ClockExecutor) as Box<dyn Executor>);

    let rows: Vec<Vec<String>> = outcomes
        .iter()
        .map(|o| {
            let (status, steps) = match &o.result {
                Ok(summary) => ("ok".to_string(), summary.steps.to_string()),
                Err(_) => ("failed".to_string(), "-".to_string()),
            };
            vec![o.run.name().to_string(), status, steps]
        })
        .collect();
    print_table(&["Run".to_string(), "Status".to_string(), "Steps".to_string()], &rows);

    for outcome in &outcomes {
        print_reports(outcome);
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).collect();
    for outcome in &failed {
        if let Err(error) = &outcome.result {
            print_error(&format!("{}: {error}", outcome.run.name()));
        }
    }
    if !failed.is_empty() {
        bail!("{} of {total} runs failed", failed.len());
    }
    print_success(&format!("{total} runs completed"));
    Ok(())
}

fn print_reports(outcome: &RunOutcome) {
    let tree = outcome.run.tree();
    for id in tree.descendants_of_kind(outcome.run.root(), REPORT) {
        let Some(report) = tree.downcast::<Report>(id) else {
            continue;
        };
        let rows: Vec<Vec<String>> = report
            .rows()
            .iter()
            .map(|row| row.iter().map(super::format_value).collect())
            .collect();
        print_report(&tree.full_path(id), report.headings(), &rows);
    }
}

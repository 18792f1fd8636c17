//! Reads a value or node by address.

use anyhow::{Context, Result};
use arbor::{ArborConfig, NodeId, Resolved, Tree, locator};

use crate::style::{Paint, print_labeled};

pub fn run(
    config: &ArborConfig,
    file: &str,
    address: &str,
    simulation: Option<&str>,
) -> Result<()> {
    let (host, outcome) = super::load(config, file)?;

    match simulation {
        None => {
            let tree = &outcome.tree;
            let resolved = locator::get(tree, tree.root(), address)
                .with_context(|| format!("Cannot resolve {address}"))?;
            print_resolved(tree, &resolved);
        }
        Some(name) => {
            let mut runs = host.runs_for(&outcome, Some(name))?;
            let Some(run) = runs.first_mut() else {
                anyhow::bail!("{name} produced no runs");
            };
            host.bind(run)?;
            let resolved = locator::get(run.tree(), run.root(), address)
                .with_context(|| format!("Cannot resolve {address} in {}", run.name()))?;
            print_resolved(run.tree(), &resolved);
            host.unbind(run);
        }
    }
    Ok(())
}

fn print_resolved(tree: &Tree, resolved: &Resolved) {
    match resolved {
        Resolved::Value(value) => println!("{}", super::format_value(value)),
        Resolved::Node(id) => print_node(tree, *id),
    }
}

fn print_node(tree: &Tree, id: NodeId) {
    let Some(node) = tree.node(id) else { return };
    println!("{}", tree.full_path(id).code());
    print_labeled("Kind", node.kind());
    print_labeled("Children", &node.children().len().to_string());
    for (name, value) in node.attributes() {
        print_labeled(name, &super::format_value(value));
    }
}

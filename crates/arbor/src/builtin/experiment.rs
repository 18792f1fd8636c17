//! Factorial experiments.
//!
//! An `Experiment` holds a base `Simulation` and a `Factors` folder of
//! `Factor` nodes. Each factor names an address (relative to the simulation)
//! and the levels to try there. The experiment expands to one run per
//! combination of levels, first factor varying slowest.

use arbor_kernel::{Component, HookContext, HookError, OnLoaded, Tree, locator};
use arbor_types::{Attributes, NodeId, Value};

use crate::error::{ExperimentError, Result};
use crate::expander::{ExperimentExpander, Prepare};
use crate::run::RunInstance;

#[derive(Debug, Clone, Default)]
pub struct Experiment;

impl Component for Experiment {
    fn kind(&self) -> &'static str {
        super::EXPERIMENT
    }
}

#[derive(Debug, Clone, Default)]
pub struct Factors;

impl Component for Factors {
    fn kind(&self) -> &'static str {
        super::FACTORS
    }
}

/// One varied address. `Path` is resolved from the run root; `Values` lists
/// the levels applied in turn.
#[derive(Debug, Clone, Default)]
pub struct Factor;

impl Component for Factor {
    fn kind(&self) -> &'static str {
        super::FACTOR
    }

    fn default_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("Path".into(), Value::from(""));
        attributes.insert("Values".into(), Value::List(Vec::new()));
        attributes
    }

    fn loaded_hook(&mut self) -> Option<&mut dyn OnLoaded> {
        Some(self)
    }
}

impl OnLoaded for Factor {
    fn loaded(&mut self, cx: &mut HookContext<'_>) -> std::result::Result<(), HookError> {
        match cx.attribute("Path").and_then(Value::as_text) {
            Some(path) if !path.trim().is_empty() => Ok(()),
            _ => Err(HookError::failed(format!("factor {} has no Path", cx.name()))),
        }
    }
}

// ============================================================================
// Expansion
// ============================================================================

struct FactorSpec {
    name: String,
    path: String,
    levels: Vec<Value>,
}

/// Cartesian-product expander for [`Experiment`] nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorialExperiment;

impl FactorialExperiment {
    fn base_simulation(tree: &Tree, experiment: NodeId) -> Result<NodeId> {
        tree.children(experiment)
            .iter()
            .copied()
            .find(|&id| tree.node(id).is_some_and(|n| n.kind() == super::SIMULATION))
            .ok_or_else(|| ExperimentError::NoBaseSimulation(tree.full_path(experiment)).into())
    }

    fn factors(tree: &Tree, experiment: NodeId) -> Result<Vec<FactorSpec>> {
        let Some(folder) = tree
            .children(experiment)
            .iter()
            .copied()
            .find(|&id| tree.node(id).is_some_and(|n| n.kind() == super::FACTORS))
        else {
            return Ok(Vec::new());
        };

        let mut specs = Vec::new();
        for &id in tree.children(folder) {
            let Some(node) = tree.node(id) else { continue };
            if node.kind() != super::FACTOR {
                continue;
            }
            let invalid = |reason: &str| ExperimentError::InvalidFactor {
                path: tree.full_path(id),
                reason: reason.to_string(),
            };
            let path = node
                .attribute("Path")
                .and_then(Value::as_text)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| invalid("Path is empty"))?;
            let levels = node
                .attribute("Values")
                .and_then(Value::as_list)
                .filter(|levels| !levels.is_empty())
                .ok_or_else(|| invalid("Values is empty"))?;
            specs.push(FactorSpec {
                name: node.name().to_string(),
                path: path.to_string(),
                levels: levels.to_vec(),
            });
        }
        Ok(specs)
    }
}

/// Every combination of level indices, first factor varying slowest.
fn combinations(factors: &[FactorSpec]) -> Vec<Vec<usize>> {
    factors.iter().fold(vec![Vec::new()], |acc, factor| {
        acc.iter()
            .flat_map(|prefix| {
                (0..factor.levels.len()).map(move |level| {
                    let mut next = prefix.clone();
                    next.push(level);
                    next
                })
            })
            .collect()
    })
}

fn level_label(level: &Value) -> String {
    match level {
        Value::Text(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn run_name(experiment: &str, factors: &[FactorSpec], combination: &[usize]) -> String {
    let mut name = experiment.to_string();
    for (factor, &level) in factors.iter().zip(combination) {
        name.push_str(&factor.name);
        name.push_str(&level_label(&factor.levels[level]));
    }
    name
}

impl ExperimentExpander for FactorialExperiment {
    fn create(
        &self,
        tree: &Tree,
        experiment: NodeId,
        prepare: &Prepare<'_>,
    ) -> Result<Vec<RunInstance>> {
        let base = Self::base_simulation(tree, experiment)?;
        let factors = Self::factors(tree, experiment)?;
        let experiment_name = tree.name(experiment).unwrap_or_default();

        let mut runs = Vec::new();
        for combination in combinations(&factors) {
            let name = run_name(experiment_name, &factors, &combination);
            let mut run = RunInstance::clone_from(tree, base)?;
            run.rename(name.clone())?;
            prepare(&mut run)?;

            let root = run.root();
            let mut levels = Vec::with_capacity(factors.len());
            for (factor, &level) in factors.iter().zip(&combination) {
                let value = factor.levels[level].clone();
                locator::set(run.tree_mut(), root, &factor.path, value.clone()).map_err(
                    |source| ExperimentError::Apply {
                        run: name.clone(),
                        factor: factor.name.clone(),
                        source,
                    },
                )?;
                levels.push((factor.name.clone(), value));
            }
            run.set_factors(levels);
            run.load()?;
            runs.push(run);
        }

        tracing::debug!(
            experiment = %tree.full_path(experiment),
            runs = runs.len(),
            "expanded experiment"
        );
        Ok(runs)
    }

    fn names(&self, tree: &Tree, experiment: NodeId) -> Result<Vec<String>> {
        Self::base_simulation(tree, experiment)?;
        let factors = Self::factors(tree, experiment)?;
        let experiment_name = tree.name(experiment).unwrap_or_default();
        Ok(combinations(&factors)
            .iter()
            .map(|combination| run_name(experiment_name, &factors, combination))
            .collect())
    }
}

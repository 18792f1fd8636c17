//! Run instances: independent copies of a simulation ready to execute.

use std::path::{Path, PathBuf};

use arbor_kernel::{Tree, events};
use arbor_types::{NodeId, Value};

use crate::builtin::{Simulation, Simulations};
use crate::error::{HostError, Result};
use crate::executor::ExecutionSummary;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Cloned, `Loaded` not yet replayed.
    Unloaded,
    Loaded,
    Bound,
    Executing,
}

/// One executable copy of a simulation.
///
/// The run owns its tree outright; the clone root has no parent, so runs
/// never observe each other or the template they were copied from.
#[derive(Debug)]
pub struct RunInstance {
    name: String,
    file: Option<PathBuf>,
    tree: Tree,
    factors: Vec<(String, Value)>,
    state: RunState,
}

impl RunInstance {
    /// Deep-copies the subtree at `id`. The run takes the node's name.
    pub fn clone_from(source: &Tree, id: NodeId) -> Result<Self> {
        let tree = source.clone_subtree(id)?;
        let name = tree.name(tree.root()).unwrap_or_default().to_string();
        Ok(Self {
            name,
            file: None,
            tree,
            factors: Vec::new(),
            state: RunState::Unloaded,
        })
    }

    /// Replays `Loaded` over the whole run.
    pub fn load(&mut self) -> Result<()> {
        let root = self.tree.root();
        let errors = events::replay_loaded(&mut self.tree, root);
        if !errors.is_empty() {
            return Err(HostError::LoadFailed {
                run: self.name.clone(),
                errors,
            });
        }
        self.state = RunState::Loaded;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the run and its root node.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.tree.set_name(self.tree.root(), name.clone())?;
        self.name = name;
        Ok(())
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Sets the file identity on the run and every simulation inside it.
    pub fn set_file(&mut self, file: Option<&Path>) {
        propagate_file(&mut self.tree, file);
        self.file = file.map(Path::to_path_buf);
    }

    /// Factor levels that produced this run, in factor order.
    pub fn factors(&self) -> &[(String, Value)] {
        &self.factors
    }

    /// Records factor levels on the run and on its root simulation.
    pub fn set_factors(&mut self, factors: Vec<(String, Value)>) {
        let root = self.tree.root();
        if let Some(simulation) = self.tree.downcast_mut::<Simulation>(root) {
            simulation.set_factors(factors.clone());
        }
        self.factors = factors;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RunState) {
        self.state = state;
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

/// Stores `file` on the document root and on every simulation in `tree`.
pub(crate) fn propagate_file(tree: &mut Tree, file: Option<&Path>) {
    for id in tree.subtree(tree.root()) {
        if let Some(root) = tree.downcast_mut::<Simulations>(id) {
            root.set_file(file.map(Path::to_path_buf));
        } else if let Some(simulation) = tree.downcast_mut::<Simulation>(id) {
            simulation.set_file(file.map(Path::to_path_buf));
        }
    }
}

/// Result of executing one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub run: RunInstance,
    pub result: Result<ExecutionSummary>,
}

impl RunOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

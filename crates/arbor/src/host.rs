//! The lifecycle orchestrator.
//!
//! A [`Host`] owns the collaborators needed to take a document from disk to
//! executed runs and back:
//!
//! ```text
//! load ──► expand runs ──► substitute ──► bind ──► execute ──► unbind
//!   ▲                                                             │
//!   └──────────────────────── write (atomic) ◄────────────────────┘
//! ```
//!
//! Runs are independent trees, so [`Host::execute_all`] can hand them to a
//! thread pool without any locking.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arbor_config::{ArborConfig, ExecutionConfig};
use arbor_format::{FormatError, JsonSerializer, Serializer};
use arbor_io::{AtomicWriter, FileBackend, StdBackend};
use arbor_kernel::{LoadError, Registry, Tree, binder, events, locator};
use arbor_types::NodeId;
use rayon::prelude::*;

use crate::builtin::{self, EXPERIMENT, FactorialExperiment, REPLACEMENTS, SIMULATION};
use crate::error::{HostError, PersistenceError, Result};
use crate::executor::{ExecutionSummary, Executor};
use crate::expander::ExperimentExpander;
use crate::run::{self, RunInstance, RunOutcome, RunState};

/// A freshly loaded document.
#[derive(Debug)]
pub struct LoadOutcome {
    pub tree: Tree,
    /// `Loaded` hook failures, in pre-order. Loading continues past them.
    pub errors: Vec<LoadError>,
    /// File the document was read from.
    pub file: Option<PathBuf>,
}

impl LoadOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Loads, expands, executes and writes simulation documents.
pub struct Host {
    registry: Registry,
    serializer: Arc<dyn Serializer>,
    backend: Arc<dyn FileBackend>,
    writer: AtomicWriter<Arc<dyn FileBackend>>,
    expander: Arc<dyn ExperimentExpander>,
    execution: ExecutionConfig,
    scratch_dir: PathBuf,
    backup_suffix: String,
}

impl Host {
    /// Creates a host with the built-in kinds, JSON documents and the
    /// local file system.
    pub fn new(config: &ArborConfig) -> Self {
        let backend: Arc<dyn FileBackend> = Arc::new(StdBackend);
        let scratch_dir = config.scratch_dir();
        let backup_suffix = config.persistence.backup_suffix.clone();
        Self {
            registry: builtin::builtin_registry(),
            serializer: Arc::new(JsonSerializer::new().pretty(config.persistence.pretty)),
            writer: AtomicWriter::with_backend(Arc::clone(&backend), scratch_dir.clone())
                .backup_suffix(backup_suffix.clone()),
            backend,
            expander: Arc::new(FactorialExperiment),
            execution: config.execution.clone(),
            scratch_dir,
            backup_suffix,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn FileBackend>) -> Self {
        self.writer = AtomicWriter::with_backend(Arc::clone(&backend), self.scratch_dir.clone())
            .backup_suffix(self.backup_suffix.clone());
        self.backend = backend;
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_expander(mut self, expander: Arc<dyn ExperimentExpander>) -> Self {
        self.expander = expander;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registry to add application kinds to.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn execution(&self) -> &ExecutionConfig {
        &self.execution
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Builds a tree from document text and replays `Loaded` over it.
    pub fn load_str(&self, text: &str) -> Result<LoadOutcome> {
        let mut tree = self.serializer.deserialize(text, &self.registry)?;
        let root = tree.root();
        let errors = events::replay_loaded(&mut tree, root);
        Ok(LoadOutcome {
            tree,
            errors,
            file: None,
        })
    }

    /// Reads a document and records `path` as the file identity of every simulation.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<LoadOutcome> {
        let path = path.as_ref();
        let text = self
            .backend
            .read_to_string(path)
            .map_err(|source| PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut tree = self
            .serializer
            .deserialize(&text, &self.registry)
            .map_err(|source| PersistenceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        run::propagate_file(&mut tree, Some(path));
        let root = tree.root();
        let errors = events::replay_loaded(&mut tree, root);

        tracing::info!(
            path = %path.display(),
            nodes = tree.len(),
            load_errors = errors.len(),
            "document loaded"
        );
        Ok(LoadOutcome {
            tree,
            errors,
            file: Some(path.to_path_buf()),
        })
    }

    /// Brings a document to the current version in place.
    ///
    /// Returns the version the file was at before the upgrade.
    pub fn upgrade_file(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let parse_error = |source: FormatError| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let text = self
            .backend
            .read_to_string(path)
            .map_err(|source| PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut raw: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| parse_error(e.into()))?;
        let from = self.serializer.upgrade(&mut raw).map_err(parse_error)?;

        let outcome = self.load_file(path)?;
        self.write(&outcome.tree, path)?;
        tracing::info!(path = %path.display(), from, "document upgraded");
        Ok(from)
    }

    // ========================================================================
    // Runs
    // ========================================================================

    /// Produces the runs `node` stands for.
    ///
    /// A simulation yields a single copy, an experiment yields its factor
    /// combinations, and any other node yields every simulation beneath it
    /// followed by the runs of every experiment beneath it. Base simulations
    /// of experiments are not run on their own. Each copy has the template's
    /// replacements substituted before factor levels are applied.
    pub fn expand_runs(
        &self,
        tree: &Tree,
        node: NodeId,
        file: Option<&Path>,
    ) -> Result<Vec<RunInstance>> {
        let prepare = |run: &mut RunInstance| -> Result<()> {
            substitute(tree, run.tree_mut()).map(drop)
        };
        let (simulations, experiments) = runnable_nodes(tree, node);

        let mut runs = Vec::new();
        for id in simulations {
            let mut run = RunInstance::clone_from(tree, id)?;
            prepare(&mut run)?;
            run.load()?;
            runs.push(run);
        }
        for id in experiments {
            runs.extend(self.expander.create(tree, id, &prepare)?);
        }
        for run in &mut runs {
            run.set_file(file);
        }
        tracing::debug!(from = %tree.full_path(node), runs = runs.len(), "expanded runs");
        Ok(runs)
    }

    /// Names of every run the whole document would produce, without cloning.
    ///
    /// Plain simulations come first, then the runs of each experiment.
    pub fn simulation_names(&self, tree: &Tree) -> Result<Vec<String>> {
        let (simulations, experiments) = runnable_nodes(tree, tree.root());
        let mut names: Vec<String> = simulations
            .iter()
            .filter_map(|&id| tree.name(id))
            .map(str::to_string)
            .collect();
        for id in experiments {
            names.extend(self.expander.names(tree, id)?);
        }
        Ok(names)
    }

    /// Swaps in the replacement subtrees held by `template`'s `Replacements`
    /// node and replays `Loaded` on each inserted subtree.
    ///
    /// Every node in a run whose kind and name (ignoring case) match a
    /// replacement is replaced, at the same position, by a copy of it.
    /// Returns the number of nodes replaced.
    pub fn apply_substitutions(&self, template: &Tree, runs: &mut [RunInstance]) -> Result<usize> {
        let mut replaced = 0;
        for run in runs.iter_mut() {
            let inserted = substitute(template, run.tree_mut())?;
            for &id in &inserted {
                if !run.tree().contains(id) {
                    continue;
                }
                let errors = events::replay_loaded(run.tree_mut(), id);
                if !errors.is_empty() {
                    return Err(HostError::LoadFailed {
                        run: run.name().to_string(),
                        errors,
                    });
                }
            }
            replaced += inserted.len();
        }
        Ok(replaced)
    }

    /// Expands the runs for `simulation`, or for the whole document when no
    /// name is given.
    pub fn runs_for(
        &self,
        outcome: &LoadOutcome,
        simulation: Option<&str>,
    ) -> Result<Vec<RunInstance>> {
        let tree = &outcome.tree;
        let node = match simulation {
            Some(name) => locator::find_by_name(tree, tree.root(), name)
                .ok_or_else(|| HostError::ModelNotFound(name.to_string()))?,
            None => tree.root(),
        };
        let runs = self.expand_runs(tree, node, outcome.file.as_deref())?;
        if runs.is_empty() {
            return Err(HostError::NoSimulation);
        }
        Ok(runs)
    }

    /// Grafts a copy of `source_id` under `parent` in a run and replays
    /// `Loaded` on it.
    ///
    /// When the run is bound the new nodes are bound as well, and every
    /// still-unset slot elsewhere in the run that one of them satisfies is
    /// filled. A copy that fails to load is removed again.
    pub fn add_model(
        &self,
        run: &mut RunInstance,
        parent: NodeId,
        source: &Tree,
        source_id: NodeId,
    ) -> Result<NodeId> {
        let index = run.tree().children(parent).len();
        let inserted = run.tree_mut().graft(parent, index, source, source_id)?;

        let errors = events::replay_loaded(run.tree_mut(), inserted);
        if !errors.is_empty() {
            run.tree_mut().remove_child(parent, inserted)?;
            return Err(HostError::LoadFailed {
                run: run.name().to_string(),
                errors,
            });
        }

        if matches!(run.state(), RunState::Bound | RunState::Executing) {
            for id in run.tree().subtree(inserted) {
                binder::bind_with_back_references(run.tree_mut(), id)?;
            }
        }
        tracing::debug!(run = %run.name(), node = %run.tree().full_path(inserted), "model added");
        Ok(inserted)
    }

    // ========================================================================
    // Binding and Execution
    // ========================================================================

    /// Binds every dependency in the run. Returns the number of slots filled.
    pub fn bind(&self, run: &mut RunInstance) -> Result<usize> {
        let root = run.root();
        let bound = binder::bind_subtree(run.tree_mut(), root)?;
        run.set_state(RunState::Bound);
        Ok(bound)
    }

    pub fn unbind(&self, run: &mut RunInstance) {
        let root = run.root();
        binder::unbind_subtree(run.tree_mut(), root);
        run.set_state(RunState::Loaded);
    }

    /// Binds, executes and unbinds one run.
    ///
    /// The run is unbound on every exit path, including a panicking executor.
    pub fn execute(
        &self,
        run: &mut RunInstance,
        executor: &mut dyn Executor,
    ) -> Result<ExecutionSummary> {
        let mut guard = BoundRun { run };
        let root = guard.run.root();
        binder::bind_subtree(guard.run.tree_mut(), root)?;
        guard.run.set_state(RunState::Executing);

        let summary = executor.execute(guard.run.tree_mut(), root)?;
        tracing::info!(run = %guard.run.name(), steps = summary.steps, "run completed");
        Ok(summary)
    }

    /// Executes independent runs, on a thread pool when parallel execution
    /// is enabled. A failing or panicking run does not affect the others.
    pub fn execute_all<F>(&self, runs: Vec<RunInstance>, make_executor: F) -> Vec<RunOutcome>
    where
        F: Fn(&RunInstance) -> Box<dyn Executor> + Sync,
    {
        let run_one = |mut run: RunInstance| {
            let name = run.name().to_string();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut executor = make_executor(&run);
                self.execute(&mut run, executor.as_mut())
            }))
            .unwrap_or_else(|_| Err(HostError::Panicked(name.clone())));
            if let Err(error) = &result {
                tracing::warn!(run = %name, %error, "run failed");
            }
            RunOutcome { run, result }
        };

        match self.thread_pool(runs.len()) {
            Some(pool) => pool.install(|| runs.into_par_iter().map(&run_one).collect()),
            None => runs.into_iter().map(&run_one).collect(),
        }
    }

    fn thread_pool(&self, runs: usize) -> Option<rayon::ThreadPool> {
        if !self.execution.parallel || runs < 2 {
            return None;
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.execution.threads)
            .build()
            .inspect_err(|error| {
                tracing::warn!(%error, "thread pool unavailable, running sequentially");
            })
            .ok()
    }

    /// Calls `f` with a bound copy of the first simulation and the node
    /// named `model` in it. The live tree is not modified.
    pub fn inspect<R>(
        &self,
        tree: &Tree,
        model: &str,
        f: impl FnOnce(&Tree, NodeId) -> R,
    ) -> Result<R> {
        let simulation = tree
            .subtree(tree.root())
            .into_iter()
            .find(|&id| tree.node(id).is_some_and(|n| n.kind() == SIMULATION))
            .ok_or(HostError::NoSimulation)?;

        let mut run = RunInstance::clone_from(tree, simulation)?;
        substitute(tree, run.tree_mut())?;
        run.load()?;
        self.bind(&mut run)?;

        let address = if model.starts_with('[') {
            model.to_string()
        } else {
            format!("[{model}]")
        };
        let found = locator::find(run.tree(), run.root(), &address);
        let result = found.map(|target| f(run.tree(), target));
        self.unbind(&mut run);
        result.map_err(|_| HostError::ModelNotFound(model.to_string()))
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Serializes `tree` and atomically replaces the file at `path`.
    ///
    /// Serialization happens before any file is touched.
    pub fn write(&self, tree: &Tree, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.serializer.serialize(tree)?;
        self.writer
            .write(path, text.as_bytes())
            .map_err(|source| PersistenceError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), bytes = text.len(), "document written");
        Ok(())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("registry", &self.registry)
            .field("execution", &self.execution)
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

/// Unbinds the run when dropped.
struct BoundRun<'r> {
    run: &'r mut RunInstance,
}

impl Drop for BoundRun<'_> {
    fn drop(&mut self) {
        let root = self.run.root();
        binder::unbind_subtree(self.run.tree_mut(), root);
        self.run.set_state(RunState::Loaded);
    }
}

/// Nodes under `node` (inclusive) that produce runs, in pre-order, split
/// into simulations and experiments.
///
/// The walk stops at experiments and simulations, so the base simulation of
/// an experiment is only reached through the experiment. `Replacements`
/// folders are never entered.
fn runnable_nodes(tree: &Tree, node: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
    let (mut simulations, mut experiments) = (Vec::new(), Vec::new());
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        let Some(current) = tree.node(id) else { continue };
        match current.kind() {
            SIMULATION => simulations.push(id),
            EXPERIMENT => experiments.push(id),
            REPLACEMENTS => {}
            _ => stack.extend(tree.children(id).iter().rev()),
        }
    }
    (simulations, experiments)
}

/// Replaces every node of `tree` whose kind and name (ignoring case) match a
/// child of `template`'s `Replacements` node with a copy of that child.
///
/// Returns the inserted subtree roots. `Loaded` is not replayed on them.
fn substitute(template: &Tree, tree: &mut Tree) -> Result<Vec<NodeId>> {
    let root = template.root();
    let Some(replacements) = template
        .children(root)
        .iter()
        .copied()
        .find(|&id| template.node(id).is_some_and(|n| n.kind() == REPLACEMENTS))
    else {
        return Ok(Vec::new());
    };

    let mut inserted = Vec::new();
    for &replacement in template.children(replacements) {
        let Some(source) = template.node(replacement) else { continue };
        let (kind, name) = (source.kind(), source.name().to_lowercase());
        let targets: Vec<NodeId> = tree
            .subtree(tree.root())
            .into_iter()
            .filter(|&id| {
                tree.node(id)
                    .is_some_and(|n| n.kind() == kind && n.name().to_lowercase() == name)
            })
            .collect();

        for target in targets {
            if !tree.contains(target) {
                continue;
            }
            let Some(parent) = tree.parent(target) else { continue };
            let Some(index) = tree.children(parent).iter().position(|&c| c == target) else {
                continue;
            };
            let copy = tree.graft(parent, index, template, replacement)?;
            tree.remove_child(parent, target)?;
            tracing::debug!(node = %tree.full_path(copy), "replaced node");
            inserted.push(copy);
        }
    }
    Ok(inserted)
}

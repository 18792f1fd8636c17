//! Tests for the host lifecycle.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arbor_config::ArborConfig;
use arbor_format::{FormatError, Serializer, to_record};
use arbor_io::{FileBackend, IoError, StdBackend};
use arbor_kernel::{
    Component, DependencySlot, HookContext, HookError, OnCommencing, OnTimestep, Registry,
    Timestep, Tree, binder, locator,
};
use arbor_types::Value;

use crate::{ClockExecutor, ExecutionError, Executor, Host, HostError, PersistenceError, RunState};

// ============================================================================
// Test Components
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Leaf;

impl Component for Leaf {
    fn kind(&self) -> &'static str {
        "Leaf"
    }

    fn provides(&self) -> &'static [&'static str] {
        &["Organ"]
    }
}

#[derive(Debug, Clone, Default)]
struct RootOrgan;

impl Component for RootOrgan {
    fn kind(&self) -> &'static str {
        "Root"
    }

    fn provides(&self) -> &'static [&'static str] {
        &["Organ"]
    }
}

/// Needs an organ called `Leaf` and counts the steps it sees.
#[derive(Debug, Clone, Default)]
struct Plant {
    steps: i64,
}

impl Component for Plant {
    fn kind(&self) -> &'static str {
        "Plant"
    }

    fn dependencies(&self) -> &'static [DependencySlot] {
        const SLOTS: &[DependencySlot] = &[DependencySlot::required("Leaf", "Organ")];
        SLOTS
    }

    fn default_attributes(&self) -> arbor_types::Attributes {
        let mut attributes = arbor_types::Attributes::new();
        attributes.insert("FailAt".into(), Value::Int(-1));
        attributes
    }

    fn member(&self, name: &str) -> Option<Value> {
        (name == "Steps").then_some(Value::Int(self.steps))
    }

    fn timestep_hook(&mut self) -> Option<&mut dyn OnTimestep> {
        Some(self)
    }
}

impl OnTimestep for Plant {
    fn timestep(&mut self, cx: &mut HookContext<'_>, step: Timestep) -> Result<(), HookError> {
        cx.dependency("Leaf")
            .ok_or_else(|| HookError::failed("Leaf is unbound"))?;
        if cx.attribute("FailAt").and_then(Value::as_int) == Some(step.index as i64) {
            return Err(HookError::failed("scripted failure"));
        }
        self.steps += 1;
        Ok(())
    }
}

/// Reads an organ called `Leaf` when one is around.
#[derive(Debug, Clone, Default)]
struct Gauge;

impl Component for Gauge {
    fn kind(&self) -> &'static str {
        "Gauge"
    }

    fn dependencies(&self) -> &'static [DependencySlot] {
        const SLOTS: &[DependencySlot] = &[DependencySlot::optional("Leaf", "Organ")];
        SLOTS
    }
}

#[derive(Debug, Clone, Default)]
struct Exploder;

impl Component for Exploder {
    fn kind(&self) -> &'static str {
        "Exploder"
    }

    fn commencing_hook(&mut self) -> Option<&mut dyn OnCommencing> {
        Some(self)
    }
}

impl OnCommencing for Exploder {
    fn commencing(&mut self, _cx: &mut HookContext<'_>) -> Result<(), HookError> {
        panic!("exploded on purpose");
    }
}

// ============================================================================
// Test Collaborators
// ============================================================================

/// Local file system, except that moves out of `scratch` fail.
#[derive(Debug)]
struct FailingMoves {
    inner: StdBackend,
    scratch: PathBuf,
}

impl FileBackend for FailingMoves {
    fn read_to_string(&self, path: &Path) -> Result<String, IoError> {
        self.inner.read_to_string(path)
    }

    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), IoError> {
        self.inner.write_all(path, data)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), IoError> {
        if from.starts_with(&self.scratch) {
            return Err(IoError::from_io(
                "rename",
                from,
                std::io::Error::from(ErrorKind::PermissionDenied),
            ));
        }
        self.inner.rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), IoError> {
        self.inner.copy(from, to)
    }

    fn remove(&self, path: &Path) -> Result<(), IoError> {
        self.inner.remove(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), IoError> {
        self.inner.create_dir_all(path)
    }
}

/// Counts every call that would touch the file system.
#[derive(Debug, Default)]
struct CountingBackend {
    calls: Mutex<usize>,
}

impl CountingBackend {
    fn touch(&self) {
        *self.calls.lock().unwrap() += 1;
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl FileBackend for CountingBackend {
    fn read_to_string(&self, path: &Path) -> Result<String, IoError> {
        self.touch();
        Err(IoError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn write_all(&self, _path: &Path, _data: &[u8]) -> Result<(), IoError> {
        self.touch();
        Ok(())
    }

    fn rename(&self, _from: &Path, _to: &Path) -> Result<(), IoError> {
        self.touch();
        Ok(())
    }

    fn copy(&self, _from: &Path, _to: &Path) -> Result<(), IoError> {
        self.touch();
        Ok(())
    }

    fn remove(&self, _path: &Path) -> Result<(), IoError> {
        self.touch();
        Ok(())
    }

    fn exists(&self, _path: &Path) -> bool {
        self.touch();
        false
    }

    fn create_dir_all(&self, _path: &Path) -> Result<(), IoError> {
        self.touch();
        Ok(())
    }
}

struct BrokenSerializer;

impl Serializer for BrokenSerializer {
    fn upgrade(&self, _raw: &mut serde_json::Value) -> arbor_format::Result<u64> {
        Ok(u64::from(arbor_format::CURRENT_VERSION))
    }

    fn serialize(&self, _tree: &Tree) -> arbor_format::Result<String> {
        Err(FormatError::Malformed("cannot serialize".into()))
    }

    fn deserialize(&self, _text: &str, _registry: &Registry) -> arbor_format::Result<Tree> {
        Err(FormatError::Malformed("cannot deserialize".into()))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn host_with(config: &ArborConfig) -> Host {
    let mut host = Host::new(config);
    host.registry_mut()
        .register::<Leaf>()
        .register::<RootOrgan>()
        .register::<Plant>()
        .register::<Gauge>()
        .register::<Exploder>();
    host
}

fn host() -> Host {
    host_with(&ArborConfig::sequential())
}

fn document(simulations: &str) -> String {
    format!(
        r#"{{ "version": 3, "root": {{ "kind": "Simulations", "name": "Simulations", "children": [{simulations}] }} }}"#
    )
}

fn plant_simulation(name: &str, end: &str) -> String {
    format!(
        r#"{{ "kind": "Simulation", "name": "{name}", "children": [
            {{ "kind": "Clock", "name": "Clock", "attributes": {{ "Start": "2000-01-01", "End": "{end}" }} }},
            {{ "kind": "Leaf", "name": "Leaf" }},
            {{ "kind": "Root", "name": "Root" }},
            {{ "kind": "Plant", "name": "Wheat" }}
        ] }}"#
    )
}

fn scratch_config(scratch: &Path) -> ArborConfig {
    let mut config = ArborConfig::sequential();
    config.persistence.scratch_dir = Some(scratch.to_path_buf());
    config
}

// ============================================================================
// Binding Tests
// ============================================================================

#[test]
fn several_candidates_are_disambiguated_by_field_name() {
    let host = host();
    let outcome = host
        .load_str(&document(&plant_simulation("Base", "2000-01-01")))
        .unwrap();
    let mut runs = host.runs_for(&outcome, None).unwrap();
    let run = &mut runs[0];

    host.bind(run).unwrap();

    let tree = run.tree();
    let wheat = locator::find_by_name(tree, run.root(), "Wheat").unwrap();
    let leaf = locator::find(tree, run.root(), "Leaf").unwrap();
    assert_eq!(tree.binding(wheat, "Leaf"), Some(leaf));
    assert_eq!(run.state(), RunState::Bound);

    host.unbind(run);
    assert!(binder::is_unbound(run.tree(), run.root()));
    assert_eq!(run.state(), RunState::Loaded);
}

#[test]
fn missing_required_dependency_fails_to_bind() {
    let host = host();
    let doc = document(
        r#"{ "kind": "Simulation", "name": "Base", "children": [
            { "kind": "Plant", "name": "Wheat" }
        ] }"#,
    );
    let outcome = host.load_str(&doc).unwrap();
    let mut runs = host.runs_for(&outcome, None).unwrap();

    let err = host.bind(&mut runs[0]).unwrap_err();

    match err {
        HostError::Binding(error) => {
            assert_eq!(error.owner_path, ".Base.Wheat");
            assert_eq!(error.candidates, 0);
        }
        other => panic!("expected a binding error, got {other}"),
    }
}

fn gauge_run(host: &Host) -> crate::RunInstance {
    let doc = document(
        r#"{ "kind": "Simulation", "name": "Base", "children": [
            { "kind": "Gauge", "name": "Gauge" }
        ] }"#,
    );
    let outcome = host.load_str(&doc).unwrap();
    host.runs_for(&outcome, None).unwrap().remove(0)
}

#[test]
fn model_added_to_a_bound_run_fills_unset_slots() {
    let host = host();
    let mut run = gauge_run(&host);
    host.bind(&mut run).unwrap();
    let gauge = locator::find(run.tree(), run.root(), "Gauge").unwrap();
    assert_eq!(run.tree().binding(gauge, "Leaf"), None);

    let source = Tree::new(Box::new(Leaf), "Leaf");
    let root = run.root();
    let leaf = host.add_model(&mut run, root, &source, source.root()).unwrap();

    assert_eq!(run.tree().binding(gauge, "Leaf"), Some(leaf));
    assert_eq!(locator::find(run.tree(), run.root(), "Leaf").unwrap(), leaf);

    host.unbind(&mut run);
    assert!(binder::is_unbound(run.tree(), run.root()));
}

#[test]
fn model_added_to_an_unbound_run_stays_unbound() {
    let host = host();
    let mut run = gauge_run(&host);

    let source = Tree::new(Box::new(Leaf), "Leaf");
    let root = run.root();
    host.add_model(&mut run, root, &source, source.root()).unwrap();

    let gauge = locator::find(run.tree(), run.root(), "Gauge").unwrap();
    assert_eq!(run.tree().binding(gauge, "Leaf"), None);
    assert_eq!(run.state(), RunState::Loaded);
}

// ============================================================================
// Execution Tests
// ============================================================================

#[test]
fn execute_steps_every_day_and_unbinds() {
    let host = host();
    let outcome = host
        .load_str(&document(&plant_simulation("Base", "2000-01-03")))
        .unwrap();
    let mut runs = host.runs_for(&outcome, None).unwrap();
    let run = &mut runs[0];

    let summary = host.execute(run, &mut ClockExecutor).unwrap();

    assert_eq!(summary.steps, 3);
    assert!(binder::is_unbound(run.tree(), run.root()));
    assert_eq!(run.state(), RunState::Loaded);
    assert_eq!(
        locator::get_value(run.tree(), run.root(), "Wheat.Steps").unwrap(),
        Value::Int(3)
    );
}

#[test]
fn failing_step_still_unbinds() {
    let host = host();
    let outcome = host
        .load_str(&document(&plant_simulation("Base", "2000-01-05")))
        .unwrap();
    let mut runs = host.runs_for(&outcome, None).unwrap();
    let run = &mut runs[0];
    let root = run.root();
    locator::set(run.tree_mut(), root, "Wheat.FailAt", Value::Int(1)).unwrap();

    let err = host.execute(run, &mut ClockExecutor).unwrap_err();

    assert!(matches!(err, HostError::Execution(ExecutionError::Event(_))));
    assert!(binder::is_unbound(run.tree(), run.root()));
    assert_eq!(run.state(), RunState::Loaded);
}

#[test]
fn simulation_without_clock_is_reported() {
    let host = host();
    let outcome = host
        .load_str(&document(r#"{ "kind": "Simulation", "name": "Empty" }"#))
        .unwrap();
    let mut runs = host.runs_for(&outcome, None).unwrap();

    let err = host.execute(&mut runs[0], &mut ClockExecutor).unwrap_err();

    assert!(matches!(err, HostError::Execution(ExecutionError::NoClock(_))));
}

#[test]
fn runs_are_isolated_from_each_other() {
    let host = host_with(&ArborConfig::default());
    let exploding = r#"{ "kind": "Simulation", "name": "Bad", "children": [
        { "kind": "Clock", "name": "Clock" },
        { "kind": "Exploder", "name": "Boom" }
    ] }"#;
    let doc = document(&format!(
        "{}, {exploding}, {}",
        plant_simulation("First", "2000-01-02"),
        plant_simulation("Last", "2000-01-04")
    ));
    let outcome = host.load_str(&doc).unwrap();
    let runs = host.runs_for(&outcome, None).unwrap();

    let outcomes = host.execute_all(runs, |_| Box::new(ClockExecutor) as Box<dyn Executor>);

    let names: Vec<_> = outcomes.iter().map(|o| o.run.name()).collect();
    assert_eq!(names, ["First", "Bad", "Last"]);
    assert_eq!(outcomes[0].result.as_ref().unwrap().steps, 2);
    assert!(matches!(outcomes[1].result, Err(HostError::Panicked(ref run)) if run == "Bad"));
    assert_eq!(outcomes[2].result.as_ref().unwrap().steps, 4);
    assert!(outcomes.iter().all(|o| binder::is_unbound(o.run.tree(), o.run.root())));
}

#[test]
fn inspect_leaves_the_document_untouched() {
    let host = host();
    let outcome = host
        .load_str(&document(&plant_simulation("Base", "2000-01-01")))
        .unwrap();
    let before = to_record(&outcome.tree, outcome.tree.root()).unwrap();

    let bound = host
        .inspect(&outcome.tree, "Wheat", |tree, wheat| {
            tree.binding(wheat, "Leaf").is_some()
        })
        .unwrap();

    assert!(bound);
    assert!(binder::is_unbound(&outcome.tree, outcome.tree.root()));
    assert_eq!(to_record(&outcome.tree, outcome.tree.root()).unwrap(), before);
    assert!(matches!(
        host.inspect(&outcome.tree, "Barley", |_, _| ()),
        Err(HostError::ModelNotFound(_))
    ));
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn written_documents_read_back_identically() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wheat.arbor");
    let host = host_with(&scratch_config(scratch.path()));
    let outcome = host
        .load_str(&document(&plant_simulation("Base", "2000-03-01")))
        .unwrap();

    host.write(&outcome.tree, &path).unwrap();
    let back = host.load_file(&path).unwrap();

    assert_eq!(
        to_record(&back.tree, back.tree.root()).unwrap(),
        to_record(&outcome.tree, outcome.tree.root()).unwrap()
    );
    assert_eq!(back.file.as_deref(), Some(path.as_path()));
    assert_eq!(
        locator::get_value(&back.tree, back.tree.root(), ".Simulations.Base.FileName").unwrap(),
        Value::Text(path.display().to_string())
    );
}

#[test]
fn failed_final_move_keeps_the_original_file() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wheat.arbor");
    std::fs::write(&path, "original").unwrap();

    let host = host_with(&scratch_config(scratch.path())).with_backend(Arc::new(FailingMoves {
        inner: StdBackend,
        scratch: scratch.path().to_path_buf(),
    }));
    let outcome = host
        .load_str(&document(&plant_simulation("Base", "2000-01-01")))
        .unwrap();

    let err = host.write(&outcome.tree, &path).unwrap_err();

    assert!(matches!(
        err,
        HostError::Persistence(PersistenceError::Write { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
}

#[test]
fn serialization_failure_touches_no_files() {
    let backend = Arc::new(CountingBackend::default());
    let template = host();
    let outcome = template
        .load_str(&document(&plant_simulation("Base", "2000-01-01")))
        .unwrap();
    let host = host()
        .with_backend(backend.clone())
        .with_serializer(Arc::new(BrokenSerializer));

    let err = host.write(&outcome.tree, "wheat.arbor").unwrap_err();

    assert!(matches!(err, HostError::Format(_)));
    assert_eq!(backend.calls(), 0);
}

#[test]
fn unreadable_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.arbor");

    let err = host().load_file(&path).unwrap_err();

    match err {
        HostError::Persistence(PersistenceError::Read { path: reported, .. }) => {
            assert_eq!(reported, path);
        }
        other => panic!("expected a read error, got {other}"),
    }
}

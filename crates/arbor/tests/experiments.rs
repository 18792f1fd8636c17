//! End-to-end tests over documents that use the built-in kinds only.

use arbor::builtin::Report;
use arbor::{
    ArborConfig, ClockExecutor, Executor, ExperimentError, Host, HostError, Value, locator,
};

fn host() -> Host {
    Host::new(&ArborConfig::sequential())
}

const EXPERIMENT: &str = r#"{
  "version": 3,
  "root": {
    "kind": "Simulations",
    "name": "Simulations",
    "children": [
      {
        "kind": "Experiment",
        "name": "Exp",
        "children": [
          {
            "kind": "Simulation",
            "name": "Base",
            "children": [
              { "kind": "Clock", "name": "Clock",
                "attributes": { "Start": "2000-01-01", "End": "2000-01-02" } },
              { "kind": "Model", "name": "Fert", "attributes": { "Amount": 0 } },
              { "kind": "Report", "name": "Report",
                "attributes": { "VariableNames": [
                  "[Clock].Today", "[Fert].Amount as Amount", "  ", "[clock].today"
                ] } }
            ]
          },
          {
            "kind": "Factors",
            "name": "Factors",
            "children": [
              { "kind": "Factor", "name": "N",
                "attributes": { "Path": "Fert.Amount", "Values": [0, 50, 100] } }
            ]
          }
        ]
      },
      {
        "kind": "Simulation",
        "name": "Plain",
        "children": [ { "kind": "Clock", "name": "Clock" } ]
      }
    ]
  }
}"#;

#[test]
fn experiment_expands_to_one_run_per_level() {
    let host = host();
    let outcome = host.load_str(EXPERIMENT).unwrap();
    assert!(outcome.is_clean());

    let exp = locator::find(&outcome.tree, outcome.tree.root(), ".Simulations.Exp").unwrap();
    let runs = host.expand_runs(&outcome.tree, exp, None).unwrap();

    let names: Vec<_> = runs.iter().map(|r| r.name()).collect();
    assert_eq!(names, ["ExpN0", "ExpN50", "ExpN100"]);
    for (run, level) in runs.iter().zip([0, 50, 100]) {
        assert_eq!(
            locator::get_value(run.tree(), run.root(), "Fert.Amount").unwrap(),
            Value::Int(level)
        );
        assert_eq!(run.factors(), [("N".to_string(), Value::Int(level))]);
        assert!(run.tree().parent(run.root()).is_none());
    }

    // The template is never modified by expansion.
    assert_eq!(
        locator::get_value(&outcome.tree, outcome.tree.root(), ".Simulations.Exp.Base.Fert.Amount")
            .unwrap(),
        Value::Int(0)
    );
}

#[test]
fn simulation_names_match_expanded_runs() {
    let host = host();
    let outcome = host.load_str(EXPERIMENT).unwrap();

    let names = host.simulation_names(&outcome.tree).unwrap();
    let runs = host.runs_for(&outcome, None).unwrap();

    assert_eq!(names, ["Plain", "ExpN0", "ExpN50", "ExpN100"]);
    assert_eq!(
        runs.iter().map(|r| r.name().to_string()).collect::<Vec<_>>(),
        names
    );
}

#[test]
fn report_records_factor_and_variable_columns() {
    let host = host();
    let outcome = host.load_str(EXPERIMENT).unwrap();
    let mut runs = host.runs_for(&outcome, Some("Exp")).unwrap();
    let run = &mut runs[1];

    host.execute(run, &mut ClockExecutor).unwrap();

    let report_id = locator::find(run.tree(), run.root(), "Report").unwrap();
    let report = run.tree().downcast::<Report>(report_id).unwrap();
    assert_eq!(report.headings(), ["N", "[Clock].Today", "Amount"]);
    assert_eq!(
        report.rows(),
        [
            vec![Value::Int(50), Value::from("2000-01-01"), Value::Int(50)],
            vec![Value::Int(50), Value::from("2000-01-02"), Value::Int(50)],
        ]
    );
    assert_eq!(
        locator::get_value(run.tree(), run.root(), "Report.RowCount").unwrap(),
        Value::Int(2)
    );
}

#[test]
fn every_run_executes_in_parallel() {
    let host = Host::new(&ArborConfig::default());
    let outcome = host.load_str(EXPERIMENT).unwrap();
    let runs = host.runs_for(&outcome, None).unwrap();

    let outcomes = host.execute_all(runs, |_| Box::new(ClockExecutor) as Box<dyn Executor>);

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(arbor::RunOutcome::is_ok));
    assert_eq!(outcomes[0].run.name(), "Plain");
    assert_eq!(outcomes[0].result.as_ref().unwrap().steps, 1);
}

#[test]
fn factor_without_path_is_a_load_error() {
    let doc = EXPERIMENT.replace(r#""Path": "Fert.Amount""#, r#""Path": """#);
    let host = host();

    let outcome = host.load_str(&doc).unwrap();

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path, ".Simulations.Exp.Factors.N");
    assert!(matches!(
        host.runs_for(&outcome, Some("Exp")),
        Err(HostError::Experiment(ExperimentError::InvalidFactor { .. }))
    ));
}

#[test]
fn factor_with_wrong_type_names_the_run() {
    let doc = EXPERIMENT.replace("[0, 50, 100]", r#"["low", "high"]"#);
    let host = host();
    let outcome = host.load_str(&doc).unwrap();

    let err = host.runs_for(&outcome, Some("Exp")).unwrap_err();

    match err {
        HostError::Experiment(ExperimentError::Apply { run, factor, .. }) => {
            assert_eq!(run, "ExpNlow");
            assert_eq!(factor, "N");
        }
        other => panic!("expected an apply error, got {other}"),
    }
}

#[test]
fn replacements_are_substituted_into_every_run() {
    let doc = r#"{
      "version": 3,
      "root": {
        "kind": "Simulations",
        "name": "Simulations",
        "children": [
          { "kind": "Replacements", "name": "Replacements", "children": [
            { "kind": "Model", "name": "Fert", "attributes": { "Amount": 99 } }
          ] },
          { "kind": "Simulation", "name": "A", "children": [
            { "kind": "Clock", "name": "Clock" },
            { "kind": "Model", "name": "fert", "attributes": { "Amount": 1 } },
            { "kind": "Model", "name": "Other" }
          ] },
          { "kind": "Simulation", "name": "B", "children": [
            { "kind": "Model", "name": "FERT", "attributes": { "Amount": 2 } }
          ] }
        ]
      }
    }"#;
    let host = host();
    let outcome = host.load_str(doc).unwrap();

    let runs = host.runs_for(&outcome, None).unwrap();

    assert_eq!(runs.len(), 2);
    for run in &runs {
        assert_eq!(
            locator::get_value(run.tree(), run.root(), "Fert.Amount").unwrap(),
            Value::Int(99)
        );
    }
    let a = &runs[0];
    let names: Vec<_> = a
        .tree()
        .children(a.root())
        .iter()
        .map(|&id| a.tree().name(id).unwrap())
        .collect();
    assert_eq!(names, ["Clock", "Fert", "Other"]);
}

#[test]
fn factor_levels_override_replacements() {
    let replacements = r#"{ "kind": "Replacements", "name": "Replacements", "children": [
            { "kind": "Model", "name": "Fert", "attributes": { "Amount": 7 } }
          ] },
      {
        "kind": "Experiment","#;
    let doc = EXPERIMENT.replacen(
        r#"{
        "kind": "Experiment","#,
        replacements,
        1,
    );
    let host = host();
    let outcome = host.load_str(&doc).unwrap();

    let runs = host.runs_for(&outcome, Some("Exp")).unwrap();

    let amounts: Vec<_> = runs
        .iter()
        .map(|run| locator::get_value(run.tree(), run.root(), "Fert.Amount").unwrap())
        .collect();
    assert_eq!(amounts, [Value::Int(0), Value::Int(50), Value::Int(100)]);
}

#[test]
fn substitutions_from_another_template_replace_and_reload() {
    let doc = r#"{ "version": 3, "root": { "kind": "Simulations", "name": "Simulations",
      "children": [
        { "kind": "Simulation", "name": "A", "children": [
          { "kind": "Model", "name": "Fert", "attributes": { "Amount": 1 } }
        ] }
      ] } }"#;
    let template = r#"{ "version": 3, "root": { "kind": "Simulations", "name": "Simulations",
      "children": [
        { "kind": "Replacements", "name": "Replacements", "children": [
          { "kind": "Model", "name": "FERT", "attributes": { "Amount": 5 } }
        ] }
      ] } }"#;
    let host = host();
    let outcome = host.load_str(doc).unwrap();
    let template = host.load_str(template).unwrap();
    let mut runs = host.runs_for(&outcome, None).unwrap();

    let replaced = host.apply_substitutions(&template.tree, &mut runs).unwrap();

    assert_eq!(replaced, 1);
    assert_eq!(
        locator::get_value(runs[0].tree(), runs[0].root(), "FERT.Amount").unwrap(),
        Value::Int(5)
    );
}

#[test]
fn replacements_folder_is_not_run() {
    let doc = r#"{ "version": 3, "root": { "kind": "Simulations", "name": "Simulations",
      "children": [
        { "kind": "Replacements", "name": "Replacements", "children": [
          { "kind": "Simulation", "name": "Spare" }
        ] },
        { "kind": "Simulation", "name": "A" }
      ] } }"#;
    let host = host();
    let outcome = host.load_str(doc).unwrap();

    assert_eq!(host.simulation_names(&outcome.tree).unwrap(), ["A"]);
}

#[test]
fn unknown_simulation_name_is_reported() {
    let host = host();
    let outcome = host.load_str(EXPERIMENT).unwrap();

    assert!(matches!(
        host.runs_for(&outcome, Some("Missing")),
        Err(HostError::ModelNotFound(_))
    ));
}

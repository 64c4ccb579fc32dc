//! Library integration tests.

use std::collections::BTreeSet;
use std::fs;

use envy::environment::{EnvState, EnvironmentId, VenvLayout};
use envy::guard::{GuardDecision, GuardToken, InvocationContext};
use envy::plan::{DependencyDiffer, DiffMode};
use envy::reconcile::{ReconcileOptions, ReconcileState, Reconciler};
use envy::scanner::{AliasTable, ImportScanner, Requirement, RequirementSet};
use envy::tooling::MockTooling;
use envy::ui::MockUI;
use envy::EnvyError;
use tempfile::TempDir;

fn required(names: &[&str]) -> RequirementSet {
    names.iter().map(|n| Requirement::from_name(n)).collect()
}

fn installed(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn error_types_are_public() {
    let err = EnvyError::ReconcileFailed {
        path: "/venvs/tool".into(),
        pending: "install ghost".into(),
    };
    assert!(err.to_string().contains("install ghost"));
    assert_eq!(err.exit_code(), 125);
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> envy::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use envy::cli::{Cli, Commands};

    let cli = Cli::parse_from(["envy", "status", "tool.py", "--json"]);
    if let Some(Commands::Status(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Status command");
    }
}

#[test]
fn fresh_environment_installs_in_name_order() {
    let differ = DependencyDiffer::new(["pip"]);
    let plan = differ.diff(&required(&["requests", "numpy"]), &installed(&[]), DiffMode::Additive);
    assert_eq!(plan.to_string(), "install numpy, install requests");
}

#[test]
fn additive_mode_keeps_extras() {
    let differ = DependencyDiffer::new(["pip"]);
    let plan = differ.diff(
        &required(&["numpy"]),
        &installed(&["numpy", "scipy"]),
        DiffMode::Additive,
    );
    assert!(plan.is_empty());
}

#[test]
fn prune_mode_removes_extras() {
    let differ = DependencyDiffer::new(["pip"]);
    let plan = differ.diff(
        &required(&["numpy"]),
        &installed(&["numpy", "scipy", "pip"]),
        DiffMode::Prune,
    );
    assert_eq!(plan.to_string(), "uninstall scipy");
}

#[test]
fn scanned_script_reconciles_to_ready() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("viewer.py");
    fs::write(
        &script,
        "import os\nimport yaml\nfrom PIL import Image\n\ndef main():\n    import requests\n",
    )
    .unwrap();

    let scanner = ImportScanner::new(AliasTable::builtin());
    let requirements = scanner.scan(&script).unwrap();
    assert!(requirements.contains("pyyaml"));
    assert!(requirements.contains("pillow"));
    assert!(requirements.contains("requests"));
    assert!(!requirements.contains("os"));

    let tooling = MockTooling::new();
    let reconciler = Reconciler::new(&tooling, &tooling);
    let layout = VenvLayout::new(temp.path().join("env"));
    let mut ui = MockUI::new();

    let outcome = reconciler
        .reconcile(&layout, &requirements, ReconcileOptions::default(), &mut ui)
        .unwrap();
    assert_eq!(outcome.states.last(), Some(&ReconcileState::Ready));
    assert_eq!(outcome.record.state, EnvState::PresentPopulated);

    let again = reconciler
        .reconcile(&layout, &requirements, ReconcileOptions::default(), &mut ui)
        .unwrap();
    assert!(again.was_noop());
}

#[test]
fn corrupt_environment_is_rebuilt() {
    let temp = TempDir::new().unwrap();
    let layout = VenvLayout::new(temp.path().join("env"));
    fs::create_dir_all(layout.root()).unwrap();
    fs::write(layout.root().join("junk"), "not a venv").unwrap();

    let tooling = MockTooling::new();
    let reconciler = Reconciler::new(&tooling, &tooling);
    assert_eq!(reconciler.probe(&layout).unwrap().state, EnvState::Corrupt);

    reconciler
        .reconcile(
            &layout,
            &required(&["numpy"]),
            ReconcileOptions::default(),
            &mut MockUI::new(),
        )
        .unwrap();

    assert!(!layout.root().join("junk").exists());
    assert!(tooling.installed(&layout).contains_key("numpy"));
    assert_eq!(
        tooling.history()[0],
        format!("create {}", layout.root().display())
    );
}

#[test]
fn guard_only_matches_its_own_environment() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.py");
    let b = temp.path().join("b.py");
    fs::write(&a, "").unwrap();
    fs::write(&b, "").unwrap();
    let id_a = EnvironmentId::for_script(&a).unwrap();
    let id_b = EnvironmentId::for_script(&b).unwrap();

    let context = InvocationContext::new(Some(GuardToken::for_environment(&id_a)));
    assert_eq!(context.decide(&id_a), GuardDecision::Reenter);
    assert_eq!(context.decide(&id_b), GuardDecision::Proceed);
    assert_eq!(InvocationContext::fresh().decide(&id_a), GuardDecision::Proceed);
}

//! Launching the target application.
//!
//! [`Launcher::launch`] runs the whole sequence for one invocation:
//! guard check, requirement collection, reconciliation and handoff to the
//! environment's interpreter. Process creation goes through
//! [`ProcessRunner`] so the sequence can be tested without spawning Python.

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::app::{environment_layout, RequirementSources, TargetApplication};
use crate::environment::{EnvironmentId, VenvLayout};
use crate::error::{EnvyError, Result};
use crate::guard::{GuardDecision, GuardToken, InvocationContext};
use crate::reconcile::{ReconcileOptions, ReconcileOutcome, Reconciler};
use crate::scanner::ImportScanner;
use crate::shell::display_command;
use crate::ui::UserInterface;

/// Variable the app directory is prepended to.
pub const PYTHONPATH_VAR: &str = "PYTHONPATH";

/// A process to start: interpreter, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Variables added to (or replacing) the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

impl ProcessSpec {
    /// `interpreter script args...` with no extra environment.
    pub fn python(interpreter: PathBuf, script: &Path, args: &[OsString]) -> Self {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(script.as_os_str().to_os_string());
        argv.extend(args.iter().cloned());
        Self {
            program: interpreter,
            args: argv,
            env: Vec::new(),
        }
    }

    /// Value of `name` in the extra environment.
    pub fn env_value(&self, name: &str) -> Option<&OsString> {
        self.env
            .iter()
            .find(|(key, _)| key.as_os_str() == name)
            .map(|(_, value)| value)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    fn display(&self) -> String {
        display_command(&self.program, &self.args)
    }
}

/// Starts the target process.
pub trait ProcessRunner {
    /// Spawn `spec` with inherited stdio and wait for its exit code.
    fn run(&self, spec: &ProcessSpec) -> Result<i32>;

    /// Replace the current process with `spec`.
    ///
    /// Only returns on platforms without `exec`, with the child's exit code,
    /// or when the replacement fails.
    fn replace(&self, spec: &ProcessSpec) -> Result<i32>;
}

/// Runs real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<i32> {
        tracing::debug!("Launching: {}", spec.display());
        let status = spec.command().status().map_err(|e| {
            tracing::debug!("Failed to start {}: {}", spec.display(), e);
            EnvyError::CommandFailed {
                command: spec.display(),
                code: None,
            }
        })?;
        Ok(exit_code_of(status))
    }

    #[cfg(unix)]
    fn replace(&self, spec: &ProcessSpec) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        tracing::debug!("Re-entering: exec {}", spec.display());
        let err = spec.command().exec();
        tracing::debug!("exec of {} failed: {}", spec.display(), err);
        Err(EnvyError::CommandFailed {
            command: spec.display(),
            code: None,
        })
    }

    #[cfg(not(unix))]
    fn replace(&self, spec: &ProcessSpec) -> Result<i32> {
        self.run(spec)
    }
}

/// Exit code of a finished child; signal deaths map to `128 + signal`.
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Records launches instead of performing them.
#[derive(Debug, Default)]
pub struct MockRunner {
    exit_code: i32,
    runs: RefCell<Vec<ProcessSpec>>,
    replacements: RefCell<Vec<ProcessSpec>>,
}

impl MockRunner {
    /// Runner whose processes all exit with `exit_code`.
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn runs(&self) -> Vec<ProcessSpec> {
        self.runs.borrow().clone()
    }

    pub fn replacements(&self) -> Vec<ProcessSpec> {
        self.replacements.borrow().clone()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<i32> {
        self.runs.borrow_mut().push(spec.clone());
        Ok(self.exit_code)
    }

    fn replace(&self, spec: &ProcessSpec) -> Result<i32> {
        self.replacements.borrow_mut().push(spec.clone());
        Ok(self.exit_code)
    }
}

/// One launch: which script, with what arguments, into which environment.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub script: PathBuf,
    pub args: Vec<OsString>,
    /// Explicit environment root instead of the derived one.
    pub venv: Option<PathBuf>,
    pub sources: RequirementSources,
    pub options: ReconcileOptions,
}

/// Sequences guard, reconciliation and handoff.
pub struct Launcher<'a> {
    context: InvocationContext,
    scanner: &'a ImportScanner,
    reconciler: &'a Reconciler<'a>,
    runner: &'a dyn ProcessRunner,
    venv_home: PathBuf,
}

impl<'a> Launcher<'a> {
    pub fn new(
        context: InvocationContext,
        scanner: &'a ImportScanner,
        reconciler: &'a Reconciler<'a>,
        runner: &'a dyn ProcessRunner,
        venv_home: PathBuf,
    ) -> Self {
        Self {
            context,
            scanner,
            reconciler,
            runner,
            venv_home,
        }
    }

    /// Resolve the target and its environment root.
    pub fn locate(&self, script: &Path, venv: Option<&Path>) -> Result<(EnvironmentId, VenvLayout)> {
        let id = EnvironmentId::for_script(script)?;
        let layout = environment_layout(&id, &self.venv_home, venv);
        Ok((id, layout))
    }

    /// Reconcile the target's environment without launching anything.
    pub fn prepare(
        &self,
        request: &LaunchRequest,
        ui: &mut dyn UserInterface,
    ) -> Result<(TargetApplication, VenvLayout, ReconcileOutcome)> {
        let (id, layout) = self.locate(&request.script, request.venv.as_deref())?;
        let requirements = request.sources.collect(self.scanner, id.script())?;
        tracing::info!(
            "{} requires {} package(s)",
            id.script().display(),
            requirements.len()
        );
        let app = TargetApplication::new(id, requirements);
        let outcome = self
            .reconciler
            .reconcile(&layout, app.requirements(), request.options, ui)?;
        Ok((app, layout, outcome))
    }

    /// Run the target script, returning its exit code.
    pub fn launch(&self, request: &LaunchRequest, ui: &mut dyn UserInterface) -> Result<i32> {
        let (id, layout) = self.locate(&request.script, request.venv.as_deref())?;

        if self.context.decide(&id) == GuardDecision::Reenter {
            tracing::debug!("Already inside {}; running script directly", id);
            let spec = ProcessSpec::python(layout.interpreter(), id.script(), &request.args);
            return self.runner.replace(&spec);
        }

        let (app, layout, outcome) = self.prepare(request, ui)?;
        if outcome.was_noop() {
            tracing::debug!("Environment {} already up to date", app.env_id());
        } else {
            tracing::info!(
                "Environment {} reconciled ({} creation(s), {} installer call(s))",
                app.env_id(),
                outcome.creations,
                outcome.installer_calls
            );
        }

        let mut spec = ProcessSpec::python(layout.interpreter(), app.entry(), &request.args);
        spec.env.push((
            OsString::from(PYTHONPATH_VAR),
            python_path(app.app_dir(), std::env::var_os(PYTHONPATH_VAR))?,
        ));
        let (guard_name, guard_value) = GuardToken::for_environment(app.env_id()).env_pair();
        spec.env.push((guard_name.into(), guard_value.into()));

        self.runner.run(&spec)
    }
}

/// `app_dir` followed by the entries of an existing `PYTHONPATH`.
pub fn python_path(app_dir: &Path, existing: Option<OsString>) -> Result<OsString> {
    let mut entries = vec![app_dir.to_path_buf()];
    if let Some(existing) = existing.filter(|v| !v.is_empty()) {
        entries.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(entries)
        .map_err(|e| EnvyError::Other(anyhow::anyhow!("Cannot build {}: {}", PYTHONPATH_VAR, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::GUARD_ENV_VAR;
    use crate::scanner::AliasTable;
    use crate::tooling::MockTooling;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        script: PathBuf,
        tooling: MockTooling,
        scanner: ImportScanner,
        runner: MockRunner,
    }

    fn fixture(source: &str) -> Fixture {
        let temp = TempDir::new().unwrap();
        let app_dir = temp.path().join("app");
        fs::create_dir_all(&app_dir).unwrap();
        let script = app_dir.join("viewer.py");
        fs::write(&script, source).unwrap();
        Fixture {
            temp,
            script,
            tooling: MockTooling::new(),
            scanner: ImportScanner::new(AliasTable::builtin()),
            runner: MockRunner::exiting_with(0),
        }
    }

    fn request(f: &Fixture, args: &[&str]) -> LaunchRequest {
        LaunchRequest {
            script: f.script.clone(),
            args: args.iter().map(OsString::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn launch_reconciles_then_runs_with_guard_and_pythonpath() {
        let f = fixture("import requests\nfrom PIL import Image\n");
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::fresh(),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );
        let mut ui = MockUI::new();

        let code = launcher.launch(&request(&f, &["--size", "2"]), &mut ui).unwrap();

        assert_eq!(code, 0);
        let runs = f.runner.runs();
        assert_eq!(runs.len(), 1);
        let spec = &runs[0];
        assert!(spec.program.ends_with(if cfg!(windows) { "python.exe" } else { "python" }));
        assert_eq!(spec.args[1..], [OsString::from("--size"), OsString::from("2")]);

        let id = EnvironmentId::for_script(&f.script).unwrap();
        assert_eq!(
            spec.env_value(GUARD_ENV_VAR),
            Some(&OsString::from(id.as_str()))
        );
        let pythonpath = spec.env_value(PYTHONPATH_VAR).unwrap();
        let first = std::env::split_paths(pythonpath).next().unwrap();
        assert_eq!(first, id.script().parent().unwrap());

        let layout = VenvLayout::new(f.temp.path().join("venvs").join(id.as_str()));
        let installed = f.tooling.installed(&layout);
        assert!(installed.contains_key("requests"));
        assert!(installed.contains_key("pillow"));
    }

    #[test]
    fn child_exit_code_is_returned() {
        let mut f = fixture("import sys\n");
        f.runner = MockRunner::exiting_with(3);
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::fresh(),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );

        let code = launcher.launch(&request(&f, &[]), &mut MockUI::new()).unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn reentry_skips_reconciliation_and_replaces_process() {
        let f = fixture("import requests\n");
        let id = EnvironmentId::for_script(&f.script).unwrap();
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::new(Some(GuardToken::for_environment(&id))),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );

        launcher.launch(&request(&f, &["a"]), &mut MockUI::new()).unwrap();

        assert!(f.runner.runs().is_empty());
        assert_eq!(f.runner.replacements().len(), 1);
        assert_eq!(f.tooling.create_calls(), 0);
        assert_eq!(f.tooling.apply_calls(), 0);
        assert_eq!(f.tooling.list_calls(), 0);
    }

    #[test]
    fn token_for_other_app_still_reconciles() {
        let f = fixture("import requests\n");
        let other = EnvironmentId::from_canonical(PathBuf::from("/elsewhere/other.py"));
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::new(Some(GuardToken::for_environment(&other))),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );

        launcher.launch(&request(&f, &[]), &mut MockUI::new()).unwrap();

        assert_eq!(f.runner.runs().len(), 1);
        assert_eq!(f.tooling.create_calls(), 1);
    }

    #[test]
    fn missing_script_is_a_reconcile_failure() {
        let f = fixture("");
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::fresh(),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );
        let req = LaunchRequest {
            script: f.temp.path().join("nope.py"),
            ..Default::default()
        };

        let err = launcher.launch(&req, &mut MockUI::new()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::RECONCILE_FAILURE_EXIT_CODE);
        assert!(f.runner.runs().is_empty());
    }

    #[test]
    fn failed_reconcile_never_spawns() {
        let f = fixture("import ghost\n");
        f.tooling.reject("ghost");
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::fresh(),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );

        let err = launcher.launch(&request(&f, &[]), &mut MockUI::new()).unwrap_err();
        assert!(err.is_reconcile_failure());
        assert!(f.runner.runs().is_empty());
    }

    #[test]
    fn explicit_venv_is_used() {
        let f = fixture("");
        let reconciler = Reconciler::new(&f.tooling, &f.tooling);
        let launcher = Launcher::new(
            InvocationContext::fresh(),
            &f.scanner,
            &reconciler,
            &f.runner,
            f.temp.path().join("venvs"),
        );
        let custom = f.temp.path().join("custom-env");
        let req = LaunchRequest {
            venv: Some(custom.clone()),
            ..request(&f, &[])
        };

        launcher.launch(&req, &mut MockUI::new()).unwrap();
        assert!(VenvLayout::new(&custom).interpreter().exists());
    }

    #[test]
    fn python_path_prepends_app_dir() {
        let existing = std::env::join_paths(["/opt/lib", "/srv/lib"]).unwrap();
        let joined = python_path(Path::new("/apps/viewer"), Some(existing)).unwrap();
        let entries: Vec<PathBuf> = std::env::split_paths(&joined).collect();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/apps/viewer"),
                PathBuf::from("/opt/lib"),
                PathBuf::from("/srv/lib")
            ]
        );

        let alone = python_path(Path::new("/apps/viewer"), None).unwrap();
        assert_eq!(alone, OsString::from("/apps/viewer"));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_codes() {
        let spec = ProcessSpec {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), "exit 7".into()],
            env: Vec::new(),
        };
        assert_eq!(SystemRunner.run(&spec).unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_maps_signals() {
        let spec = ProcessSpec {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), "kill -TERM $$".into()],
            env: Vec::new(),
        };
        assert_eq!(SystemRunner.run(&spec).unwrap(), 128 + 15);
    }
}

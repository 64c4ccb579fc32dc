//! Status command implementation.
//!
//! `envy status SCRIPT` probes the environment and shows what a sync
//! would change, without changing anything.

use serde::Serialize;
use std::path::PathBuf;

use crate::app::{environment_layout, RequirementSources, TargetApplication};
use crate::cli::args::StatusArgs;
use crate::environment::{EnvState, EnvironmentId, InstalledPackages, VenvLayout};
use crate::error::Result;
use crate::plan::{ActionPlan, DiffMode};
use crate::reconcile::{ReconcileState, Reconciler};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::toolkit::Toolkit;

/// Everything `status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub script: PathBuf,
    pub env_id: String,
    pub root: PathBuf,
    pub state: EnvState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Where a reconcile would start.
    pub next: ReconcileState,
    pub required: Vec<String>,
    pub installed: InstalledPackages,
    pub plan: ActionPlan,
}

/// Probe `layout` and compute the pending plan for `app`.
pub fn build_report(
    reconciler: &Reconciler<'_>,
    app: &TargetApplication,
    layout: &VenvLayout,
    mode: DiffMode,
) -> Result<StatusReport> {
    let report = reconciler.probe(layout)?;
    let plan = reconciler.plan(&report, app.requirements(), mode);
    let next = reconciler.classify(&report, app.requirements(), mode);
    Ok(StatusReport {
        script: app.entry().to_path_buf(),
        env_id: app.env_id().to_string(),
        root: layout.root().to_path_buf(),
        state: report.state,
        reason: report.reason,
        next,
        required: app.requirements().iter().map(|r| r.spec().to_string()).collect(),
        installed: report.installed,
        plan,
    })
}

/// Render `report` for humans.
pub fn show_report(ui: &mut dyn UserInterface, report: &StatusReport) {
    ui.show_header(&format!("{} - Status", report.env_id));
    ui.message(&format!("Script: {}", report.script.display()));
    ui.message(&format!("Environment: {}", report.root.display()));
    match &report.reason {
        Some(reason) => ui.message(&format!("State: {} ({})", report.state, reason)),
        None => ui.message(&format!("State: {}", report.state)),
    }
    ui.message(&format!(
        "Packages: {} required, {} installed",
        report.required.len(),
        report.installed.len()
    ));

    if ui.output_mode().shows_details() {
        for (name, version) in &report.installed {
            ui.message(&format!("  {} {}", name, version));
        }
    }

    match report.next {
        ReconcileState::Ready => ui.success("Ready to run"),
        ReconcileState::NeedsCreate => ui.warning("Environment will be created on next run"),
        ReconcileState::NeedsRepair => ui.warning("Environment will be rebuilt on next run"),
        _ => ui.warning(&format!("Pending: {}", report.plan)),
    }
}

/// The status command implementation.
pub struct StatusCommand {
    args: StatusArgs,
    config_override: Option<PathBuf>,
}

impl StatusCommand {
    pub fn new(args: StatusArgs, config_override: Option<PathBuf>) -> Self {
        Self {
            args,
            config_override,
        }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let toolkit = Toolkit::for_script(&self.args.script, self.config_override.as_deref())?;
        let id = EnvironmentId::for_script(&self.args.script)?;
        let scanner = toolkit.scanner(false);
        let requirements = RequirementSources::default().collect(&scanner, id.script())?;
        let layout = environment_layout(&id, toolkit.venv_home(), self.args.venv.as_deref());
        let app = TargetApplication::new(id, requirements);
        let mode = toolkit.config().diff_mode(self.args.prune);

        let report = build_report(&toolkit.reconciler(), &app, &layout, mode)?;
        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| crate::error::EnvyError::Other(e.into()))?;
            println!("{}", json);
        } else {
            show_report(ui, &report);
        }
        Ok(CommandResult::success())
    }
}

//! Recreate command implementation.
//!
//! `envy recreate --app SCRIPT` wipes the environment and syncs it again
//! from the script's imports, plus `-r FILE` and pipreqs when asked;
//! `--venv DIR` alone wipes it and installs only what `-r` lists.

use std::path::PathBuf;

use crate::app::RequirementSources;
use crate::cli::args::RecreateArgs;
use crate::environment::VenvLayout;
use crate::error::Result;
use crate::reconcile::{ReconcileOptions, ReconcileOutcome, Reconciler};
use crate::scanner::{load_requirements_file, RequirementSet};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::toolkit::{ResolvedTarget, Toolkit};

/// Rebuild `layout` from scratch and install `required` into it.
pub fn rebuild(
    reconciler: &Reconciler<'_>,
    layout: &VenvLayout,
    required: &RequirementSet,
    ui: &mut dyn UserInterface,
) -> Result<ReconcileOutcome> {
    let options = ReconcileOptions {
        force_recreate: true,
        ..Default::default()
    };
    reconciler.reconcile(layout, required, options, ui)
}

/// The recreate command implementation.
pub struct RecreateCommand {
    args: RecreateArgs,
    config_override: Option<PathBuf>,
}

impl RecreateCommand {
    pub fn new(args: RecreateArgs, config_override: Option<PathBuf>) -> Self {
        Self {
            args,
            config_override,
        }
    }
}

impl Command for RecreateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let target = ResolvedTarget::resolve(&self.args.target)?;
        let toolkit = Toolkit::load(target.app_dir(), self.config_override.as_deref())?;
        let layout = toolkit.layout(&target);

        let required = match (target.script(), &self.args.requirements) {
            (Some(script), requirements_file) => RequirementSources {
                scan: true,
                requirements_file: requirements_file.clone(),
            }
            .collect(&toolkit.scanner(self.args.pipreqs), script)?,
            (None, Some(file)) => load_requirements_file(file)?,
            (None, None) => RequirementSet::new(),
        };

        let outcome = rebuild(&toolkit.reconciler(), &layout, &required, ui)?;
        ui.success(&format!(
            "Recreated {} with {} package(s)",
            layout.root().display(),
            outcome.record.installed.len()
        ));
        Ok(CommandResult::success())
    }
}

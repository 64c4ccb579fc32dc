//! Install and uninstall command implementation.

use std::path::PathBuf;

use crate::cli::args::PackagesArgs;
use crate::environment::VenvLayout;
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::tooling::{PackageManager, PackageOperation};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::toolkit::{ensure_environment, ResolvedTarget, Toolkit};

/// Apply `operation` to `packages`, creating the environment first when it
/// is missing or damaged.
pub fn apply_packages(
    reconciler: &Reconciler<'_>,
    manager: &dyn PackageManager,
    layout: &VenvLayout,
    operation: PackageOperation,
    packages: &[String],
    ui: &mut dyn UserInterface,
) -> Result<()> {
    ensure_environment(reconciler, layout, ui)?;

    let label = format!("{} {}", operation, packages.join(", "));
    let mut spinner = ui.start_spinner(&label);
    match manager.apply(layout, operation, packages) {
        Ok(()) => {
            spinner.finish_success(&label);
            Ok(())
        }
        Err(e) => {
            spinner.finish_error(&format!("Failed to {}", label));
            Err(e)
        }
    }
}

/// The install/uninstall command implementation.
pub struct PackagesCommand {
    operation: PackageOperation,
    args: PackagesArgs,
    config_override: Option<PathBuf>,
}

impl PackagesCommand {
    pub fn new(
        operation: PackageOperation,
        args: PackagesArgs,
        config_override: Option<PathBuf>,
    ) -> Self {
        Self {
            operation,
            args,
            config_override,
        }
    }
}

impl Command for PackagesCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let target = ResolvedTarget::resolve(&self.args.target)?;
        let toolkit = Toolkit::load(target.app_dir(), self.config_override.as_deref())?;
        let layout = toolkit.layout(&target);

        apply_packages(
            &toolkit.reconciler(),
            toolkit.packages(),
            &layout,
            self.operation,
            &self.args.packages,
            ui,
        )?;
        Ok(CommandResult::success())
    }
}

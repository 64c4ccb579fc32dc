//! Delete command implementation.

use std::path::PathBuf;

use crate::cli::args::DeleteArgs;
use crate::environment::VenvLayout;
use crate::error::Result;
use crate::reconcile::remove_root;
use crate::ui::{Prompt, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::toolkit::{ResolvedTarget, Toolkit};

/// Prompt key for the delete confirmation.
pub const CONFIRM_DELETE_KEY: &str = "confirm_delete";

/// Remove the environment at `layout`, asking first unless `assume_yes`.
///
/// Declining, or running non-interactively without `assume_yes`, leaves the
/// environment in place and fails with exit code 1.
pub fn delete_environment(
    layout: &VenvLayout,
    assume_yes: bool,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let root = layout.root();
    if std::fs::symlink_metadata(root).is_err() {
        ui.warning(&format!("No environment at {}", root.display()));
        return Ok(CommandResult::success());
    }

    if !assume_yes {
        let prompt = Prompt::new(
            CONFIRM_DELETE_KEY,
            format!("Delete the environment at {}?", root.display()),
            false,
        );
        if !ui.confirm(&prompt)? {
            ui.message("Nothing deleted");
            return Ok(CommandResult::failure(1));
        }
    }

    remove_root(layout)?;
    ui.success(&format!("Deleted {}", root.display()));
    Ok(CommandResult::success())
}

/// The delete command implementation.
pub struct DeleteCommand {
    args: DeleteArgs,
    config_override: Option<PathBuf>,
}

impl DeleteCommand {
    pub fn new(args: DeleteArgs, config_override: Option<PathBuf>) -> Self {
        Self {
            args,
            config_override,
        }
    }
}

impl Command for DeleteCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let target = ResolvedTarget::resolve(&self.args.target)?;
        let toolkit = Toolkit::load(target.app_dir(), self.config_override.as_deref())?;
        delete_environment(&toolkit.layout(&target), self.args.yes, ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn env_dir(temp: &TempDir) -> VenvLayout {
        let layout = VenvLayout::new(temp.path().join("env"));
        fs::create_dir_all(layout.bin_dir()).unwrap();
        layout
    }

    #[test]
    fn yes_skips_prompt() {
        let temp = TempDir::new().unwrap();
        let layout = env_dir(&temp);
        let mut ui = MockUI::new();

        let result = delete_environment(&layout, true, &mut ui).unwrap();

        assert!(result.success);
        assert!(!layout.root().exists());
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn confirmed_prompt_deletes() {
        let temp = TempDir::new().unwrap();
        let layout = env_dir(&temp);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CONFIRM_DELETE_KEY, "y");

        let result = delete_environment(&layout, false, &mut ui).unwrap();

        assert!(result.success);
        assert!(!layout.root().exists());
    }

    #[test]
    fn default_answer_keeps_environment() {
        let temp = TempDir::new().unwrap();
        let layout = env_dir(&temp);
        let mut ui = MockUI::new();

        let result = delete_environment(&layout, false, &mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(layout.root().exists());
        assert_eq!(ui.prompts_shown(), [CONFIRM_DELETE_KEY.to_string()]);
    }

    #[test]
    fn missing_environment_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::new(temp.path().join("never"));
        let mut ui = MockUI::new();

        let result = delete_environment(&layout, true, &mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_warning("No environment"));
    }
}

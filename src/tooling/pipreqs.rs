//! Advisory requirement generation with pipreqs.
//!
//! pipreqs looks at a whole directory, so the script and the local modules
//! it imports are copied into a scratch directory first. Anything else
//! living next to the script never influences the result.

use std::path::{Path, PathBuf};

use crate::error::{EnvyError, Result};
use crate::scanner::{parse_requirements, RequirementSet, RequirementsGenerator};
use crate::shell::run_captured;

/// Default invocation: pipreqs run through pipx.
pub const DEFAULT_PIPREQS_COMMAND: &[&str] = &["pipx", "run", "pipreqs"];

/// Runs pipreqs over a scratch copy of the application.
#[derive(Debug, Clone)]
pub struct Pipreqs {
    command: Vec<String>,
}

impl Default for Pipreqs {
    fn default() -> Self {
        Self::new(DEFAULT_PIPREQS_COMMAND.iter().map(|s| s.to_string()).collect())
    }
}

impl Pipreqs {
    /// Use `command` (program followed by leading arguments) to run pipreqs.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl RequirementsGenerator for Pipreqs {
    fn name(&self) -> &str {
        "pipreqs"
    }

    fn generate(&self, script: &Path, local_files: &[PathBuf]) -> Result<RequirementSet> {
        let (program, leading) = self.command.split_first().ok_or_else(|| {
            EnvyError::Other(anyhow::anyhow!("requirements generator command is empty"))
        })?;

        let scratch = tempfile::tempdir()?;
        let app_dir = script.parent().unwrap_or_else(|| Path::new("."));
        copy_application(app_dir, local_files, scratch.path())?;

        let savepath = scratch.path().join("requirements.txt");
        let mut args: Vec<String> = leading.to_vec();
        args.push(scratch.path().display().to_string());
        args.push("--force".to_string());
        args.push("--savepath".to_string());
        args.push(savepath.display().to_string());

        let result = run_captured(program, &args)?;
        if !result.succeeded() {
            return Err(EnvyError::CommandFailed {
                command: self.command.join(" "),
                code: result.exit_code,
            });
        }

        let content = std::fs::read_to_string(&savepath)?;
        Ok(parse_requirements(&content))
    }
}

/// Copy `files` into `dest`, keeping their paths relative to `app_dir`.
fn copy_application(app_dir: &Path, files: &[PathBuf], dest: &Path) -> Result<()> {
    for file in files {
        let relative = file
            .strip_prefix(app_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| file.file_name().map(PathBuf::from).unwrap_or_default());
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(file, &target)?;
    }
    Ok(())
}

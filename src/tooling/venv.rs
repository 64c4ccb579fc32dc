//! Environment creation with the standard library `venv` module.

use std::path::PathBuf;

use super::EnvironmentCreator;
use crate::environment::VenvLayout;
use crate::error::{EnvyError, Result};
use crate::shell::{display_command, find_first_on_path, run_captured};

/// Interpreter names tried on `PATH` when none is configured.
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

/// Creates environments with `<python> -m venv <root>`.
#[derive(Debug, Clone, Default)]
pub struct PythonVenv {
    python: Option<PathBuf>,
}

impl PythonVenv {
    /// Use `python` as the base interpreter, or look one up on `PATH`.
    pub fn new(python: Option<PathBuf>) -> Self {
        Self { python }
    }

    /// The base interpreter that will run `venv`.
    pub fn base_interpreter(&self) -> Option<PathBuf> {
        self.python
            .clone()
            .or_else(|| find_first_on_path(PYTHON_CANDIDATES))
    }
}

impl EnvironmentCreator for PythonVenv {
    fn create(&self, layout: &VenvLayout) -> Result<()> {
        let root = layout.root();
        let python = self.base_interpreter().ok_or_else(|| EnvyError::Create {
            path: root.to_path_buf(),
            message: "no python3 or python found on PATH; set `python` in config".to_string(),
        })?;

        if let Some(parent) = root.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EnvyError::Create {
                path: root.to_path_buf(),
                message: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }

        let args = [
            "-m".into(),
            "venv".into(),
            root.as_os_str().to_os_string(),
        ];
        tracing::info!("Creating environment: {}", display_command(&python, &args));

        let result = run_captured(&python, &args).map_err(|e| {
            EnvyError::Create {
                path: root.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        if !result.succeeded() {
            return Err(EnvyError::Create {
                path: root.to_path_buf(),
                message: result.failure_message(),
            });
        }
        tracing::debug!("venv finished in {:?}", result.duration);
        Ok(())
    }
}

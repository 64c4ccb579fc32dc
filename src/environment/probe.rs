//! Environment classification.
//!
//! The probe looks at an environment root and reports which of four states
//! it is in. It never changes anything; deciding what to do about a state is
//! the reconciler's job. A damaged environment is an expected condition and
//! is reported as [`EnvState::Corrupt`]; only unexpected I/O faults such as
//! permission errors become [`EnvyError::Probe`].

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{EnvyError, Result};
use crate::shell::is_executable;
use crate::tooling::PackageManager;

use super::layout::VenvLayout;
use super::record::InstalledPackages;

/// Classification of an environment root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvState {
    /// Nothing at the root path.
    Absent,
    /// Empty directory, or a working interpreter with only base packages.
    PresentEmpty,
    /// Working interpreter with at least one non-base package.
    PresentPopulated,
    /// Something is there but it cannot be used as an environment.
    Corrupt,
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnvState::Absent => "absent",
            EnvState::PresentEmpty => "present (empty)",
            EnvState::PresentPopulated => "present (populated)",
            EnvState::Corrupt => "corrupt",
        };
        f.write_str(label)
    }
}

/// Result of probing one environment.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Classification.
    pub state: EnvState,
    /// Interpreter path, when one is present and executable.
    pub interpreter: Option<PathBuf>,
    /// Installed packages (empty unless the interpreter works).
    pub installed: InstalledPackages,
    /// Why the environment was classified corrupt.
    pub reason: Option<String>,
}

impl ProbeReport {
    fn without_interpreter(state: EnvState) -> Self {
        Self {
            state,
            interpreter: None,
            installed: InstalledPackages::new(),
            reason: None,
        }
    }

    fn corrupt(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::without_interpreter(EnvState::Corrupt)
        }
    }

    /// Whether the environment has a usable interpreter.
    pub fn has_interpreter(&self) -> bool {
        self.interpreter.is_some()
    }
}

/// Classifies environment roots.
pub struct EnvironmentProbe<'a> {
    packages: &'a dyn PackageManager,
    base_packages: &'a BTreeSet<String>,
}

impl<'a> EnvironmentProbe<'a> {
    /// Create a probe that lists packages through `packages` and ignores
    /// `base_packages` when deciding whether an environment is populated.
    pub fn new(packages: &'a dyn PackageManager, base_packages: &'a BTreeSet<String>) -> Self {
        Self {
            packages,
            base_packages,
        }
    }

    /// Classify the environment at `layout`.
    pub fn probe(&self, layout: &VenvLayout) -> Result<ProbeReport> {
        let root = layout.root();
        let metadata = match std::fs::symlink_metadata(root) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(ProbeReport::without_interpreter(EnvState::Absent));
            }
            Err(e) => return Err(probe_error(root, e)),
        };

        if !metadata.is_dir() {
            return Ok(ProbeReport::corrupt("environment root is not a directory"));
        }

        let interpreter = layout.interpreter();
        match std::fs::metadata(&interpreter) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return if dir_is_empty(root)? {
                    Ok(ProbeReport::without_interpreter(EnvState::PresentEmpty))
                } else {
                    Ok(ProbeReport::corrupt(format!(
                        "interpreter missing at {}",
                        interpreter.display()
                    )))
                };
            }
            Err(e) => return Err(probe_error(&interpreter, e)),
        }

        if !is_executable(&interpreter) {
            return Ok(ProbeReport::corrupt(format!(
                "interpreter at {} is not executable",
                interpreter.display()
            )));
        }

        let installed = match self.packages.list_installed(layout) {
            Ok(installed) => installed,
            Err(e) => {
                tracing::debug!("Package listing failed for {}: {}", root.display(), e);
                return Ok(ProbeReport::corrupt(format!("package listing failed: {}", e)));
            }
        };

        let populated = installed
            .keys()
            .any(|name| !self.base_packages.contains(name));
        let state = if populated {
            EnvState::PresentPopulated
        } else {
            EnvState::PresentEmpty
        };
        tracing::debug!(
            "Probed {}: {} ({} packages)",
            root.display(),
            state,
            installed.len()
        );

        Ok(ProbeReport {
            state,
            interpreter: Some(interpreter),
            installed,
            reason: None,
        })
    }
}

fn dir_is_empty(root: &Path) -> Result<bool> {
    let mut entries = std::fs::read_dir(root).map_err(|e| probe_error(root, e))?;
    Ok(entries.next().is_none())
}

fn probe_error(path: &Path, e: std::io::Error) -> EnvyError {
    EnvyError::Probe {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

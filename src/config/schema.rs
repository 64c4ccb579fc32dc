//! Configuration schema.
//!
//! ```yaml
//! venv_home: ~/.local/share/envy/venvs
//! python: /usr/bin/python3.12
//! prune: false
//! protected: [pip, setuptools, wheel]
//! aliases:
//!   fitz: PyMuPDF
//! requirements_generator:
//!   enabled: true
//!   command: [pipx, run, pipreqs]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{EnvyError, Result};
use crate::plan::{default_protected, DependencyDiffer, DiffMode};
use crate::scanner::AliasTable;
use crate::tooling::pipreqs::DEFAULT_PIPREQS_COMMAND;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvyConfig {
    /// Directory holding the derived environments.
    pub venv_home: Option<PathBuf>,

    /// Base interpreter used to create environments.
    pub python: Option<PathBuf>,

    /// Uninstall packages the application no longer imports.
    pub prune: bool,

    /// Packages never pruned. Defaults to pip, setuptools and wheel.
    pub protected: Option<Vec<String>>,

    /// Extra import-name to distribution-name mappings.
    pub aliases: BTreeMap<String, String>,

    /// Advisory requirement generation.
    pub requirements_generator: GeneratorConfig,
}

/// Settings for the advisory requirements generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub enabled: bool,

    /// Program and leading arguments; defaults to `pipx run pipreqs`.
    pub command: Option<Vec<String>>,
}

impl GeneratorConfig {
    /// Command to run, falling back to the default.
    pub fn command(&self) -> Vec<String> {
        match &self.command {
            Some(command) if !command.is_empty() => command.clone(),
            _ => DEFAULT_PIPREQS_COMMAND.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EnvyConfig {
    /// Built-in aliases with the configured ones layered on top.
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::builtin();
        table.extend(&self.aliases);
        table
    }

    /// Differ honoring the configured protected set.
    pub fn differ(&self) -> DependencyDiffer {
        match &self.protected {
            Some(protected) => DependencyDiffer::new(protected),
            None => DependencyDiffer::new(default_protected()),
        }
    }

    /// Diff mode, with `force_prune` from the command line taking precedence.
    pub fn diff_mode(&self, force_prune: bool) -> DiffMode {
        if force_prune || self.prune {
            DiffMode::Prune
        } else {
            DiffMode::Additive
        }
    }

    /// Resolve the environment home.
    ///
    /// `env_override` (the value of `ENVY_HOME`) wins over the config file,
    /// which wins over `<data_local_dir>/envy/venvs`.
    pub fn venv_home(&self, env_override: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(home) = env_override.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(expand_home(&home));
        }
        if let Some(home) = &self.venv_home {
            return Ok(expand_home(home));
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("envy").join("venvs"))
            .ok_or_else(|| {
                EnvyError::Other(anyhow::anyhow!(
                    "Cannot determine a data directory; set venv_home or ENVY_HOME"
                ))
            })
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

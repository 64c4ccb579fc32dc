//! The application being launched.

use std::path::{Path, PathBuf};

use crate::environment::{EnvironmentId, VenvLayout};
use crate::error::Result;
use crate::scanner::{load_requirements_file, ImportScanner, RequirementSet};

/// Where an application's requirements come from.
#[derive(Debug, Clone)]
pub struct RequirementSources {
    /// Statically scan the script's imports.
    pub scan: bool,
    /// A `requirements.txt` whose entries take precedence over scanned names.
    pub requirements_file: Option<PathBuf>,
}

impl Default for RequirementSources {
    fn default() -> Self {
        Self {
            scan: true,
            requirements_file: None,
        }
    }
}

impl RequirementSources {
    /// Collect the requirement set for `script`.
    ///
    /// File entries come first so a pinned `numpy==1.26.4` wins over the
    /// bare `numpy` found by scanning.
    pub fn collect(&self, scanner: &ImportScanner, script: &Path) -> Result<RequirementSet> {
        let mut requirements = RequirementSet::new();
        if let Some(file) = &self.requirements_file {
            let listed = load_requirements_file(file)?;
            tracing::debug!("{} requirements from {}", listed.len(), file.display());
            requirements.extend(listed.iter().cloned());
        }
        if self.scan {
            requirements.extend(scanner.scan(script)?.iter().cloned());
        }
        Ok(requirements)
    }
}

/// A target script and everything derived from it for one invocation.
#[derive(Debug, Clone)]
pub struct TargetApplication {
    id: EnvironmentId,
    requirements: RequirementSet,
}

impl TargetApplication {
    pub fn new(id: EnvironmentId, requirements: RequirementSet) -> Self {
        Self { id, requirements }
    }

    /// Canonical entry script.
    pub fn entry(&self) -> &Path {
        self.id.script()
    }

    /// Directory containing the entry script.
    pub fn app_dir(&self) -> &Path {
        self.entry().parent().unwrap_or_else(|| Path::new("/"))
    }

    pub fn env_id(&self) -> &EnvironmentId {
        &self.id
    }

    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }
}

/// Environment location for `id`: `venv_override` when given, otherwise
/// `<venv_home>/<id>`.
pub fn environment_layout(
    id: &EnvironmentId,
    venv_home: &Path,
    venv_override: Option<&Path>,
) -> VenvLayout {
    match venv_override {
        Some(path) => VenvLayout::new(path),
        None => VenvLayout::new(venv_home.join(id.as_str())),
    }
}

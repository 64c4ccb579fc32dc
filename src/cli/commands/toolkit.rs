//! Configuration and collaborators shared by the commands.

use std::path::{Path, PathBuf};

use crate::app::{environment_layout, RequirementSources};
use crate::cli::args::{ReconcileArgs, TargetArgs};
use crate::config::{load_config, EnvyConfig, HOME_ENV_VAR};
use crate::environment::{EnvironmentId, VenvLayout};
use crate::error::Result;
use crate::reconcile::{ReconcileOptions, Reconciler};
use crate::scanner::{ImportScanner, RequirementSet};
use crate::tooling::{Pip, Pipreqs, PythonVenv};
use crate::ui::UserInterface;

/// Loaded configuration plus the real environment tooling.
pub struct Toolkit {
    config: EnvyConfig,
    venv_home: PathBuf,
    creator: PythonVenv,
    packages: Pip,
}

impl Toolkit {
    /// Load configuration for an application in `app_dir`.
    pub fn load(app_dir: Option<&Path>, config_override: Option<&Path>) -> Result<Self> {
        let config = load_config(app_dir, config_override)?;
        let venv_home = config.venv_home(std::env::var_os(HOME_ENV_VAR).map(PathBuf::from))?;
        tracing::debug!("Environment home: {}", venv_home.display());
        Ok(Self {
            creator: PythonVenv::new(config.python.clone()),
            packages: Pip::new(),
            config,
            venv_home,
        })
    }

    /// Load configuration for the application at `script`.
    pub fn for_script(script: &Path, config_override: Option<&Path>) -> Result<Self> {
        Self::load(script.parent(), config_override)
    }

    pub fn config(&self) -> &EnvyConfig {
        &self.config
    }

    pub fn venv_home(&self) -> &Path {
        &self.venv_home
    }

    /// Import scanner with the configured aliases, consulting pipreqs when
    /// asked on the command line or enabled in configuration.
    pub fn scanner(&self, pipreqs: bool) -> ImportScanner {
        let scanner = ImportScanner::new(self.config.alias_table());
        if pipreqs || self.config.requirements_generator.enabled {
            let command = self.config.requirements_generator.command();
            scanner.with_generator(Box::new(Pipreqs::new(command)))
        } else {
            scanner
        }
    }

    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.creator, &self.packages).with_differ(self.config.differ())
    }

    pub fn packages(&self) -> &Pip {
        &self.packages
    }

    /// Reconcile options from command-line flags and configuration.
    pub fn options(&self, args: &ReconcileArgs) -> ReconcileOptions {
        ReconcileOptions {
            mode: self.config.diff_mode(args.prune),
            force_recreate: args.recreate,
        }
    }

    /// Environment root for `target`.
    pub fn layout(&self, target: &ResolvedTarget) -> VenvLayout {
        match target {
            ResolvedTarget::App { id, venv } => {
                environment_layout(id, &self.venv_home, venv.as_deref())
            }
            ResolvedTarget::Venv(root) => VenvLayout::new(root),
        }
    }
}

/// Create the environment at `layout` if it is missing or damaged, leaving
/// installed packages alone.
pub fn ensure_environment(
    reconciler: &Reconciler<'_>,
    layout: &VenvLayout,
    ui: &mut dyn UserInterface,
) -> Result<()> {
    reconciler.reconcile(layout, &RequirementSet::new(), ReconcileOptions::default(), ui)?;
    Ok(())
}

/// Requirement sources selected by command-line flags.
pub fn requirement_sources(args: &ReconcileArgs) -> RequirementSources {
    RequirementSources {
        scan: !args.no_scan,
        requirements_file: args.requirements.clone(),
    }
}

/// An environment chosen with `--app` and/or `--venv`.
#[derive(Debug, Clone)]
pub enum ResolvedTarget {
    /// An application's environment, at `venv` when given.
    App {
        id: EnvironmentId,
        venv: Option<PathBuf>,
    },
    Venv(PathBuf),
}

impl ResolvedTarget {
    /// Resolve `--app`/`--venv`; the script must exist.
    pub fn resolve(args: &TargetArgs) -> Result<Self> {
        match (&args.app, &args.venv) {
            (Some(script), venv) => Ok(Self::App {
                id: EnvironmentId::for_script(script)?,
                venv: venv.clone(),
            }),
            (None, Some(venv)) => Ok(Self::Venv(venv.clone())),
            (None, None) => Err(crate::error::EnvyError::Other(anyhow::anyhow!(
                "Either --app or --venv is required"
            ))),
        }
    }

    /// Directory whose `.envy.yml` applies.
    pub fn app_dir(&self) -> Option<&Path> {
        match self {
            Self::App { id, .. } => id.script().parent(),
            Self::Venv(_) => None,
        }
    }

    /// Script to sync after rebuilding, if any.
    pub fn script(&self) -> Option<&Path> {
        match self {
            Self::App { id, .. } => Some(id.script()),
            Self::Venv(_) => None,
        }
    }
}

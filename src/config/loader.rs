//! Configuration file discovery and loading.
//!
//! Two layers are read, later overriding earlier:
//!
//! 1. User config: `--config`/`ENVY_CONFIG` if given, else `~/.envy/config.yml`
//! 2. App-local config: `.envy.yml` next to the target script

use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::merger::merge_configs;
use super::schema::EnvyConfig;
use crate::error::{EnvyError, Result};

/// File name of the app-local config.
pub const APP_CONFIG_FILE: &str = ".envy.yml";

/// Configuration files in merge order.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User config (explicit or `~/.envy/config.yml`).
    pub user: Option<PathBuf>,
    /// `.envy.yml` in the application directory.
    pub app_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files.
    ///
    /// An explicit `config_override` must exist; the implicit locations are
    /// simply skipped when absent.
    pub fn discover(app_dir: Option<&Path>, config_override: Option<&Path>) -> Result<Self> {
        let user = match config_override {
            Some(path) if path.is_file() => Some(path.to_path_buf()),
            Some(path) => {
                return Err(EnvyError::ConfigNotFound {
                    path: path.to_path_buf(),
                })
            }
            None => Self::find_user_global(),
        };
        let app_local = app_dir
            .map(|dir| dir.join(APP_CONFIG_FILE))
            .filter(|path| path.is_file());

        Ok(Self { user, app_local })
    }

    fn find_user_global() -> Option<PathBuf> {
        let path = dirs::home_dir()?.join(".envy").join("config.yml");
        path.is_file().then_some(path)
    }

    /// All existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.user.iter().chain(self.app_local.iter()).collect()
    }
}

/// Parse YAML content into [`EnvyConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<EnvyConfig> {
    let value = parse_value(content, source_path)?;
    serde_yaml::from_value(value).map_err(|e| EnvyError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw YAML value for merging.
///
/// An empty file is an empty mapping.
pub fn load_config_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EnvyError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            EnvyError::Io(e)
        }
    })?;
    parse_value(&content, path)
}

fn parse_value(content: &str, path: &Path) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content).map_err(|e| EnvyError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(match value {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    })
}

/// Load and merge configuration for an application in `app_dir`.
pub fn load_config(app_dir: Option<&Path>, config_override: Option<&Path>) -> Result<EnvyConfig> {
    let paths = ConfigPaths::discover(app_dir, config_override)?;
    let existing = paths.all_existing();

    let mut layers = Vec::with_capacity(existing.len());
    for path in &existing {
        tracing::debug!("Loading config from {}", path.display());
        layers.push(load_config_value(path)?);
    }

    let merged = merge_configs(&layers);
    let blame = existing
        .last()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(APP_CONFIG_FILE));

    serde_yaml::from_value(merged).map_err(|e| EnvyError::ConfigParseError {
        path: blame,
        message: e.to_string(),
    })
}

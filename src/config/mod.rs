//! Configuration loading for envy.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layer merging in [`merger`]
//!
//! # Example
//!
//! ```
//! use envy::config::load_config;
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let user = temp.path().join("config.yml");
//! fs::write(&user, "prune: true\naliases:\n  fitz: PyMuPDF\n").unwrap();
//!
//! let config = load_config(Some(temp.path()), Some(&user)).unwrap();
//! assert!(config.prune);
//! assert_eq!(config.alias_table().resolve("fitz"), "PyMuPDF");
//! ```

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{load_config, load_config_value, parse_config, ConfigPaths, APP_CONFIG_FILE};
pub use merger::{deep_merge, merge_configs};
pub use schema::{expand_home, EnvyConfig, GeneratorConfig};

/// Environment variable naming the user config file.
pub const CONFIG_ENV_VAR: &str = "ENVY_CONFIG";

/// Environment variable overriding `venv_home`.
pub const HOME_ENV_VAR: &str = "ENVY_HOME";

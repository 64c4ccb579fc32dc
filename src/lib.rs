//! envy - launch Python scripts in self-reconciling virtual environments.
//!
//! Each script gets its own virtual environment. Before every launch envy
//! scans the script's imports, compares them with what the environment has
//! installed and creates, repairs or syncs the environment until it matches.
//! Then it runs the script with the environment's interpreter.
//!
//! # Modules
//!
//! - [`app`] - The target application and its requirement sources
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and merging
//! - [`environment`] - Environment identity, layout and probing
//! - [`error`] - Error types and result aliases
//! - [`guard`] - Re-entry detection for already-managed processes
//! - [`launcher`] - Guard, reconcile and process handoff
//! - [`plan`] - Requirement diffing and action plans
//! - [`reconcile`] - The environment state machine
//! - [`scanner`] - Static import scanning
//! - [`shell`] - Subprocess execution
//! - [`tooling`] - venv, pip and pipreqs adapters
//! - [`ui`] - Prompts, spinners and terminal output
//!
//! # Example
//!
//! ```
//! use envy::plan::{DependencyDiffer, DiffMode};
//! use envy::scanner::{Requirement, RequirementSet};
//! use std::collections::BTreeSet;
//!
//! let required: RequirementSet = ["numpy", "requests"]
//!     .into_iter()
//!     .map(Requirement::from_name)
//!     .collect();
//! let installed = BTreeSet::from(["numpy".to_string(), "pip".to_string()]);
//!
//! let differ = DependencyDiffer::new(["pip", "setuptools", "wheel"]);
//! let plan = differ.diff(&required, &installed, DiffMode::Additive);
//! assert_eq!(plan.to_string(), "install requests");
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod guard;
pub mod launcher;
pub mod plan;
pub mod reconcile;
pub mod scanner;
pub mod shell;
pub mod tooling;
pub mod ui;

pub use error::{EnvyError, Result};

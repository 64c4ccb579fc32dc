//! Virtual environment identity, layout and classification.
//!
//! - [`id`] - Deterministic environment identifiers derived from script paths
//! - [`layout`] - Paths inside an environment root
//! - [`probe`] - Classifying an environment as absent, empty, populated or corrupt
//! - [`record`] - The state snapshot handed between probe, reconciler and commands

pub mod id;
pub mod layout;
pub mod probe;
pub mod record;

pub use id::EnvironmentId;
pub use layout::VenvLayout;
pub use probe::{EnvState, EnvironmentProbe, ProbeReport};
pub use record::{EnvironmentRecord, InstalledPackages};

use std::collections::BTreeSet;

/// Packages a fresh `python -m venv` may ship with.
pub const BASE_PACKAGES: &[&str] = &["pip", "setuptools", "wheel"];

/// [`BASE_PACKAGES`] as an owned set.
pub fn base_packages() -> BTreeSet<String> {
    BASE_PACKAGES.iter().map(|s| s.to_string()).collect()
}

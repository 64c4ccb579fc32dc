//! External collaborators that build and populate environments.
//!
//! The reconciler only talks to the traits defined here:
//!
//! - [`EnvironmentCreator`] - creates an empty environment at a root
//! - [`PackageManager`] - installs, removes, lists and upgrades packages
//!
//! [`PythonVenv`] and [`Pip`] drive the real `python -m venv` and
//! `python -m pip`; [`MockTooling`] implements both traits in memory for
//! tests.

pub mod mock;
pub mod pip;
pub mod pipreqs;
pub mod venv;

pub use mock::MockTooling;
pub use pip::Pip;
pub use pipreqs::Pipreqs;
pub use venv::PythonVenv;

use crate::environment::{InstalledPackages, VenvLayout};
use crate::error::Result;
use std::fmt;

/// Creates environments.
pub trait EnvironmentCreator {
    /// Create a fresh environment at `layout`'s root.
    ///
    /// The root is either missing or an empty directory.
    fn create(&self, layout: &VenvLayout) -> Result<()>;
}

/// Package operations the installer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOperation {
    Install,
    Uninstall,
}

impl fmt::Display for PackageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageOperation::Install => f.write_str("install"),
            PackageOperation::Uninstall => f.write_str("uninstall"),
        }
    }
}

/// Manages packages inside an environment.
pub trait PackageManager {
    /// Install or uninstall `packages` in one installer call.
    fn apply(
        &self,
        layout: &VenvLayout,
        operation: PackageOperation,
        packages: &[String],
    ) -> Result<()>;

    /// List installed distributions, keyed by normalized name.
    fn list_installed(&self, layout: &VenvLayout) -> Result<InstalledPackages>;

    /// Upgrade the installer itself and then every installed package.
    ///
    /// Returns the number of packages handed to the upgrade.
    fn upgrade_all(&self, layout: &VenvLayout) -> Result<usize>;
}

//! In-memory tooling for tests.
//!
//! [`MockTooling`] implements both [`EnvironmentCreator`] and
//! [`PackageManager`]. Creating an environment writes a real directory with
//! an executable `bin/python` placeholder so the probe sees a genuine layout,
//! while the package list lives in memory. Failure knobs let tests drive the
//! reconciler through its retry paths.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use super::{EnvironmentCreator, PackageManager, PackageOperation};
use crate::environment::{InstalledPackages, VenvLayout};
use crate::error::{EnvyError, Result};
use crate::scanner::{normalize_name, Requirement};

/// Version reported for every package the mock installs.
pub const MOCK_VERSION: &str = "1.0.0";

/// Records collaborator calls and simulates their effects.
#[derive(Debug, Default)]
pub struct MockTooling {
    environments: RefCell<HashMap<PathBuf, InstalledPackages>>,
    create_calls: Cell<usize>,
    apply_calls: Cell<usize>,
    list_calls: Cell<usize>,
    upgrade_calls: Cell<usize>,
    failing_creates: Cell<usize>,
    failing_applies: Cell<usize>,
    fail_listing: Cell<bool>,
    rejected: RefCell<BTreeSet<String>>,
    phantom: RefCell<BTreeSet<String>>,
    poisoned: RefCell<BTreeSet<String>>,
    history: RefCell<Vec<String>>,
}

impl MockTooling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment at `layout` holding `packages`, without
    /// counting it as a collaborator call.
    pub fn materialize(&self, layout: &VenvLayout, packages: &[&str]) -> Result<()> {
        self.write_layout(layout)?;
        let mut installed = fresh_packages();
        for name in packages {
            installed.insert(normalize_name(name), MOCK_VERSION.to_string());
        }
        self.environments
            .borrow_mut()
            .insert(layout.root().to_path_buf(), installed);
        Ok(())
    }

    /// Make the next `times` create calls fail.
    pub fn fail_next_creates(&self, times: usize) {
        self.failing_creates.set(times);
    }

    /// Make the next `times` install/uninstall calls fail.
    pub fn fail_next_applies(&self, times: usize) {
        self.failing_applies.set(times);
    }

    /// Make every package listing fail while `fail` is set.
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.set(fail);
    }

    /// Fail any install that includes `name`, like an unknown distribution.
    pub fn reject(&self, name: &str) {
        self.rejected.borrow_mut().insert(normalize_name(name));
    }

    /// Accept installs of `name` but never list it afterwards.
    pub fn phantom(&self, name: &str) {
        self.phantom.borrow_mut().insert(normalize_name(name));
    }

    /// Accept installs of `name`, after which listing that environment
    /// fails, like a package that breaks `pip list`.
    pub fn poison(&self, name: &str) {
        self.poisoned.borrow_mut().insert(normalize_name(name));
    }

    /// Packages currently installed at `layout`.
    pub fn installed(&self, layout: &VenvLayout) -> InstalledPackages {
        self.environments
            .borrow()
            .get(layout.root())
            .cloned()
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }

    /// Number of install/uninstall calls.
    pub fn apply_calls(&self) -> usize {
        self.apply_calls.get()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn upgrade_calls(&self) -> usize {
        self.upgrade_calls.get()
    }

    /// Every create and apply call in order, e.g. `install numpy requests`.
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }

    fn write_layout(&self, layout: &VenvLayout) -> std::io::Result<()> {
        let interpreter = layout.interpreter();
        if let Some(bin) = interpreter.parent() {
            std::fs::create_dir_all(bin)?;
        }
        std::fs::write(layout.pyvenv_cfg(), "home = /usr/bin\n")?;
        std::fs::write(&interpreter, "#!/bin/sh\nexit 0\n")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&interpreter, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }

    fn take_failure(counter: &Cell<usize>) -> bool {
        let remaining = counter.get();
        if remaining > 0 {
            counter.set(remaining - 1);
            true
        } else {
            false
        }
    }
}

fn fresh_packages() -> InstalledPackages {
    InstalledPackages::from([("pip".to_string(), "24.0".to_string())])
}

impl EnvironmentCreator for MockTooling {
    fn create(&self, layout: &VenvLayout) -> Result<()> {
        self.create_calls.set(self.create_calls.get() + 1);
        self.history
            .borrow_mut()
            .push(format!("create {}", layout.root().display()));

        if Self::take_failure(&self.failing_creates) {
            return Err(EnvyError::Create {
                path: layout.root().to_path_buf(),
                message: "simulated venv failure".to_string(),
            });
        }

        self.write_layout(layout).map_err(|e| EnvyError::Create {
            path: layout.root().to_path_buf(),
            message: e.to_string(),
        })?;
        self.environments
            .borrow_mut()
            .insert(layout.root().to_path_buf(), fresh_packages());
        Ok(())
    }
}

impl PackageManager for MockTooling {
    fn apply(
        &self,
        layout: &VenvLayout,
        operation: PackageOperation,
        packages: &[String],
    ) -> Result<()> {
        self.apply_calls.set(self.apply_calls.get() + 1);
        self.history
            .borrow_mut()
            .push(format!("{} {}", operation, packages.join(" ")));

        let sync_error = |message: &str| EnvyError::Sync {
            operation: operation.to_string(),
            packages: packages.join(", "),
            message: message.to_string(),
        };

        if Self::take_failure(&self.failing_applies) {
            return Err(sync_error("simulated installer failure"));
        }

        let names: Vec<String> = packages
            .iter()
            .map(|spec| {
                Requirement::parse(spec)
                    .map(|r| r.name().to_string())
                    .unwrap_or_else(|| normalize_name(spec))
            })
            .collect();

        if operation == PackageOperation::Install {
            let rejected = self.rejected.borrow();
            if let Some(name) = names.iter().find(|n| rejected.contains(*n)) {
                return Err(sync_error(&format!("No matching distribution found for {}", name)));
            }
        }

        let mut environments = self.environments.borrow_mut();
        let installed = environments
            .get_mut(layout.root())
            .ok_or_else(|| sync_error("environment does not exist"))?;
        let phantom = self.phantom.borrow();
        for name in names {
            match operation {
                PackageOperation::Install if !phantom.contains(&name) => {
                    installed.insert(name, MOCK_VERSION.to_string());
                }
                PackageOperation::Install => {}
                PackageOperation::Uninstall => {
                    installed.remove(&name);
                }
            }
        }
        Ok(())
    }

    fn list_installed(&self, layout: &VenvLayout) -> Result<InstalledPackages> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.fail_listing.get() {
            return Err(EnvyError::CommandFailed {
                command: "pip list".to_string(),
                code: Some(1),
            });
        }
        let listing_failed = || EnvyError::CommandFailed {
            command: "pip list".to_string(),
            code: Some(1),
        };
        let environments = self.environments.borrow();
        let installed = environments.get(layout.root()).ok_or_else(listing_failed)?;
        let poisoned = self.poisoned.borrow();
        if installed.keys().any(|name| poisoned.contains(name)) {
            return Err(listing_failed());
        }
        Ok(installed.clone())
    }

    fn upgrade_all(&self, layout: &VenvLayout) -> Result<usize> {
        self.upgrade_calls.set(self.upgrade_calls.get() + 1);
        let mut environments = self.environments.borrow_mut();
        let installed = environments
            .get_mut(layout.root())
            .ok_or_else(|| EnvyError::CommandFailed {
                command: "pip install --upgrade".to_string(),
                code: Some(1),
            })?;
        for version in installed.values_mut() {
            *version = "2.0.0".to_string();
        }
        Ok(installed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_writes_interpreter_and_base_packages() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::new(temp.path().join("env"));
        let tooling = MockTooling::new();

        tooling.create(&layout).unwrap();

        assert!(layout.interpreter().exists());
        assert_eq!(tooling.create_calls(), 1);
        assert!(tooling.installed(&layout).contains_key("pip"));
    }

    #[test]
    fn apply_installs_and_uninstalls() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::new(temp.path().join("env"));
        let tooling = MockTooling::new();
        tooling.materialize(&layout, &["six"]).unwrap();

        tooling
            .apply(&layout, PackageOperation::Install, &["NumPy>=1.26".to_string()])
            .unwrap();
        tooling
            .apply(&layout, PackageOperation::Uninstall, &["six".to_string()])
            .unwrap();

        let installed = tooling.installed(&layout);
        assert!(installed.contains_key("numpy"));
        assert!(!installed.contains_key("six"));
        assert_eq!(tooling.apply_calls(), 2);
        assert_eq!(tooling.history(), vec!["install NumPy>=1.26", "uninstall six"]);
    }

    #[test]
    fn rejected_package_fails_install() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::new(temp.path().join("env"));
        let tooling = MockTooling::new();
        tooling.materialize(&layout, &[]).unwrap();
        tooling.reject("ghost");

        let err = tooling
            .apply(&layout, PackageOperation::Install, &["ghost".to_string()])
            .unwrap_err();
        assert!(matches!(err, EnvyError::Sync { .. }));
    }

    #[test]
    fn poisoned_package_breaks_listing_once_installed() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::new(temp.path().join("env"));
        let tooling = MockTooling::new();
        tooling.materialize(&layout, &[]).unwrap();
        tooling.poison("enum34");

        assert!(tooling.list_installed(&layout).is_ok());
        tooling
            .apply(&layout, PackageOperation::Install, &["enum34".to_string()])
            .unwrap();
        assert!(tooling.list_installed(&layout).is_err());
    }

    #[test]
    fn failure_knobs_are_consumed() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::new(temp.path().join("env"));
        let tooling = MockTooling::new();
        tooling.fail_next_creates(1);

        assert!(tooling.create(&layout).is_err());
        assert!(tooling.create(&layout).is_ok());
        assert_eq!(tooling.create_calls(), 2);
    }
}

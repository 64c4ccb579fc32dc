//! Required-versus-installed comparison.
//!
//! Given the required set `R` and installed names `I`, the differ installs
//! `R \ I`. In [`DiffMode::Prune`] it also removes `I \ R`, sparing the
//! protected packages. Installs come first, then uninstalls, each sorted by
//! normalized name, so the same inputs always give the same plan.

use std::collections::BTreeSet;

use super::action::{Action, ActionPlan};
use crate::environment::BASE_PACKAGES;
use crate::scanner::{normalize_name, RequirementSet};

/// Whether extra installed packages are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffMode {
    /// Only install what is missing.
    #[default]
    Additive,
    /// Also uninstall what is not required.
    Prune,
}

/// Packages never uninstalled unless configured otherwise.
pub fn default_protected() -> BTreeSet<String> {
    BASE_PACKAGES.iter().map(|s| s.to_string()).collect()
}

/// Computes action plans.
#[derive(Debug, Clone)]
pub struct DependencyDiffer {
    protected: BTreeSet<String>,
}

impl Default for DependencyDiffer {
    fn default() -> Self {
        Self::new(default_protected())
    }
}

impl DependencyDiffer {
    /// Differ that never prunes `protected` (names are normalized).
    pub fn new<I, S>(protected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            protected: protected
                .into_iter()
                .map(|s| normalize_name(s.as_ref()))
                .collect(),
        }
    }

    pub fn protected(&self) -> &BTreeSet<String> {
        &self.protected
    }

    /// Plan the actions that take `installed` to `required`.
    pub fn diff(
        &self,
        required: &RequirementSet,
        installed: &BTreeSet<String>,
        mode: DiffMode,
    ) -> ActionPlan {
        let mut installs: Vec<_> = required
            .iter()
            .filter(|req| !installed.contains(req.name()))
            .cloned()
            .collect();
        installs.sort_by(|a, b| a.name().cmp(b.name()));

        let mut actions: Vec<Action> = installs.into_iter().map(Action::Install).collect();

        if mode == DiffMode::Prune {
            let required_names = required.names();
            // BTreeSet iteration is already alphabetical.
            actions.extend(
                installed
                    .iter()
                    .filter(|name| !required_names.contains(*name))
                    .filter(|name| !self.protected.contains(*name))
                    .map(|name| Action::Uninstall(name.clone())),
            );
        }

        ActionPlan::new(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Requirement;

    fn required(names: &[&str]) -> RequirementSet {
        names.iter().map(|n| Requirement::from_name(n)).collect()
    }

    fn installed(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn fresh_environment_installs_everything_sorted() {
        let differ = DependencyDiffer::default();
        let plan = differ.diff(
            &required(&["requests", "numpy"]),
            &installed(&["pip", "setuptools"]),
            DiffMode::Additive,
        );
        insta::assert_snapshot!(plan.to_string(), @"install numpy, install requests");
    }

    #[test]
    fn additive_mode_keeps_extras() {
        let differ = DependencyDiffer::default();
        let plan = differ.diff(
            &required(&["numpy", "requests"]),
            &installed(&["numpy", "requests", "pandas"]),
            DiffMode::Additive,
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn prune_mode_removes_unrequired_packages() {
        let differ = DependencyDiffer::default();
        let plan = differ.diff(
            &required(&["numpy", "requests"]),
            &installed(&["numpy", "requests", "pandas", "pip"]),
            DiffMode::Prune,
        );
        insta::assert_snapshot!(plan.to_string(), @"uninstall pandas");
    }

    #[test]
    fn installs_precede_uninstalls() {
        let differ = DependencyDiffer::default();
        let plan = differ.diff(
            &required(&["zlib-ng", "attrs"]),
            &installed(&["six", "idna", "wheel"]),
            DiffMode::Prune,
        );
        insta::assert_snapshot!(
            plan.to_string(),
            @"install attrs, install zlib-ng, uninstall idna, uninstall six"
        );
    }

    #[test]
    fn no_package_is_both_installed_and_uninstalled() {
        let differ = DependencyDiffer::new(Vec::<String>::new());
        let plan = differ.diff(
            &required(&["a", "b", "c"]),
            &installed(&["b", "c", "d", "pip"]),
            DiffMode::Prune,
        );
        let installs: BTreeSet<_> = plan.install_args().into_iter().collect();
        let uninstalls: BTreeSet<_> = plan.uninstall_args().into_iter().collect();
        assert!(installs.is_disjoint(&uninstalls));
        assert!(uninstalls.contains("pip"));
    }

    #[test]
    fn plan_is_empty_when_sets_match() {
        let differ = DependencyDiffer::default();
        let plan = differ.diff(
            &required(&["Qt_Material"]),
            &installed(&["qt-material", "pip", "setuptools", "wheel"]),
            DiffMode::Prune,
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn same_inputs_give_identical_plans() {
        let differ = DependencyDiffer::default();
        let req = required(&["requests", "numpy", "pillow"]);
        let inst = installed(&["six", "numpy"]);

        let first = differ.diff(&req, &inst, DiffMode::Prune);
        for _ in 0..10 {
            assert_eq!(differ.diff(&req, &inst, DiffMode::Prune), first);
        }
    }

    #[test]
    fn protected_names_are_normalized() {
        let differ = DependencyDiffer::new(["My_Tool"]);
        assert!(differ.protected().contains("my-tool"));
    }
}

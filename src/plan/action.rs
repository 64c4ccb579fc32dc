//! Install and uninstall actions.

use serde::Serialize;
use std::fmt;

use crate::scanner::Requirement;

/// One corrective action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Install a missing requirement.
    Install(Requirement),
    /// Remove an installed package by normalized name.
    Uninstall(String),
}

impl Action {
    /// Normalized package name the action targets.
    pub fn package(&self) -> &str {
        match self {
            Action::Install(req) => req.name(),
            Action::Uninstall(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Install(req) => write!(f, "install {}", req.spec()),
            Action::Uninstall(name) => write!(f, "uninstall {}", name),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered actions: every install, then every uninstall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionPlan {
    actions: Vec<Action>,
}

impl ActionPlan {
    /// Build a plan from already-ordered actions.
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Installer arguments for the install actions, in plan order.
    pub fn install_args(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Install(req) => Some(req.spec().to_string()),
                Action::Uninstall(_) => None,
            })
            .collect()
    }

    /// Package names for the uninstall actions, in plan order.
    pub fn uninstall_args(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Uninstall(name) => Some(name.clone()),
                Action::Install(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for ActionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.actions.is_empty() {
            return f.write_str("nothing to do");
        }
        let rendered: Vec<String> = self.actions.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(", "))
    }
}

impl<'a> IntoIterator for &'a ActionPlan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

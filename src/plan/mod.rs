//! Turning required and installed package sets into corrective actions.

pub mod action;
pub mod differ;

pub use action::{Action, ActionPlan};
pub use differ::{default_protected, DependencyDiffer, DiffMode};

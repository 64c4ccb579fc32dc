//! Subcommand implementations.
//!
//! [`CommandDispatcher`] picks one per invocation. Configuration loading and
//! the real tooling live in [`toolkit`] so every command builds them the
//! same way.

pub mod completions;
pub mod delete;
pub mod dispatcher;
pub mod packages;
pub mod recreate;
pub mod run;
pub mod status;
pub mod sync;
pub mod toolkit;
pub mod update;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};

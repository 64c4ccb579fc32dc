//! Error types for envy operations.
//!
//! This module defines [`EnvyError`], the primary error type used throughout
//! the launcher, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Reconciliation errors (`Scan`, `Probe`, `Create`, `Sync`,
//!   `ReconcileFailed`) abort the invocation with [`RECONCILE_FAILURE_EXIT_CODE`]
//! - Everything else exits with 1
//! - Use `anyhow::Error` (via `EnvyError::Other`) for unexpected errors
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

/// Exit code reserved for a failed reconciliation, distinct from the
/// codes a target application is likely to use.
pub const RECONCILE_FAILURE_EXIT_CODE: i32 = 125;

/// Core error type for envy operations.
#[derive(Debug, Error)]
pub enum EnvyError {
    /// Target script is missing, unreadable or not valid UTF-8.
    #[error("Cannot scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    /// Unexpected I/O fault while inspecting an environment.
    #[error("Cannot inspect environment at {path}: {message}")]
    Probe { path: PathBuf, message: String },

    /// The environment-creation subprocess failed.
    #[error("Failed to create environment at {path}: {message}")]
    Create { path: PathBuf, message: String },

    /// An install or uninstall subprocess failed.
    #[error("Package {operation} failed for {packages}: {message}")]
    Sync {
        operation: String,
        packages: String,
        message: String,
    },

    /// The environment did not converge after a retried sync.
    #[error("Environment at {path} did not converge; still pending: {pending}")]
    ReconcileFailed { path: PathBuf, pending: String },

    /// An explicitly named configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A required executable could not be found on PATH.
    #[error("Could not find {tool} on PATH: {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Command could not be started.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EnvyError {
    /// Whether this error means the environment could not be brought to a
    /// runnable state.
    pub fn is_reconcile_failure(&self) -> bool {
        matches!(
            self,
            EnvyError::Scan { .. }
                | EnvyError::Probe { .. }
                | EnvyError::Create { .. }
                | EnvyError::Sync { .. }
                | EnvyError::ReconcileFailed { .. }
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_reconcile_failure() {
            RECONCILE_FAILURE_EXIT_CODE
        } else {
            1
        }
    }
}

/// Result type alias for envy operations.
pub type Result<T> = std::result::Result<T, EnvyError>;

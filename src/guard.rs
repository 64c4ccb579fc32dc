//! Recursive-invocation guard.
//!
//! When envy launches an application it marks the child's environment with
//! [`GUARD_ENV_VAR`] set to the environment id. If that child (or anything it
//! spawns) starts envy again for the same application, the second envy sees
//! the marker and hands the script straight to the interpreter instead of
//! reconciling and respawning.
//!
//! The marker is read exactly once, in `main`, and passed down as an
//! [`InvocationContext`].

use std::ffi::OsString;

use crate::environment::EnvironmentId;

/// Environment variable carrying the guard token.
pub const GUARD_ENV_VAR: &str = "ENVY_MANAGED_ENV";

/// Marker naming the environment a process is running under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardToken(String);

impl GuardToken {
    /// Token for `id`.
    pub fn for_environment(id: &EnvironmentId) -> Self {
        Self(id.as_str().to_string())
    }

    /// Parse the raw variable value; empty or non-UTF-8 values are ignored.
    pub fn from_env_value(value: OsString) -> Option<Self> {
        let value = value.into_string().ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(name, value)` pair to set on a child process.
    pub fn env_pair(&self) -> (String, String) {
        (GUARD_ENV_VAR.to_string(), self.0.clone())
    }
}

/// What the launcher should do given the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Already running under this environment: run the script directly.
    Reenter,
    /// Reconcile and launch normally.
    Proceed,
}

/// Facts about how this process was started.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    guard: Option<GuardToken>,
}

impl InvocationContext {
    pub fn new(guard: Option<GuardToken>) -> Self {
        Self { guard }
    }

    /// Context for a top-level invocation.
    pub fn fresh() -> Self {
        Self::default()
    }

    /// Read the guard token from the current process environment.
    pub fn from_process_env() -> Self {
        Self::new(std::env::var_os(GUARD_ENV_VAR).and_then(GuardToken::from_env_value))
    }

    pub fn guard(&self) -> Option<&GuardToken> {
        self.guard.as_ref()
    }

    /// Decide whether launching `id` would re-enter its own environment.
    ///
    /// A token naming a different environment means a managed app is
    /// launching some other app, which must be reconciled normally.
    pub fn decide(&self, id: &EnvironmentId) -> GuardDecision {
        match &self.guard {
            Some(token) if token.as_str() == id.as_str() => GuardDecision::Reenter,
            _ => GuardDecision::Proceed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn id(path: &str) -> EnvironmentId {
        EnvironmentId::from_canonical(PathBuf::from(path))
    }

    #[test]
    fn no_token_proceeds() {
        assert_eq!(
            InvocationContext::fresh().decide(&id("/apps/a.py")),
            GuardDecision::Proceed
        );
    }

    #[test]
    fn matching_token_reenters() {
        let target = id("/apps/a.py");
        let context = InvocationContext::new(Some(GuardToken::for_environment(&target)));
        assert_eq!(context.decide(&target), GuardDecision::Reenter);
    }

    #[test]
    fn token_for_another_app_proceeds() {
        let context =
            InvocationContext::new(Some(GuardToken::for_environment(&id("/apps/a.py"))));
        assert_eq!(context.decide(&id("/apps/b.py")), GuardDecision::Proceed);
    }

    #[test]
    fn empty_value_is_no_token() {
        assert!(GuardToken::from_env_value(OsString::from("")).is_none());
        assert!(GuardToken::from_env_value(OsString::from("  ")).is_none());
        assert_eq!(
            GuardToken::from_env_value(OsString::from("app-0123")).map(|t| t.0),
            Some("app-0123".to_string())
        );
    }

    #[test]
    fn env_pair_uses_guard_variable() {
        let token = GuardToken::for_environment(&id("/apps/a.py"));
        let (name, value) = token.env_pair();
        assert_eq!(name, GUARD_ENV_VAR);
        assert_eq!(value, token.as_str());
    }
}

//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use super::output::Severity;
use super::theme::EnvyTheme;
use super::{parse_answer, OutputMode, Prompt, SpinnerHandle, UserInterface};
use crate::error::Result;

/// Environment variable prefix for answering prompts without a terminal,
/// e.g. `ENVY_PROMPT_DELETE=yes`.
pub const PROMPT_ENV_PREFIX: &str = "ENVY_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `ENVY_PROMPT_<KEY>` variables or fall back to
/// their default. Spinners become single status lines.
pub struct NonInteractiveUI {
    mode: OutputMode,
    theme: EnvyTheme,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();
        Self::with_overrides(mode, env_overrides)
    }

    fn override_for(&self, key: &str) -> Option<&String> {
        let var = format!("{}{}", PROMPT_ENV_PREFIX, key.to_uppercase());
        self.env_overrides.get(&var)
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            theme: EnvyTheme::detect(),
            env_overrides: overrides,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        print_line(&self.theme, self.mode, Severity::Plain, msg);
    }

    fn success(&mut self, msg: &str) {
        print_line(&self.theme, self.mode, Severity::Success, msg);
    }

    fn warning(&mut self, msg: &str) {
        print_line(&self.theme, self.mode, Severity::Warning, msg);
    }

    fn error(&mut self, msg: &str) {
        print_line(&self.theme, self.mode, Severity::Error, msg);
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        let answer = match self.override_for(&prompt.key) {
            Some(value) => parse_answer(value),
            None => prompt.default,
        };
        tracing::debug!("Answered '{}' non-interactively: {}", prompt.key, answer);
        Ok(answer)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            eprintln!("  {}", message);
        }
        Box::new(LineSpinner {
            mode: self.mode,
            theme: self.theme.clone(),
        })
    }

    fn show_header(&mut self, title: &str) {
        print_line(&self.theme, self.mode, Severity::Header, title);
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

fn print_line(theme: &EnvyTheme, mode: OutputMode, severity: Severity, msg: &str) {
    if mode.shows(severity) {
        eprintln!("{}", theme.render(severity, msg));
    }
}

/// Spinner stand-in: no animation, just the outcome as an indented line.
struct LineSpinner {
    mode: OutputMode,
    theme: EnvyTheme,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows(Severity::Success) {
            eprintln!("  {}", self.theme.render(Severity::Success, msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("  {}", self.theme.render(Severity::Error, msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_with(overrides: &[(&str, &str)]) -> NonInteractiveUI {
        let map = overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NonInteractiveUI::with_overrides(OutputMode::Silent, map)
    }

    #[test]
    fn confirm_uses_default_without_override() {
        let mut ui = ui_with(&[]);
        assert!(!ui.confirm(&Prompt::new("delete", "Delete?", false)).unwrap());
        assert!(ui.confirm(&Prompt::new("proceed", "Proceed?", true)).unwrap());
    }

    #[test]
    fn confirm_reads_env_override() {
        let mut ui = ui_with(&[("ENVY_PROMPT_DELETE", "yes")]);
        assert!(ui.confirm(&Prompt::new("delete", "Delete?", false)).unwrap());
    }

    #[test]
    fn never_interactive() {
        let ui = ui_with(&[]);
        assert!(!ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}

//! User-facing output: a terminal UI with spinners and prompts, a plain
//! line-based UI for CI and pipes, and a recording mock.
//!
//! Everything is written to stderr; stdout belongs to the launched
//! application.
//!
//! # Example
//!
//! ```
//! use envy::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("photo_viewer.py");
//! ui.success("Environment ready");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, UiEvent};
pub use non_interactive::NonInteractiveUI;
pub use output::{OutputMode, Severity};
pub use prompts::confirm_on;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, EnvyTheme};

use crate::error::Result;

/// Everything the launcher tells or asks the user goes through here, so
/// commands can be driven by [`MockUI`] in tests.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// An unadorned status line.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    /// Shown even with `--quiet`.
    fn warning(&mut self, msg: &str);

    /// Always shown.
    fn error(&mut self, msg: &str);

    /// Yes/no question. Without a terminal the answer comes from the
    /// prompt's override or default.
    fn confirm(&mut self, prompt: &Prompt) -> Result<bool>;

    /// Spinner for a subprocess phase (venv creation, pip).
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Title line naming the script or environment being worked on.
    fn show_header(&mut self, title: &str);

    fn is_interactive(&self) -> bool;
}

/// A running spinner; finishing replaces it with a final line.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);

    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);
}

/// A yes/no question.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Stable key, used for environment overrides and test responses.
    pub key: String,
    /// The question to display.
    pub question: String,
    /// Answer when the user just presses enter or cannot be asked.
    pub default: bool,
}

impl Prompt {
    pub fn new(key: &str, question: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.to_string(),
            question: question.into(),
            default,
        }
    }
}

/// Interpret a textual answer (`yes`, `y`, `true`, `1`).
pub(crate) fn parse_answer(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_are_case_insensitive() {
        assert!(parse_answer("YES"));
        assert!(parse_answer(" y "));
        assert!(parse_answer("1"));
        assert!(!parse_answer("no"));
        assert!(!parse_answer(""));
    }

    #[test]
    fn prompt_keeps_key_and_default() {
        let prompt = Prompt::new("delete", "Delete the environment?", false);
        assert_eq!(prompt.key, "delete");
        assert!(!prompt.default);
    }
}

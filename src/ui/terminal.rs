//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;

use super::output::Severity;
use super::{
    confirm_on, EnvyTheme, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt,
    SpinnerHandle, UserInterface,
};

/// UI for a person at a terminal. Lines go to stderr; prompts use dialoguer.
pub struct TerminalUI {
    term: Term,
    theme: EnvyTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            term: Term::stderr(),
            theme: EnvyTheme::detect(),
            mode,
        }
    }

    fn emit(&mut self, severity: Severity, msg: &str) {
        if self.mode.shows(severity) {
            let line = self.theme.render(severity, msg);
            writeln!(self.term, "{}", line).ok();
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.emit(Severity::Plain, msg);
    }

    fn success(&mut self, msg: &str) {
        self.emit(Severity::Success, msg);
    }

    fn warning(&mut self, msg: &str) {
        self.emit(Severity::Warning, msg);
    }

    fn error(&mut self, msg: &str) {
        self.emit(Severity::Error, msg);
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        confirm_on(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let spinner = if self.mode.shows_spinners() {
            ProgressSpinner::new(message)
        } else {
            ProgressSpinner::hidden()
        };
        Box::new(spinner)
    }

    fn show_header(&mut self, title: &str) {
        self.emit(Severity::Header, title);
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Pick the terminal UI when asked for one and stderr is a tty, otherwise
/// the non-interactive one.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stderr().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_requested_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn falls_back_when_not_interactive() {
        let ui = create_ui(false, OutputMode::Silent);
        assert!(!ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}

//! Interactive prompts.

use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::error::{EnvyError, Result};

use super::Prompt;

/// Convert dialoguer errors to EnvyError.
fn map_dialoguer_err(e: dialoguer::Error) -> EnvyError {
    EnvyError::Io(e.into())
}

/// Ask `prompt` on `term` and wait for an answer.
pub fn confirm_on(prompt: &Prompt, term: &Term) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(&prompt.question)
        .default(prompt.default)
        .interact_on(term)
        .map_err(map_dialoguer_err)
}

//! Recording UI for tests.
//!
//! `MockUI` keeps every interaction as a [`UiEvent`] in order, including
//! how each spinner finished, and answers prompts from preset responses.
//!
//! # Example
//!
//! ```
//! use envy::ui::{MockUI, Prompt, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("delete", "yes");
//!
//! ui.message("Probing environment");
//! assert!(ui.confirm(&Prompt::new("delete", "Delete?", false)).unwrap());
//! assert!(ui.has_message("Probing"));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;

use super::{parse_answer, OutputMode, Prompt, SpinnerHandle, UserInterface};

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Message(String),
    Success(String),
    Warning(String),
    Error(String),
    Header(String),
    SpinnerStarted(String),
    /// A spinner finished; `ok` is false for `finish_error`.
    SpinnerFinished { message: String, ok: bool },
    Prompt { key: String, answer: bool },
}

type EventLog = Rc<RefCell<Vec<UiEvent>>>;

/// UI that records instead of printing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    events: EventLog,
    prompt_responses: HashMap<String, String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Answer the prompt with `key` using `response` (`y`, `yes`, `n`...).
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    fn collect<F>(&self, pick: F) -> Vec<String>
    where
        F: Fn(&UiEvent) -> Option<&String>,
    {
        self.events.borrow().iter().filter_map(|e| pick(e).cloned()).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Message(m) => Some(m),
            _ => None,
        })
    }

    pub fn successes(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Success(m) => Some(m),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Warning(m) => Some(m),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Error(m) => Some(m),
            _ => None,
        })
    }

    pub fn headers(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Header(m) => Some(m),
            _ => None,
        })
    }

    /// Labels of started spinners.
    pub fn spinners(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::SpinnerStarted(m) => Some(m),
            _ => None,
        })
    }

    /// Keys of the prompts asked.
    pub fn prompts_shown(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Prompt { key, .. } => Some(key),
            _ => None,
        })
    }

    /// Finish messages of spinners that ended with an error.
    pub fn failed_spinners(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::SpinnerFinished { message, ok: false } => Some(message),
            _ => None,
        })
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages().iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes().iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors().iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings().iter().any(|m| m.contains(msg))
    }

    fn record(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.record(UiEvent::Message(msg.to_string()));
    }

    fn success(&mut self, msg: &str) {
        self.record(UiEvent::Success(msg.to_string()));
    }

    fn warning(&mut self, msg: &str) {
        self.record(UiEvent::Warning(msg.to_string()));
    }

    fn error(&mut self, msg: &str) {
        self.record(UiEvent::Error(msg.to_string()));
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        let answer = self
            .prompt_responses
            .get(&prompt.key)
            .map(|r| parse_answer(r))
            .unwrap_or(prompt.default);
        self.record(UiEvent::Prompt {
            key: prompt.key.clone(),
            answer,
        });
        Ok(answer)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.record(UiEvent::SpinnerStarted(message.to_string()));
        Box::new(MockSpinner::attached(Rc::clone(&self.events)))
    }

    fn show_header(&mut self, title: &str) {
        self.record(UiEvent::Header(title.to_string()));
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Spinner that remembers its updates and reports its finish to the owning
/// [`MockUI`], if any.
#[derive(Debug, Default)]
pub struct MockSpinner {
    log: Option<EventLog>,
    messages: Vec<String>,
    finish_message: Option<String>,
    succeeded: Option<bool>,
}

impl MockSpinner {
    /// A spinner not attached to any UI.
    pub fn new() -> Self {
        Self::default()
    }

    fn attached(log: EventLog) -> Self {
        Self {
            log: Some(log),
            ..Default::default()
        }
    }

    /// Messages set while spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn finish_message(&self) -> Option<&str> {
        self.finish_message.as_deref()
    }

    /// `Some(true)` after success, `Some(false)` after error.
    pub fn succeeded(&self) -> Option<bool> {
        self.succeeded
    }

    fn finish(&mut self, msg: &str, ok: bool) {
        self.finish_message = Some(msg.to_string());
        self.succeeded = Some(ok);
        if let Some(log) = &self.log {
            log.borrow_mut().push(UiEvent::SpinnerFinished {
                message: msg.to_string(),
                ok,
            });
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish(msg, true);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(msg, false);
    }
}

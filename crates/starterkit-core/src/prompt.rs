// Operator interaction
//
// Reconciliation loops and the bring-up sequencer talk to the operator only
// through this trait. The binary provides a terminal implementation; tests
// script the answers.

use crate::error::CoreError;

/// Source of operator answers and sink for status messages.
pub trait PromptProvider: Send + Sync {
    /// Free-text answer; implementations reject empty input.
    fn input(&self, prompt: &str) -> Result<String, CoreError>;

    /// One of `choices`, returned verbatim.
    fn select(&self, prompt: &str, choices: &[&str]) -> Result<String, CoreError>;

    fn confirm(&self, prompt: &str) -> Result<bool, CoreError>;

    /// Block until the operator acknowledges `message`.
    fn pause(&self, message: &str) -> Result<(), CoreError>;

    fn notify(&self, message: &str);

    fn warn(&self, message: &str);

    /// A long wait is starting.
    fn progress(&self, _message: &str) {}

    /// The wait announced by [`progress`](Self::progress) finished.
    fn progress_done(&self) {}
}

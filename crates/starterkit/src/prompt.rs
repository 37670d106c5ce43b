//! Terminal implementation of the operator prompt.
//!
//! Questions go through dialoguer, status lines go to stderr, and long
//! waits show an indicatif spinner that is suspended while asking.

use std::io::{self, IsTerminal};
use std::sync::Mutex;
use std::time::Duration;

use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use secrecy::SecretString;

use starterkit_core::{CoreError, PromptProvider};

fn prompt_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Prompt {
        message: e.to_string(),
    }
}

pub struct TerminalPrompter {
    color: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
            spinner: Mutex::new(None),
        }
    }

    /// Run `f` with any active spinner hidden.
    fn suspended<T>(&self, f: impl FnOnce() -> T) -> T {
        let bar = self.spinner.lock().ok().and_then(|slot| slot.clone());
        match bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    fn line(&self, text: &str) {
        self.suspended(|| eprintln!("{text}"));
    }

    /// Hidden entry typed twice. An empty password is accepted for open
    /// networks.
    pub fn secret_with_confirmation(&self, prompt: &str) -> Result<SecretString, CoreError> {
        self.suspended(|| {
            let first = rpassword::prompt_password(format!("{prompt}: ")).map_err(prompt_err)?;
            let second =
                rpassword::prompt_password("Repeat for confirmation: ").map_err(prompt_err)?;
            if first != second {
                return Err(prompt_err("the two entries do not match"));
            }
            Ok(SecretString::from(first))
        })
    }
}

impl PromptProvider for TerminalPrompter {
    fn input(&self, prompt: &str) -> Result<String, CoreError> {
        self.suspended(|| {
            Input::<String>::new()
                .with_prompt(prompt)
                .validate_with(|value: &String| {
                    if value.trim().is_empty() {
                        Err("a value is required")
                    } else {
                        Ok(())
                    }
                })
                .interact_text()
                .map(|value| value.trim().to_owned())
                .map_err(prompt_err)
        })
    }

    fn select(&self, prompt: &str, choices: &[&str]) -> Result<String, CoreError> {
        let index = self.suspended(|| {
            Select::new()
                .with_prompt(prompt)
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)
        })?;
        choices
            .get(index)
            .map(|choice| (*choice).to_owned())
            .ok_or_else(|| prompt_err(format!("selection {index} out of range")))
    }

    fn confirm(&self, prompt: &str) -> Result<bool, CoreError> {
        self.suspended(|| {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .map_err(prompt_err)
        })
    }

    fn pause(&self, message: &str) -> Result<(), CoreError> {
        self.suspended(|| {
            eprintln!("{message}");
            Input::<String>::new()
                .with_prompt("Press Enter to continue")
                .allow_empty(true)
                .show_default(false)
                .interact_text()
                .map(drop)
                .map_err(prompt_err)
        })
    }

    fn notify(&self, message: &str) {
        if self.color {
            self.line(&message.green().to_string());
        } else {
            self.line(message);
        }
    }

    fn warn(&self, message: &str) {
        if self.color {
            self.line(&message.yellow().to_string());
        } else {
            self.line(message);
        }
    }

    fn progress(&self, message: &str) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_owned());
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn progress_done(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

// Scripted stand-ins for the executor, prompts, probe, SSH and downloader.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use serde_json::Value;
use tokio::time::Instant;
use url::Url;

use starterkit_api::{
    ArchiveFetcher, CloudCommand, CommandExecutor, CommandOutput, DeviceConnector, DeviceSession,
    DeviceTarget, Error, ReachabilityProbe, RemoteOutput,
};

use crate::context::{SessionContext, WifiCredentials};
use crate::error::CoreError;
use crate::prompt::PromptProvider;

pub(crate) fn context() -> SessionContext {
    SessionContext::new(
        WifiCredentials {
            ssid: "home-wifi".into(),
            password: SecretString::from("wifi-pass".to_owned()),
        },
        DeviceTarget::new("192.168.4.1", "pi", SecretString::from("raspberry".to_owned())),
        "sampleiotfunction",
    )
}

// ── Command replies ──────────────────────────────────────────────────

pub(crate) fn reply_json(value: Value) -> CommandOutput {
    CommandOutput {
        stdout: value.to_string(),
        stderr: String::new(),
        status: Some(0),
    }
}

pub(crate) fn reply_json_with_stderr(value: Value, stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: value.to_string(),
        stderr: stderr.into(),
        status: Some(0),
    }
}

pub(crate) fn reply_stdout(text: &str) -> CommandOutput {
    CommandOutput {
        stdout: text.into(),
        stderr: String::new(),
        status: Some(0),
    }
}

pub(crate) fn reply_stderr(stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.into(),
        status: Some(1),
    }
}

// ── Executor ─────────────────────────────────────────────────────────

/// Answers by longest matching prefix of the argument line. Replies for a
/// prefix are consumed in order; the last one repeats.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    replies: Mutex<Vec<(String, VecDeque<CommandOutput>)>>,
    calls: Mutex<Vec<String>>,
    programs: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, prefix: &str, reply: CommandOutput) -> Self {
        {
            let mut replies = self.replies.lock().unwrap();
            if let Some((_, queue)) = replies.iter_mut().find(|(p, _)| p == prefix) {
                queue.push_back(reply);
            } else {
                replies.push((prefix.to_owned(), VecDeque::from([reply])));
            }
        }
        self
    }

    /// Argument lines of every command run so far.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn programs(&self) -> Vec<String> {
        self.programs.lock().unwrap().clone()
    }

    /// Calls that change platform state.
    pub(crate) fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.contains(" create")
                    || c.starts_with("group create")
                    || c.contains(" update")
                    || c.contains(" set ")
                    || c.contains("config-zip")
            })
            .collect()
    }
}

impl CommandExecutor for FakeExecutor {
    async fn run(&self, command: &CloudCommand) -> Result<CommandOutput, Error> {
        let line = command.line();
        self.calls.lock().unwrap().push(line.clone());
        self.programs
            .lock()
            .unwrap()
            .push(command.program().to_owned());

        let mut replies = self.replies.lock().unwrap();
        let entry = replies
            .iter_mut()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());
        let Some((_, queue)) = entry else {
            panic!("unexpected command: {line}");
        };
        let reply = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        Ok(reply)
    }
}

// ── Prompts ──────────────────────────────────────────────────────────

/// Replays queued answers and records everything shown.
#[derive(Default)]
pub(crate) struct ScriptedPrompter {
    inputs: Mutex<VecDeque<String>>,
    selections: Mutex<VecDeque<String>>,
    confirmations: Mutex<VecDeque<bool>>,
    pub(crate) asked: Mutex<Vec<String>>,
    pub(crate) offered: Mutex<Vec<Vec<String>>>,
    pub(crate) notes: Mutex<Vec<String>>,
    pub(crate) warnings: Mutex<Vec<String>>,
    pub(crate) pauses: Mutex<u32>,
}

impl ScriptedPrompter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn input(self, answer: &str) -> Self {
        self.inputs.lock().unwrap().push_back(answer.to_owned());
        self
    }

    pub(crate) fn select(self, answer: &str) -> Self {
        self.selections.lock().unwrap().push_back(answer.to_owned());
        self
    }

    pub(crate) fn confirm(self, answer: bool) -> Self {
        self.confirmations.lock().unwrap().push_back(answer);
        self
    }

    pub(crate) fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    pub(crate) fn offered(&self) -> Vec<Vec<String>> {
        self.offered.lock().unwrap().clone()
    }

    pub(crate) fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub(crate) fn pauses(&self) -> u32 {
        *self.pauses.lock().unwrap()
    }

    fn exhausted(prompt: &str) -> CoreError {
        CoreError::Prompt {
            message: format!("no scripted answer for '{prompt}'"),
        }
    }
}

impl PromptProvider for ScriptedPrompter {
    fn input(&self, prompt: &str) -> Result<String, CoreError> {
        self.asked.lock().unwrap().push(prompt.to_owned());
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted(prompt))
    }

    fn select(&self, prompt: &str, choices: &[&str]) -> Result<String, CoreError> {
        self.asked.lock().unwrap().push(prompt.to_owned());
        self.offered
            .lock()
            .unwrap()
            .push(choices.iter().map(|c| (*c).to_owned()).collect());
        self.selections
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted(prompt))
    }

    fn confirm(&self, prompt: &str) -> Result<bool, CoreError> {
        self.asked.lock().unwrap().push(prompt.to_owned());
        self.confirmations
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted(prompt))
    }

    fn pause(&self, _message: &str) -> Result<(), CoreError> {
        *self.pauses.lock().unwrap() += 1;
        Ok(())
    }

    fn notify(&self, message: &str) {
        self.notes.lock().unwrap().push(message.to_owned());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_owned());
    }
}

// ── Reachability ─────────────────────────────────────────────────────

/// Per-host scripted answers; the last answer repeats. Unknown hosts are
/// reachable.
#[derive(Default)]
pub(crate) struct FakeProbe {
    answers: Mutex<HashMap<String, VecDeque<bool>>>,
    pub(crate) log: Mutex<Vec<(String, bool, Instant)>>,
}

impl FakeProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn answers(self, host: &str, answers: &[bool]) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(host.to_owned(), answers.iter().copied().collect());
        self
    }

    pub(crate) fn probes_of(&self, host: &str) -> Vec<(bool, Instant)> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _, _)| h == host)
            .map(|(_, ok, at)| (*ok, *at))
            .collect()
    }
}

impl ReachabilityProbe for FakeProbe {
    async fn is_reachable(&self, host: &str) -> bool {
        let ok = {
            let mut answers = self.answers.lock().unwrap();
            match answers.get_mut(host) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) => queue.front().copied().unwrap_or(true),
                None => true,
            }
        };
        self.log
            .lock()
            .unwrap()
            .push((host.to_owned(), ok, Instant::now()));
        ok
    }
}

// ── SSH ──────────────────────────────────────────────────────────────

/// Shared record of what happened on the fake device.
#[derive(Default)]
pub(crate) struct DeviceLog {
    pub(crate) connected_at: Option<Instant>,
    pub(crate) target: Option<(String, u16, String)>,
    pub(crate) ops: Vec<String>,
    pub(crate) uploaded: Vec<(String, Vec<u8>)>,
    /// Local files handed to `upload`.
    pub(crate) uploaded_from: Vec<PathBuf>,
    /// Whether any uploaded local file still existed at the first `exec`.
    pub(crate) local_copy_at_exec: Option<bool>,
}

#[derive(Default)]
pub(crate) struct FakeConnector {
    pub(crate) reject_login: bool,
    pub(crate) fail_upload: bool,
    /// Exit status by command prefix; unmatched commands exit 0.
    pub(crate) exit_status: Vec<(String, i32)>,
    pub(crate) log: Arc<Mutex<DeviceLog>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting_login() -> Self {
        Self {
            reject_login: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub(crate) fn exiting(mut self, prefix: &str, status: i32) -> Self {
        self.exit_status.push((prefix.to_owned(), status));
        self
    }

    pub(crate) fn ops(&self) -> Vec<String> {
        self.log.lock().unwrap().ops.clone()
    }
}

pub(crate) struct FakeSession {
    fail_upload: bool,
    exit_status: Vec<(String, i32)>,
    log: Arc<Mutex<DeviceLog>>,
}

impl DeviceConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, target: &DeviceTarget) -> Result<FakeSession, Error> {
        if self.reject_login {
            return Err(Error::SshAuthentication {
                user: target.user.clone(),
                host: target.host.clone(),
            });
        }
        {
            let mut log = self.log.lock().unwrap();
            log.connected_at = Some(Instant::now());
            log.target = Some((target.host.clone(), target.port, target.user.clone()));
        }
        Ok(FakeSession {
            fail_upload: self.fail_upload,
            exit_status: self.exit_status.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

impl DeviceSession for FakeSession {
    async fn upload(&self, local: &Path, remote: &str) -> Result<u64, Error> {
        let bytes = std::fs::read(local)?;
        let size = bytes.len() as u64;
        let mut log = self.log.lock().unwrap();
        log.ops.push(format!("upload {remote}"));
        if self.fail_upload {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "channel closed during scp",
            )));
        }
        log.uploaded.push((remote.to_owned(), bytes));
        log.uploaded_from.push(local.to_path_buf());
        Ok(size)
    }

    async fn exec(&self, command: &str) -> Result<RemoteOutput, Error> {
        {
            let mut log = self.log.lock().unwrap();
            if log.local_copy_at_exec.is_none() {
                let present = log.uploaded_from.iter().any(|p| p.exists());
                log.local_copy_at_exec = Some(present);
            }
            log.ops.push(format!("exec {command}"));
        }
        let exit_status = self
            .exit_status
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map_or(0, |(_, status)| *status);
        Ok(RemoteOutput {
            stdout: String::new(),
            exit_status,
        })
    }

    async fn launch_detached(&self, command: &str) -> Result<(), Error> {
        self.log
            .lock()
            .unwrap()
            .ops
            .push(format!("launch {command}"));
        Ok(())
    }
}

// ── Downloads ────────────────────────────────────────────────────────

pub(crate) struct FakeFetcher {
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) fetched: Mutex<Vec<Url>>,
    pub(crate) dests: Mutex<Vec<PathBuf>>,
}

impl FakeFetcher {
    pub(crate) fn serving(body: &[u8]) -> Self {
        Self {
            body: Some(body.to_vec()),
            fetched: Mutex::new(Vec::new()),
            dests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            body: None,
            fetched: Mutex::new(Vec::new()),
            dests: Mutex::new(Vec::new()),
        }
    }
}

impl ArchiveFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, Error> {
        self.fetched.lock().unwrap().push(url.clone());
        self.dests.lock().unwrap().push(dest.to_path_buf());
        match &self.body {
            Some(body) => {
                std::fs::write(dest, body)?;
                Ok(body.len() as u64)
            }
            None => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

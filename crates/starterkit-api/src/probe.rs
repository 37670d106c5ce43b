// Network reachability
//
// A single ICMP echo through the system `ping`, run via the command
// executor so tests can script it.

use std::future::Future;

use tracing::trace;

use crate::exec::{CloudCommand, CommandExecutor};

/// Seconds to wait for the single echo reply.
const WAIT_SECS: u32 = 1;

/// Answers whether a host currently responds.
pub trait ReachabilityProbe: Send + Sync {
    fn is_reachable(&self, host: &str) -> impl Future<Output = bool> + Send;
}

/// Probe backed by one `ping` per call.
#[derive(Debug, Clone)]
pub struct PingProbe<E> {
    executor: E,
    program: String,
}

impl<E: CommandExecutor> PingProbe<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            program: "ping".into(),
        }
    }

    /// One echo request with a bounded wait, in the platform's flag dialect.
    pub fn command(&self, host: &str) -> CloudCommand {
        let cmd = CloudCommand::new(&self.program);
        if cfg!(windows) {
            cmd.args(["-n", "1", "-w"])
                .arg((WAIT_SECS * 1000).to_string())
                .arg(host)
        } else if cfg!(target_os = "macos") {
            cmd.args(["-c", "1", "-W"])
                .arg((WAIT_SECS * 1000).to_string())
                .arg(host)
        } else {
            cmd.args(["-c", "1", "-W"])
                .arg(WAIT_SECS.to_string())
                .arg(host)
        }
    }
}

impl<E: CommandExecutor> ReachabilityProbe for PingProbe<E> {
    async fn is_reachable(&self, host: &str) -> bool {
        let command = self.command(host);
        match self.executor.run(&command).await {
            Ok(output) => {
                trace!(host, status = ?output.status, "ping finished");
                output.success()
            }
            Err(e) => {
                trace!(host, error = %e, "ping could not run");
                false
            }
        }
    }
}

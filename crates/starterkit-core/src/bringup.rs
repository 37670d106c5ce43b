// ── Device bring-up ──
//
// Walks a freshly flashed device from "somewhere on the network" to
// "running its setup script":
//
//   AwaitingNetwork -> AwaitingDeviceReachable -> Connected
//     -> PreparingRemote -> Transferring -> Executing -> Done
//
// Any step failure moves to `Failed` and ends the run; nothing is retried.
// The setup script is started detached and keeps running after we return.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tracing::{debug, error, info, instrument, trace, warn};
use url::Url;

use starterkit_api::{
    ArchiveFetcher, DeviceConnector, DeviceSession, ReachabilityProbe,
};

use crate::context::SessionContext;
use crate::error::CoreError;
use crate::prompt::PromptProvider;

/// Setup scripts archive published for the starter kit.
pub const SCRIPTS_URL: &str = "http://iotcompanionapp.blob.core.windows.net/scripts/scripts.zip";

/// Address the kit's device answers on while serving its own access point.
pub const ACCESS_POINT_ADDRESS: &str = "192.168.4.1";

/// Public host polled to confirm internet access.
pub const NETWORK_PROBE_HOST: &str = "8.8.8.8";

/// Archive name on the device, relative to the login directory.
pub const REMOTE_ARCHIVE: &str = "scripts.zip";

pub const PREREQ_COMMAND: &str = "sudo apt update && sudo apt install -y curl software-properties-common";
pub const UNPACK_COMMAND: &str =
    "unzip -o scripts.zip -d scripts && rm scripts.zip && chmod +x ./scripts/*.sh";

/// Where the setup script's output lands on the device.
pub const REMOTE_LOG: &str = "~/connect.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum BringupState {
    #[strum(to_string = "waiting for network access")]
    AwaitingNetwork,
    #[strum(to_string = "waiting for the device")]
    AwaitingDeviceReachable,
    #[strum(to_string = "connecting to the device")]
    Connected,
    #[strum(to_string = "downloading setup scripts")]
    PreparingRemote,
    #[strum(to_string = "copying setup scripts")]
    Transferring,
    #[strum(to_string = "running setup scripts")]
    Executing,
    #[strum(to_string = "done")]
    Done,
    #[strum(to_string = "failed")]
    Failed,
}

/// Tunables for one bring-up.
#[derive(Debug, Clone)]
pub struct BringupPlan {
    pub network_probe_host: String,
    pub poll_interval: Duration,
    /// Hold after the device first answers, so its access point settles.
    pub settle_delay: Duration,
    pub archive_url: Url,
    /// Ask the operator to act on every failed poll.
    pub interactive: bool,
}

impl BringupPlan {
    pub fn new(archive_url: Url) -> Self {
        Self {
            network_probe_host: NETWORK_PROBE_HOST.into(),
            poll_interval: Duration::from_secs(2),
            settle_delay: Duration::from_secs(5),
            archive_url,
            interactive: true,
        }
    }
}

/// States visited, ending in `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BringupReport {
    pub states: Vec<BringupState>,
}

// ── Remote command construction ──────────────────────────────────────

/// Quote `value` for a POSIX shell: single quotes, with embedded single
/// quotes closed, escaped and reopened.
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// The eight positional arguments of `runner.sh`, in order.
pub struct RunnerArgs([String; 8]);

impl RunnerArgs {
    pub fn from_context(ctx: &SessionContext) -> Result<Self, CoreError> {
        use secrecy::ExposeSecret;

        Ok(Self([
            ctx.wifi.ssid.clone(),
            ctx.wifi.password.expose_secret().to_owned(),
            ctx.hub_cs()?.to_owned(),
            ctx.device_name()?.to_owned(),
            ctx.device_cs()?.to_owned(),
            ctx.registry_name()?.to_owned(),
            ctx.registry_user()?.to_owned(),
            ctx.registry_password()?.to_owned(),
        ]))
    }

    /// Detached launch of the setup script. Contains secrets; never log it.
    pub fn launch_command(&self) -> String {
        let args: Vec<String> = self.0.iter().map(|a| shell_quote(a)).collect();
        format!(
            "sudo nohup ./scripts/runner.sh {} </dev/null >{REMOTE_LOG} 2>&1 &",
            args.join(" ")
        )
    }
}

impl std::fmt::Debug for RunnerArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerArgs").finish_non_exhaustive()
    }
}

// ── Sequencer ────────────────────────────────────────────────────────

pub struct DeviceBringup<'a, Pr, C, F, P> {
    probe: &'a Pr,
    connector: &'a C,
    fetcher: &'a F,
    prompt: &'a P,
    plan: BringupPlan,
    trace: Vec<BringupState>,
}

impl<'a, Pr, C, F, P> DeviceBringup<'a, Pr, C, F, P>
where
    Pr: ReachabilityProbe,
    C: DeviceConnector,
    F: ArchiveFetcher,
    P: PromptProvider,
{
    pub fn new(probe: &'a Pr, connector: &'a C, fetcher: &'a F, prompt: &'a P, plan: BringupPlan) -> Self {
        Self {
            probe,
            connector,
            fetcher,
            prompt,
            plan,
            trace: Vec::new(),
        }
    }

    /// States entered so far.
    pub fn states(&self) -> &[BringupState] {
        &self.trace
    }

    pub fn state(&self) -> Option<BringupState> {
        self.trace.last().copied()
    }

    /// Drive the device to `Done`. Requires a fully completed context.
    #[instrument(skip_all, fields(device = %ctx.target.host))]
    pub async fn run(&mut self, ctx: &SessionContext) -> Result<BringupReport, CoreError> {
        let args = RunnerArgs::from_context(ctx)?;

        match self.drive(ctx, &args).await {
            Ok(()) => {
                self.enter(BringupState::Done);
                Ok(BringupReport {
                    states: self.trace.clone(),
                })
            }
            Err(e) => {
                let at = self.state();
                self.enter(BringupState::Failed);
                error!(state = ?at, error = %e, "device bring-up failed");
                Err(e)
            }
        }
    }

    fn enter(&mut self, state: BringupState) {
        debug!(%state, "bring-up state");
        self.trace.push(state);
    }

    async fn drive(&mut self, ctx: &SessionContext, args: &RunnerArgs) -> Result<(), CoreError> {
        self.enter(BringupState::AwaitingNetwork);
        let network = self.plan.network_probe_host.clone();
        self.wait_until_reachable(
            &network,
            "Please ensure you are connected to a network with internet access now.",
        )
        .await?;

        self.enter(BringupState::AwaitingDeviceReachable);
        let device = ctx.target.host.clone();
        let ask = "Please connect to the SSID of your Raspberry Pi 3 now.";
        if self.plan.interactive {
            self.prompt.notify(ask);
        }
        self.wait_until_reachable(&device, ask).await?;
        trace!(delay = ?self.plan.settle_delay, "device answered, settling");
        tokio::time::sleep(self.plan.settle_delay).await;

        self.enter(BringupState::Connected);
        let session = self
            .connector
            .connect(&ctx.target)
            .await
            .map_err(|e| CoreError::during(BringupState::Connected, e))?;
        info!(host = %ctx.target.host, user = %ctx.target.user, "connected to device");

        self.enter(BringupState::PreparingRemote);
        let scratch = tempfile::tempdir()
            .map_err(|e| CoreError::during(BringupState::PreparingRemote, e))?;
        let local = scratch.path().join(REMOTE_ARCHIVE);
        let bytes = match self.fetcher.fetch(&self.plan.archive_url, &local).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if ctx.target.host == ACCESS_POINT_ADDRESS {
                    warn!(
                        url = %self.plan.archive_url,
                        "download failed while joined to the device access point"
                    );
                    self.prompt.warn(
                        "This machine is joined to the device's access point, which has no \
                         internet route. Point device.scripts_url at a mirror reachable from \
                         the device network, or set --device-ip to the device's LAN address.",
                    );
                }
                return Err(CoreError::during(BringupState::PreparingRemote, e));
            }
        };
        debug!(bytes, "setup scripts downloaded");

        self.enter(BringupState::Transferring);
        transfer(&session, &local)
            .await
            .map_err(|e| CoreError::during(BringupState::Transferring, e))?;

        self.enter(BringupState::Executing);
        self.prompt.notify(
            "Connecting to your device and installing pre-requisites (Step 1 of 2).",
        );
        self.execute(&session, args)
            .await
            .map_err(|e| CoreError::during(BringupState::Executing, e))?;
        self.prompt.notify(
            "Installing the required software now (Step 2 of 2). Setup on your device will take \
             several minutes. Execute 'tail -f ~/connect.log' on the device to view progress.",
        );
        Ok(())
    }

    /// Poll `host` until it answers. Unbounded.
    async fn wait_until_reachable(&self, host: &str, ask: &str) -> Result<(), CoreError> {
        self.prompt.progress(&format!("Waiting for {host}"));
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if self.probe.is_reachable(host).await {
                debug!(host, attempt, "reachable");
                self.prompt.progress_done();
                return Ok(());
            }
            trace!(host, attempt, "not reachable yet");
            if self.plan.interactive {
                self.prompt.pause(ask)?;
            }
            tokio::time::sleep(self.plan.poll_interval).await;
        }
    }

    async fn execute(&self, session: &C::Session, args: &RunnerArgs) -> Result<(), CoreError> {
        let prereq = session.exec(PREREQ_COMMAND).await?;
        if prereq.exit_status != 0 {
            warn!(status = prereq.exit_status, "installing prerequisites failed");
            self.prompt.warn(&format!(
                "Installing prerequisites exited with status {}; continuing",
                prereq.exit_status
            ));
        }

        let unpack = session.exec(UNPACK_COMMAND).await?;
        if unpack.exit_status != 0 {
            return Err(CoreError::Device {
                message: format!(
                    "unpacking setup scripts exited with status {}",
                    unpack.exit_status
                ),
            });
        }

        session.launch_detached(&args.launch_command()).await?;
        info!("setup script launched");
        Ok(())
    }
}

/// Copy the archive to the device and drop the local copy.
async fn transfer<S: DeviceSession>(session: &S, local: &Path) -> Result<(), CoreError> {
    let size = session.upload(local, REMOTE_ARCHIVE).await?;
    debug!(size, "setup scripts copied");
    tokio::fs::remove_file(local).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;

// SSH access to a physical device
//
// libssh2 is blocking, so every session call is moved onto tokio's
// blocking pool and awaited before the next one starts. The session
// handle is cheap to clone and shared with each worker closure.

use std::future::Future;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;

/// Login details for a device.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
}

impl DeviceTarget {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            password,
        }
    }
}

/// Result of a remote command run to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub stdout: String,
    pub exit_status: i32,
}

/// Opens authenticated sessions to devices.
pub trait DeviceConnector: Send + Sync {
    type Session: DeviceSession;

    fn connect(
        &self,
        target: &DeviceTarget,
    ) -> impl Future<Output = Result<Self::Session, Error>> + Send;
}

/// An open remote-command channel plus file transfer over it.
pub trait DeviceSession: Send + Sync {
    /// Copy a local file to `remote` (relative to the login directory).
    fn upload(&self, local: &Path, remote: &str)
    -> impl Future<Output = Result<u64, Error>> + Send;

    /// Run `command` and wait for it to exit.
    fn exec(&self, command: &str) -> impl Future<Output = Result<RemoteOutput, Error>> + Send;

    /// Start `command` and return once the channel closes, without reading
    /// its output. Used for commands that background themselves.
    fn launch_detached(&self, command: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

// ── libssh2 implementation ───────────────────────────────────────────

/// Password-authenticated connector over `ssh2`.
#[derive(Debug, Clone)]
pub struct SshConnector {
    timeout: Duration,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

impl SshConnector {
    /// `timeout` bounds the TCP connect and the handshake only.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Live libssh2 session.
pub struct SshSession {
    inner: ssh2::Session,
}

async fn blocking<T, F>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::SshWorker(e.to_string()))?
}

impl DeviceConnector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, target: &DeviceTarget) -> Result<SshSession, Error> {
        let target = target.clone();
        let timeout = self.timeout;
        debug!(host = %target.host, port = target.port, user = %target.user, "opening SSH session");

        blocking(move || {
            let addr = (target.host.as_str(), target.port)
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no address for {}", target.host),
                    ))
                })?;
            let tcp = TcpStream::connect_timeout(&addr, timeout)?;

            let mut session = ssh2::Session::new()?;
            session.set_tcp_stream(tcp);
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
            session.handshake()?;

            let refused = || Error::SshAuthentication {
                user: target.user.clone(),
                host: target.host.clone(),
            };
            session
                .userauth_password(&target.user, target.password.expose_secret())
                .map_err(|_| refused())?;
            if !session.authenticated() {
                return Err(refused());
            }

            // Remote commands may run for minutes.
            session.set_timeout(0);
            Ok(SshSession { inner: session })
        })
        .await
    }
}

impl DeviceSession for SshSession {
    async fn upload(&self, local: &Path, remote: &str) -> Result<u64, Error> {
        let session = self.inner.clone();
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_owned();

        blocking(move || {
            let contents = std::fs::read(&local)?;
            let size = contents.len() as u64;
            debug!(local = %local.display(), %remote, size, "scp upload");

            let mut channel = session.scp_send(Path::new(&remote), 0o644, size, None)?;
            channel.write_all(&contents)?;
            channel.send_eof()?;
            channel.wait_eof()?;
            channel.close()?;
            channel.wait_close()?;
            Ok(size)
        })
        .await
    }

    async fn exec(&self, command: &str) -> Result<RemoteOutput, Error> {
        let session = self.inner.clone();
        let command = command.to_owned();

        blocking(move || {
            let mut channel = session.channel_session()?;
            channel.exec(&command)?;
            let mut stdout = String::new();
            channel.read_to_string(&mut stdout)?;
            channel.wait_close()?;
            Ok(RemoteOutput {
                stdout,
                exit_status: channel.exit_status()?,
            })
        })
        .await
    }

    async fn launch_detached(&self, command: &str) -> Result<(), Error> {
        let session = self.inner.clone();
        let command = command.to_owned();

        blocking(move || {
            let mut channel = session.channel_session()?;
            channel.exec(&command)?;
            channel.send_eof()?;
            channel.wait_close()?;
            Ok(())
        })
        .await
    }
}

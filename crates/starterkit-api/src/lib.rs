// starterkit-api: process, HTTP and SSH plumbing for IoT starter kit provisioning

pub mod az;
pub mod button;
pub mod download;
pub mod error;
pub mod exec;
pub mod models;
pub mod probe;
pub mod ssh;
pub mod transport;

pub use az::Az;
pub use button::{ButtonClient, DEFAULT_BUTTON_URL};
pub use download::{ArchiveDownloader, ArchiveFetcher};
pub use error::Error;
pub use exec::{CloudCommand, CommandExecutor, CommandOutput, JsonOutput, ProcessExecutor};
pub use probe::{PingProbe, ReachabilityProbe};
pub use ssh::{DeviceConnector, DeviceSession, DeviceTarget, RemoteOutput, SshConnector, SshSession};
pub use transport::TransportConfig;

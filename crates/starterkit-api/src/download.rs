// Archive download
//
// Fetches the device setup scripts archive to a local file before it is
// copied to the device.

use std::future::Future;
use std::path::Path;

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Downloads a remote file to a local path.
pub trait ArchiveFetcher: Send + Sync {
    /// Write the body at `url` to `dest`, returning the byte count.
    fn fetch(&self, url: &Url, dest: &Path) -> impl Future<Output = Result<u64, Error>> + Send;
}

/// `reqwest`-backed fetcher. Non-2xx responses are errors.
pub struct ArchiveDownloader {
    http: reqwest::Client,
}

impl ArchiveDownloader {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::from_reqwest(transport.build_client()?))
    }

    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ArchiveFetcher for ArchiveDownloader {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, Error> {
        debug!(%url, dest = %dest.display(), "downloading archive");

        let bytes = self
            .http
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(dest, &bytes).await?;
        let len = bytes.len() as u64;
        debug!(bytes = len, "archive saved");
        Ok(len)
    }
}

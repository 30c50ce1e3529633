pub mod fetch;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod segment;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::trace;

use crate::error::{DownloadError, FetchError};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Anything that can turn a segment URL into its bytes.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

pub struct DownloadClient {
    client: reqwest::Client,
}

impl DownloadClient {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(DownloadError::Client)?;

        Ok(Self { client })
    }

    pub async fn download(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::from_reqwest(url, err))?;

        let status = response.status();
        ensure_success(url, status)?;

        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::from_reqwest(url, err))?;

        trace!(url, status = status.as_u16(), len = bytes.len(), "Response received");

        Ok(bytes)
    }
}

/// Anything but 2xx is fatal for the segment, redirects included once reqwest
/// has stopped following them.
fn ensure_success(url: &str, status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::http_status(url, status))
    }
}

#[async_trait]
impl SegmentSource for DownloadClient {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.download(url).await
    }
}

use std::path::PathBuf;

use reqwest::StatusCode;

/// Failure of a single segment request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("connection to {url} failed: {reason}")]
    Transient { url: String, reason: String },

    #[error("request for {url} failed with HTTP {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("request for {url} could not be sent: {reason}")]
    Request { url: String, reason: String },
}

impl FetchError {
    pub fn transient(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transient {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn http_status(url: impl Into<String>, status: StatusCode) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Connection-level failures are worth another attempt, an error status is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classify a reqwest error by whether it happened before a response arrived.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::http_status(url, status);
        }

        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            Self::transient(url, err)
        } else {
            Self::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Failure of a whole segment batch. Any of these aborts the clip.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download cancelled")]
    Cancelled,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("gave up on segment {index} after {attempts} attempts: {source}")]
    RetriesExhausted {
        index: u64,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DownloadError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Failure of the external muxer.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("muxer binary `{binary}` was not found")]
    Missing { binary: String },

    #[error("video concatenation failed with code {}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Failed { code: Option<i32> },

    #[error("failed to run muxer: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

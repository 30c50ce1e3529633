pub mod download_error;
pub mod input_error;

use std::path::PathBuf;

pub use download_error::{DownloadError, FetchError, MuxError};
pub use input_error::InputError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: &str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Mux(#[from] MuxError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("failed to read batch file {}: {reason}", path.display())]
    BatchFile { path: PathBuf, reason: String },

    #[error("{failed} of {total} batch entries failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

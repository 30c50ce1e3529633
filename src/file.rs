use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use crate::clip::Timestamp;
use crate::download::pipeline::{ClipDownloader, ClipRequest};
use crate::download::SegmentSource;
use crate::error::{Error, InputError, Result};
use crate::options::Options;
use crate::output::{self, Tone};
use crate::prompt;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    url: String,
    timestamp: String,
    seconds: Option<u64>,
    seconds_before: Option<u64>,
}

impl BatchEntry {
    /// Missing window lengths fall back to the configured defaults.
    pub fn to_request(&self, options: &Options) -> std::result::Result<ClipRequest, InputError> {
        Ok(ClipRequest {
            clip: prompt::parse_clip(&self.url)?,
            timestamp: Timestamp::parse(self.timestamp.trim())?,
            seconds_after: self.seconds.unwrap_or(options.seconds_after),
            seconds_before: self.seconds_before.unwrap_or(options.seconds_before),
        })
    }
}

pub async fn read_entries(file: &Path) -> Result<Vec<BatchEntry>> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .map_err(|err| Error::BatchFile {
            path: file.to_path_buf(),
            reason: err.to_string(),
        })?;

    serde_json::from_str(&contents).map_err(|err| Error::BatchFile {
        path: file.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Download every entry of a batch file in order.
///
/// A failing entry is reported and skipped. The batch fails at the end if any
/// entry failed.
pub async fn download_file<S: SegmentSource + 'static>(
    file: &Path,
    downloader: &ClipDownloader<S>,
    options: &Options,
) -> Result<()> {
    let entries = read_entries(file).await?;
    let total = entries.len();
    let mut failed = 0;

    info!(file = %file.display(), entries = total, "Processing batch file");

    for (number, entry) in entries.iter().enumerate() {
        println!();

        let request = match entry.to_request(options) {
            Ok(request) => request,
            Err(err) => {
                error!(entry = number, url = %entry.url, error = %err, "Invalid batch entry");
                output::status(Tone::Error, format!("Skipping entry {}: {}", number + 1, err));
                failed += 1;
                continue;
            }
        };

        let destination = downloader.output_path(&request);
        if destination.exists() {
            output::status(
                Tone::Warning,
                format!("{} already exists, therefore skipping download", destination.display()),
            );
            continue;
        }

        output::status(
            Tone::Info,
            format!("Downloading {} at {}", request.clip, request.timestamp),
        );

        match downloader.download(&request).await {
            Ok(path) => output::status(Tone::Success, format!("Video saved to: {}", path.display())),
            Err(err) => {
                error!(entry = number, clip = %request.clip, error = %err, "Batch entry failed");
                output::status(Tone::Error, format!("Error downloading {}: {}", entry.url, err));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(Error::BatchFailed { failed, total });
    }

    Ok(())
}

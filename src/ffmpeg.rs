use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::MuxError;
use crate::options::Options;

/// The external muxer that stitches cached segments into one video.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
    codec: String,
    crf: u8,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>, codec: impl Into<String>, crf: u8) -> Self {
        Self {
            binary: binary.into(),
            codec: codec.into(),
            crf,
        }
    }

    pub fn from_options(options: &Options) -> Self {
        Self::new(&options.ffmpeg, &options.output_codec, options.output_crf)
    }

    /// Whether `ffmpeg -version` runs and exits successfully.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn concat_args(&self, manifest: &Path, destination: &Path) -> Vec<OsString> {
        let crf = self.crf.to_string();
        let mut args: Vec<OsString> = ["-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(manifest.as_os_str().to_owned());
        args.extend(
            [
                "-c",
                "copy",
                "-c:v",
                self.codec.as_str(),
                "-crf",
                crf.as_str(),
                "-v",
                "error",
                "-stats",
                "-y",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(destination.as_os_str().to_owned());
        args
    }

    /// Concatenate the files listed in `manifest` into `destination`.
    ///
    /// Output is inherited so ffmpeg's own progress stays visible.
    pub async fn concat(&self, manifest: &Path, destination: &Path) -> Result<(), MuxError> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.concat_args(manifest, destination);
        debug!(binary = %self.binary, ?args, "Running muxer");

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MuxError::Missing {
                    binary: self.binary.clone(),
                },
                _ => MuxError::Io { source: e },
            })?;

        if !status.success() {
            return Err(MuxError::Failed {
                code: status.code(),
            });
        }

        info!(destination = %destination.display(), "Video concatenated");
        Ok(())
    }
}

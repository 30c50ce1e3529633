use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::clip::{Clip, Timestamp};
use crate::download::fetch::{FetchReport, Fetcher};
use crate::download::manifest::{write_manifest, MANIFEST_FILE};
use crate::download::retry::RetryPolicy;
use crate::download::segment::{Segment, SegmentResolver};
use crate::download::{DownloadClient, SegmentSource};
use crate::error::{DownloadError, Result};
use crate::ffmpeg::Ffmpeg;
use crate::options::Options;
use crate::output::{self, Tone};

/// A window of a clip: `seconds_before` before `timestamp` to `seconds_after` after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub clip: Clip,
    pub timestamp: Timestamp,
    pub seconds_after: u64,
    pub seconds_before: u64,
}

impl ClipRequest {
    pub fn window(&self) -> (Timestamp, Timestamp) {
        (
            self.timestamp - saturating_i64(self.seconds_before),
            self.timestamp + saturating_i64(self.seconds_after),
        )
    }

    /// `{output}/{clip dir}/{HH-MM-SS}_{before}-{after}.mp4`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.clip.download_dir_name()).join(format!(
            "{}_{}-{}.mp4",
            self.timestamp.machine(),
            self.seconds_before,
            self.seconds_after
        ))
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub struct ClipDownloader<S> {
    resolver: SegmentResolver,
    fetcher: Fetcher<S>,
    ffmpeg: Ffmpeg,
    concurrency: usize,
    use_cache: bool,
    output_dir: PathBuf,
}

impl ClipDownloader<DownloadClient> {
    pub fn from_options(options: &Options) -> std::result::Result<Self, DownloadError> {
        let client = DownloadClient::new(options.request_timeout)?;
        let fetcher = Fetcher::new(Arc::new(client), RetryPolicy::from_options(options))
            .with_progress_bar(true);

        Ok(Self::new(options, fetcher))
    }
}

impl<S: SegmentSource + 'static> ClipDownloader<S> {
    pub fn new(options: &Options, fetcher: Fetcher<S>) -> Self {
        Self {
            resolver: SegmentResolver::from_options(options),
            fetcher,
            ffmpeg: Ffmpeg::from_options(options),
            concurrency: options.max_parallel_downloads,
            use_cache: options.use_cache,
            output_dir: options.output_dir.clone(),
        }
    }

    pub fn output_path(&self, request: &ClipRequest) -> PathBuf {
        request.output_path(&self.output_dir)
    }

    /// Resolve the window to segments and make sure all of them are cached.
    pub async fn fetch_segments(&self, request: &ClipRequest) -> Result<(Vec<Segment>, FetchReport)> {
        let (from, to) = request.window();
        let indexes = self.resolver.index_range(from, to);

        info!(
            clip = %request.clip,
            from = %from,
            to = %to,
            segment_seconds = self.resolver.segment_seconds().get(),
            first = indexes.start(),
            last = indexes.end(),
            "Resolving segments"
        );

        let segments = self.resolver.resolve(&request.clip, indexes)?;
        let report = self
            .fetcher
            .fetch_all(&segments, self.concurrency, self.use_cache)
            .await?;

        Ok((segments, report))
    }

    /// Download the window and mux it into one video. Returns the video path.
    ///
    /// Cached segments stay on disk whatever happens, so a failed run can be
    /// repeated cheaply.
    pub async fn download(&self, request: &ClipRequest) -> Result<PathBuf> {
        let (segments, report) = self.fetch_segments(request).await?;
        info!(
            completed = report.completed,
            cached = report.cached(),
            fetched = report.fetched(),
            "Segments ready for muxing"
        );

        let manifest = self.resolver.clip_dir(&request.clip).join(MANIFEST_FILE);
        let destination = self.output_path(request);

        write_manifest(&segments, &manifest).await?;
        let muxed = self.ffmpeg.concat(&manifest, &destination).await;

        if let Err(err) = tokio::fs::remove_file(&manifest).await {
            warn!(path = %manifest.display(), error = %err, "Failed to remove concat list");
            output::status(
                Tone::Warning,
                format!("Could not remove {}: {}", manifest.display(), err),
            );
        }

        muxed?;
        Ok(destination)
    }
}

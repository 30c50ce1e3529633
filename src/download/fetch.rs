use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::download::progress::Progress;
use crate::download::retry::{retry_transient, RetryPolicy};
use crate::download::segment::Segment;
use crate::download::SegmentSource;
use crate::error::DownloadError;

/// What happened to one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The file was already on disk and the network was not touched.
    Cached,
    /// The file was downloaded and written.
    Fetched,
}

#[derive(Debug)]
pub struct FetchReport {
    /// One entry per input segment, in input order.
    pub statuses: Vec<(u64, FetchStatus)>,
    pub completed: usize,
}

impl FetchReport {
    pub fn cached(&self) -> usize {
        self.count(FetchStatus::Cached)
    }

    pub fn fetched(&self) -> usize {
        self.count(FetchStatus::Fetched)
    }

    fn count(&self, status: FetchStatus) -> usize {
        self.statuses.iter().filter(|(_, s)| *s == status).count()
    }
}

enum Outcome {
    Cached,
    Fetched(Bytes),
}

pub struct Fetcher<S> {
    source: Arc<S>,
    retry: RetryPolicy,
    progress_bar: bool,
}

impl<S: SegmentSource + 'static> Fetcher<S> {
    pub fn new(source: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            progress_bar: false,
        }
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    /// Make every segment available on disk.
    ///
    /// At most `concurrency` requests are in flight at once. Bodies are kept in
    /// memory until every request has settled and only then written, so a
    /// failed batch never leaves a half-written file behind. The first
    /// non-transient failure aborts the remaining requests.
    pub async fn fetch_all(
        &self,
        segments: &[Segment],
        concurrency: usize,
        use_cache: bool,
    ) -> Result<FetchReport, DownloadError> {
        let progress = Arc::new(if self.progress_bar {
            Progress::new(segments.len())
        } else {
            Progress::hidden(segments.len())
        });
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

        info!(
            segments = segments.len(),
            concurrency, use_cache, "Downloading segments"
        );

        let mut tasks = JoinSet::new();
        for (position, segment) in segments.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);
            let retry = self.retry.clone();

            tasks.spawn(async move {
                if use_cache && tokio::fs::try_exists(&segment.local_path).await.unwrap_or(false) {
                    debug!(index = segment.index, "Segment already exists");
                    progress.advance(segment.index, true);
                    return Ok::<_, DownloadError>((position, Outcome::Cached));
                }

                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| DownloadError::Cancelled)?;

                debug!(index = segment.index, url = %segment.remote_url, "Downloading segment");

                let source: &S = &source;
                let url = segment.remote_url.as_str();
                let bytes = retry_transient(&retry, move |_| source.fetch(url))
                    .await
                    .map_err(|(attempts, err)| {
                        if err.is_transient() {
                            DownloadError::RetriesExhausted {
                                index: segment.index,
                                attempts,
                                source: err,
                            }
                        } else {
                            DownloadError::Fetch(err)
                        }
                    })?;

                debug!(index = segment.index, len = bytes.len(), "Segment received");
                progress.advance(segment.index, false);

                Ok((position, Outcome::Fetched(bytes)))
            });
        }

        let mut results = Vec::with_capacity(segments.len());
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(DownloadError::from).and_then(|r| r);
            match result {
                Ok(result) => results.push(result),
                Err(err) => {
                    error!(error = %err, "Segment download failed, aborting batch");
                    tasks.shutdown().await;
                    progress.abandon();
                    return Err(err);
                }
            }
        }
        progress.finish();

        results.sort_by_key(|(position, _)| *position);

        let mut statuses = Vec::with_capacity(results.len());
        for (position, outcome) in results {
            let segment = &segments[position];
            let status = match outcome {
                Outcome::Cached => FetchStatus::Cached,
                Outcome::Fetched(bytes) => {
                    write_segment(&segment.local_path, &bytes).await?;
                    FetchStatus::Fetched
                }
            };
            statuses.push((segment.index, status));
        }

        let report = FetchReport {
            statuses,
            completed: progress.completed(),
        };
        info!(
            cached = report.cached(),
            fetched = report.fetched(),
            "Downloaded all {} segments",
            segments.len()
        );

        Ok(report)
    }
}

async fn write_segment(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::filesystem(parent, e))?;
    }

    let partial = partial_path(path);
    tokio::fs::write(&partial, bytes)
        .await
        .map_err(|e| DownloadError::filesystem(&partial, e))?;

    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| DownloadError::filesystem(path, e))
}

/// `seg_00001.ts` is written as `seg_00001.ts.part` and renamed once complete,
/// so an interrupted write never looks like a cached segment.
fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    PathBuf::from(partial)
}

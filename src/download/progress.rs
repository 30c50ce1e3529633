use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Count of segments that are ready, shared by every fetch task.
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>4}/{len} segments ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━╌"),
        );
        bar.set_message("Downloading segments...");

        Self::with_bar(total, bar)
    }

    pub fn hidden(total: usize) -> Self {
        Self::with_bar(total, ProgressBar::hidden())
    }

    fn with_bar(total: usize, bar: ProgressBar) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            bar,
        }
    }

    /// Mark one more segment as ready and return the new count.
    pub fn advance(&self, index: u64, cached: bool) -> usize {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.bar.inc(1);

        debug!(
            index,
            cached,
            "[{:width$} / {}] Segment ready",
            done,
            self.total,
            width = self.total.to_string().len()
        );

        done
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Every event of the run, kept in memory so it can be saved when something
/// goes wrong.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    buffer: Arc<Mutex<Vec<u8>>>,
}

pub struct ExecutionLogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for ExecutionLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| io::Error::other("execution log lock poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for ExecutionLog {
    type Writer = ExecutionLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ExecutionLogWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl ExecutionLog {
    pub fn contents(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default()
    }

    /// Save the log as `{dir}/{YYYY-mm-dd_HH-MM-SS}.log`.
    pub fn persist(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let name = format!("{}.log", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let path = dir.join(name);
        std::fs::write(&path, self.contents())?;

        Ok(path)
    }
}

const CONSOLE_LOG_LEVEL: &str = "info";

/// `debug` with `verbose`, otherwise `RUST_LOG` or info.
fn console_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_LOG_LEVEL))
    }
}

/// The execution log always records debug and above, whatever the console shows.
pub fn init_logging(verbose: bool) -> ExecutionLog {
    let log = ExecutionLog::default();

    let registry = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .with_filter(console_filter(verbose)),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log.clone())
                .with_filter(LevelFilter::DEBUG),
        );

    if let Err(err) = registry.try_init() {
        eprintln!("Failed to initialize logging: {}", err);
    }

    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn persists_captured_events() {
        let log = ExecutionLog::default();
        let mut writer = log.make_writer();
        writer.write_all(b"first line\n").unwrap();
        log.make_writer().write_all(b"second line\n").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = log.persist(&dir.path().join("logs")).unwrap();

        assert_eq!(path.extension().unwrap(), "log");
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "first line\nsecond line\n"
        );
    }

    #[test]
    fn captures_tracing_events() {
        let log = ExecutionLog::default();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log.clone())
                .with_filter(LevelFilter::DEBUG),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(index = 7, "Segment ready");
            tracing::trace!("not recorded");
        });

        let text = String::from_utf8(log.contents()).unwrap();
        assert!(text.contains("Segment ready"));
        assert!(text.contains("index=7"));
        assert!(!text.contains("not recorded"));
    }

    #[test]
    fn console_shows_stage_events_by_default() {
        assert_eq!(
            EnvFilter::new(CONSOLE_LOG_LEVEL).max_level_hint(),
            Some(LevelFilter::INFO)
        );
        assert_eq!(console_filter(true).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "config.cfg";
pub const DEFAULT_BASE_URL: &str = "https://clips.pump.fun";
pub const SEGMENTS_DIR: &str = "_segments";
pub const DEFAULT_SEGMENT_SECONDS: NonZeroU64 = NonZeroU64::MIN.saturating_add(1);

const TRUE_VALUES: [&str; 5] = ["1", "true", "t", "y", "yes"];

#[derive(Debug, Clone)]
pub struct Options {
    pub segment_seconds: NonZeroU64,
    pub max_parallel_downloads: usize,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub base_url: String,
    pub segments_dir: String,
    pub seconds_after: u64,
    pub seconds_before: u64,
    /// Ask for the window length when it was not given on the command line.
    pub prompt_seconds: bool,
    pub use_cache: bool,
    pub retry_delay: Duration,
    /// Attempts per segment including the first. `None` retries forever.
    pub retry_max_attempts: Option<u32>,
    pub request_timeout: Duration,
    pub ffmpeg: String,
    pub output_codec: String,
    pub output_crf: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            segment_seconds: DEFAULT_SEGMENT_SECONDS,
            max_parallel_downloads: 5,
            cache_dir: PathBuf::from("cache"),
            output_dir: PathBuf::from("clips"),
            log_dir: PathBuf::from(".execution_logs"),
            base_url: DEFAULT_BASE_URL.to_string(),
            segments_dir: SEGMENTS_DIR.to_string(),
            seconds_after: 30,
            seconds_before: 10,
            prompt_seconds: true,
            use_cache: true,
            retry_delay: Duration::from_secs(3),
            retry_max_attempts: None,
            request_timeout: Duration::from_secs(30),
            ffmpeg: "ffmpeg".to_string(),
            output_codec: "libx264".to_string(),
            output_crf: 24,
        }
    }
}

impl Options {
    /// Load `path`, or the default config file when it exists, on top of the defaults.
    ///
    /// Values are read from the file only; the process environment is left alone.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let read_error = |source| ConfigError::Read {
            path: path.clone(),
            source,
        };

        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(&path).map_err(read_error)? {
            let (key, value) = item.map_err(read_error)?;
            values.insert(key, value);
        }

        debug!(path = %path.display(), keys = values.len(), "Loaded config file");
        Self::from_values(&values)
    }

    pub fn from_values(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        for (key, value) in values {
            let value = value.trim();
            match key.as_str() {
                "PROMPT_SECONDS" => options.prompt_seconds = parse_bool(value),
                "USE_CACHE" => options.use_cache = parse_bool(value),
                "SECONDS" => options.seconds_after = parse_number(key, value)?,
                "SECONDS_BEFORE" => options.seconds_before = parse_number(key, value)?,
                "MAX_CONCURRENT_DOWNLOADS" => {
                    options.max_parallel_downloads = parse_number(key, value)?;
                    if options.max_parallel_downloads == 0 {
                        return Err(ConfigError::invalid(key, value, "must be at least 1"));
                    }
                }
                "SECONDS_PER_SEGMENT" => {
                    options.segment_seconds = NonZeroU64::new(parse_number(key, value)?)
                        .ok_or_else(|| ConfigError::invalid(key, value, "must be at least 1"))?;
                }
                "CACHE_DIR" => options.cache_dir = PathBuf::from(value),
                "DOWNLOAD_DIR" => options.output_dir = PathBuf::from(value),
                "EXECUTION_LOGS_DIR" => options.log_dir = PathBuf::from(value),
                "DOWNLOAD_BASE_URL" => {
                    url::Url::parse(value).map_err(|e| ConfigError::invalid(key, value, e))?;
                    options.base_url = value.trim_end_matches('/').to_string();
                }
                "OUTPUT_CODEC" => options.output_codec = value.to_string(),
                "OUTPUT_CRF" => options.output_crf = parse_number(key, value)?,
                "RETRY_DELAY_SECONDS" => {
                    options.retry_delay = Duration::from_secs(parse_number(key, value)?)
                }
                "RETRY_MAX_ATTEMPTS" => {
                    let attempts: u32 = parse_number(key, value)?;
                    options.retry_max_attempts = (attempts > 0).then_some(attempts);
                }
                "REQUEST_TIMEOUT_SECONDS" => {
                    options.request_timeout = Duration::from_secs(parse_number(key, value)?)
                }
                "FFMPEG" => options.ffmpeg = value.to_string(),
                other => debug!("Ignoring unknown config key {}", other),
            }
        }

        Ok(options)
    }
}

fn parse_bool(value: &str) -> bool {
    TRUE_VALUES.contains(&value.to_ascii_lowercase().as_str())
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(key, value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_reference_setup() {
        let options = Options::default();
        assert_eq!(options.segment_seconds.get(), 2);
        assert_eq!(options.max_parallel_downloads, 5);
        assert_eq!(options.seconds_after, 30);
        assert_eq!(options.seconds_before, 10);
        assert_eq!(options.retry_delay, Duration::from_secs(3));
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.segments_dir, "_segments");
    }

    #[test]
    fn reads_known_keys() {
        let options = Options::from_values(&values(&[
            ("PROMPT_SECONDS", "No"),
            ("SECONDS", "12"),
            ("SECONDS_BEFORE", "4"),
            ("MAX_CONCURRENT_DOWNLOADS", "8"),
            ("DOWNLOAD_BASE_URL", "http://localhost:8080/"),
            ("OUTPUT_CRF", "18"),
        ]))
        .unwrap();

        assert!(!options.prompt_seconds);
        assert_eq!(options.seconds_after, 12);
        assert_eq!(options.seconds_before, 4);
        assert_eq!(options.max_parallel_downloads, 8);
        assert_eq!(options.base_url, "http://localhost:8080");
        assert_eq!(options.output_crf, 18);
    }

    #[test]
    fn zero_retry_attempts_means_unbounded() {
        let options = Options::from_values(&values(&[("RETRY_MAX_ATTEMPTS", "4")])).unwrap();
        assert_eq!(options.retry_max_attempts, Some(4));

        let options = Options::from_values(&values(&[("RETRY_MAX_ATTEMPTS", "0")])).unwrap();
        assert_eq!(options.retry_max_attempts, None);
        assert_eq!(Options::default().retry_max_attempts, None);
    }

    #[test]
    fn bool_values_are_case_insensitive() {
        for value in ["1", "TRUE", "t", "Y", "yes"] {
            assert!(parse_bool(value), "{value}");
        }
        for value in ["0", "false", "", "nope"] {
            assert!(!parse_bool(value), "{value}");
        }
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            Options::from_values(&values(&[("SECONDS", "thirty")])),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(Options::from_values(&values(&[("MAX_CONCURRENT_DOWNLOADS", "0")])).is_err());
        assert!(Options::from_values(&values(&[("SECONDS_PER_SEGMENT", "0")])).is_err());
        assert!(Options::from_values(&values(&[("DOWNLOAD_BASE_URL", "nowhere")])).is_err());
    }

    #[test]
    fn loads_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.cfg");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# window defaults").unwrap();
        writeln!(file, "SECONDS=20").unwrap();
        writeln!(file, "SECONDS_BEFORE=\"5\"").unwrap();
        writeln!(file, "CACHE_DIR=/tmp/clip-cache").unwrap();
        drop(file);

        let options = Options::load(Some(&path)).unwrap();
        assert_eq!(options.seconds_after, 20);
        assert_eq!(options.seconds_before, 5);
        assert_eq!(options.cache_dir, PathBuf::from("/tmp/clip-cache"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Options::load(Some(&dir.path().join("absent.cfg"))),
            Err(ConfigError::Read { .. })
        ));
    }
}

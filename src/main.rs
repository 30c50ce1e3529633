mod clip;
mod download;
mod error;
mod ffmpeg;
mod file;
mod logging;
mod options;
mod output;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use crate::download::pipeline::{ClipDownloader, ClipRequest};
use crate::error::{Error, MuxError, Result};
use crate::ffmpeg::Ffmpeg;
use crate::options::Options;
use crate::output::Tone;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[clap(subcommand)]
    subcmd: Option<SubCmd>,

    /// clip URL, asked for when missing
    clip_url: Option<String>,

    #[clap(short, long)]
    /// timestamp of the moment to cut around (HH:MM:SS)
    timestamp: Option<String>,

    #[clap(short, long)]
    /// seconds to keep after the timestamp
    seconds: Option<u64>,

    #[clap(short = 'b', long)]
    /// seconds to keep before the timestamp
    seconds_before: Option<u64>,

    #[clap(short, long)]
    /// set the maximum number of parallel downloads
    parallel: Option<usize>,

    #[clap(long)]
    /// download every segment again even when it is cached
    no_cache: bool,

    #[clap(short, long)]
    /// config file to read instead of config.cfg
    config: Option<PathBuf>,

    #[clap(short, long)]
    /// print debug logs
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Download clips listed in a json file
    File {
        #[clap(default_value = "download.json")]
        /// json array of {url, timestamp, seconds?, secondsBefore?}
        file: PathBuf,
    },
}

impl Args {
    fn apply(&self, options: &mut Options) {
        if let Some(parallel) = self.parallel {
            options.max_parallel_downloads = parallel.max(1);
        }
        if self.no_cache {
            options.use_cache = false;
        }
    }
}

async fn run(args: Args, options: &Options) -> Result<()> {
    let downloader = ClipDownloader::from_options(options)?;

    if let Some(SubCmd::File { file }) = &args.subcmd {
        return file::download_file(file, &downloader, options).await;
    }

    let clip = prompt::clip(args.clip_url)?;
    let timestamp = prompt::timestamp(args.timestamp)?;
    let seconds_after = prompt::seconds(
        "Seconds after the timestamp:",
        args.seconds,
        options.seconds_after,
        options.prompt_seconds,
    )?;
    let seconds_before = prompt::seconds(
        "Seconds before the timestamp:",
        args.seconds_before,
        options.seconds_before,
        options.prompt_seconds,
    )?;

    let request = ClipRequest {
        clip,
        timestamp,
        seconds_after,
        seconds_before,
    };

    output::status(
        Tone::Info,
        format!("Downloading {} around {}", request.clip, request.timestamp),
    );
    let path = downloader.download(&request).await?;
    output::status(Tone::Success, format!("Video saved to: {}", path.display()));

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log = logging::init_logging(args.verbose);

    let mut options = match Options::load(args.config.as_deref()) {
        Ok(options) => options,
        Err(err) => {
            output::status(Tone::Error, err);
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut options);

    if args.verbose {
        output::status(Tone::Debug, format!("Options: {:?}", options));
    }

    if !Ffmpeg::from_options(&options).is_available().await {
        output::status(
            Tone::Error,
            "[FFMPEG-NOT-FOUND] FFmpeg is not available. Please, install it and try again.",
        );
        return ExitCode::FAILURE;
    }

    match run(args, &options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Prompt(
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted,
        )) => ExitCode::FAILURE,
        Err(err @ Error::Mux(MuxError::Failed { .. })) => {
            output::status(Tone::Error, err);
            ExitCode::FAILURE
        }
        Err(err @ Error::BatchFailed { .. }) => {
            output::status(Tone::Error, err);
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "Unexpected error");
            output::status(Tone::Error, format!("An unexpected error occurred: {}", err));
            match log.persist(&options.log_dir) {
                Ok(path) => output::status(
                    Tone::Error,
                    format!("Execution log saved to: {}", path.display()),
                ),
                Err(err) => output::status(
                    Tone::Error,
                    format!("Failed to save execution log: {}", err),
                ),
            }
            ExitCode::FAILURE
        }
    }
}

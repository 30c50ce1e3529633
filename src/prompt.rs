use inquire::{CustomType, Text};
use tracing::debug;

use crate::clip::{Clip, Timestamp};
use crate::error::{InputError, Result};
use crate::output::{self, Tone};

/// Parse a clip URL and make sure segment URLs can be built from it.
pub fn parse_clip(raw: &str) -> std::result::Result<Clip, InputError> {
    let clip = Clip::from_url(raw)?;
    clip.ensure_resolvable()?;
    Ok(clip)
}

/// Use `given` when it parses, otherwise ask until a valid URL is entered.
pub fn clip(given: Option<String>) -> Result<Clip> {
    ask_until_valid(
        given,
        "Enter the Clip URL:",
        "Invalid URL!",
        parse_clip,
    )
}

pub fn timestamp(given: Option<String>) -> Result<Timestamp> {
    ask_until_valid(
        given,
        "Enter the Timestamp (HH:MM:SS):",
        "Invalid Timestamp!",
        Timestamp::parse,
    )
}

/// A window length: the given value, the default when asking is disabled, or
/// the user's answer (empty answer means the default).
pub fn seconds(message: &str, given: Option<u64>, default: u64, ask: bool) -> Result<u64> {
    if let Some(seconds) = given {
        return Ok(seconds);
    }

    if !ask {
        return Ok(default);
    }

    let answer = CustomType::<u64>::new(&format!("{} {}", output::prompt_prefix(), message))
        .with_default(default)
        .with_error_message("Please type a whole number of seconds")
        .prompt()?;

    Ok(answer)
}

fn ask_until_valid<T>(
    mut given: Option<String>,
    question: &str,
    complaint: &str,
    parse: impl Fn(&str) -> std::result::Result<T, InputError>,
) -> Result<T> {
    loop {
        let raw = match given.take() {
            Some(raw) => raw,
            None => Text::new(&format!("{} {}", output::prompt_prefix(), question)).prompt()?,
        };

        match parse(raw.trim()) {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(error = %err, "Rejected input");
                output::status(Tone::Error, complaint);
            }
        }
    }
}

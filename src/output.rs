use std::fmt::Display;

use colored::{ColoredString, Colorize};

/// Kinds of user-facing status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Debug,
    Info,
    Warning,
    Error,
    Success,
}

impl Tone {
    pub fn title(self) -> &'static str {
        match self {
            Tone::Debug => "DBG",
            Tone::Info => "INF",
            Tone::Warning => "WRN",
            Tone::Error => "ERR",
            Tone::Success => "SUC",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Tone::Debug => text.blue(),
            Tone::Info => text.white(),
            Tone::Warning => text.yellow(),
            Tone::Error => text.red(),
            Tone::Success => text.green(),
        }
    }
}

pub fn render(tone: Tone, message: &str) -> String {
    tone.paint(&format!("[{}] - {}", tone.title(), message))
        .to_string()
}

/// Print a status line. Errors and warnings go to stderr.
pub fn status(tone: Tone, message: impl Display) {
    let line = render(tone, &message.to_string());
    match tone {
        Tone::Error | Tone::Warning => eprintln!("{}", line),
        Tone::Debug | Tone::Info | Tone::Success => println!("{}", line),
    }
}

/// Marker shown in front of interactive questions.
pub fn prompt_prefix() -> String {
    "[~~~] -".cyan().to_string()
}

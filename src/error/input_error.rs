/// A user-supplied value that does not have the expected shape.
///
/// These are recoverable: the caller asks again or rejects the argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("malformed clip identifier `{input}`: {reason}")]
    MalformedIdentifier { input: String, reason: &'static str },

    #[error("invalid timestamp `{input}`, expected [[HH:]MM:]SS")]
    InvalidTimestamp { input: String },
}

impl InputError {
    pub fn malformed_identifier(input: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedIdentifier {
            input: input.into(),
            reason,
        }
    }

    pub fn invalid_timestamp(input: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            input: input.into(),
        }
    }
}

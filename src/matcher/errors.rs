use thiserror::Error;

/// Failures scoped to a single pattern. They abort that pattern's
/// contribution only; the rest of the sequence still runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid pattern: {message}")]
    InvalidPattern { message: String },

    #[error("invalid replacement template: {message}")]
    InvalidTemplate { message: String },

    #[error("invalid scope filter '{entry}': {message}")]
    InvalidQualifier { entry: String, message: String },

    #[error("no pattern named '{name}'")]
    UnknownPattern { name: String },
}

impl From<regex::Error> for PatternError {
    fn from(e: regex::Error) -> Self {
        PatternError::InvalidPattern {
            message: e.to_string(),
        }
    }
}

//! Usage: Error taxonomy shared by the patch engine, infra adapters and commands.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Text is not valid JSON/TOML, or the root has the wrong shape.
    #[error("CONFIG_PARSE_ERROR: {hint}: {message}")]
    Parse { hint: String, message: String },

    /// Structure was recognized but is incomplete (e.g. stdio server without `command`).
    #[error("CONFIG_SHAPE_ERROR: {0}")]
    Shape(String),

    #[error("SEC_INVALID_INPUT: {0}")]
    InvalidInput(String),

    #[error("IO_ERROR: {0}")]
    Io(String),
}

impl ConfigError {
    pub fn parse(hint: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            hint: hint.into(),
            message: message.to_string(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

impl From<ConfigError> for String {
    fn from(err: ConfigError) -> Self {
        err.to_string()
    }
}

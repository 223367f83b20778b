//! CLI error handling

use std::fmt;

use pnlog_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration, source or internal error from the library crates
    Pnlog(pnlog_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error while writing output
    Io(std::io::Error),
}

impl CliError {
    /// Machine-readable rendering for `--json` mode.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CliError::Pnlog(e) => serde_json::json!({
                "error": {
                    "message": e.user_message(),
                    "code": e.user_code(),
                    "hint": e.user_hint(),
                    "retryable": e.is_retryable(),
                }
            }),
            other => serde_json::json!({ "error": { "message": other.to_string() } }),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pnlog(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Pnlog(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<pnlog_errors::Error> for CliError {
    fn from(e: pnlog_errors::Error) -> Self {
        CliError::Pnlog(e)
    }
}

impl From<pnlog_errors::SourceError> for CliError {
    fn from(e: pnlog_errors::SourceError) -> Self {
        CliError::Pnlog(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Pnlog(e.into())
    }
}

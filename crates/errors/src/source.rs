//! Record source error types

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SourceError {
    /// The input could not be acquired at all; raised before any record is decoded.
    #[error("record source unavailable: {path}: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("failed to read from {path}: {reason}")]
    Read { path: String, reason: String },
}

impl SourceError {
    pub fn unavailable(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Unavailable {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub fn read(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl UserFacingError for SourceError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unavailable { .. } => {
                Some("Check that the log file exists and is readable, or pipe the log on stdin.")
            }
            Self::Read { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Unavailable { .. } => "source.unavailable",
            Self::Read { .. } => "source.read",
        })
    }
}

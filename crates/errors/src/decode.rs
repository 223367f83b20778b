//! Per-record decode failures
//!
//! None of these terminate a stream. The decoder yields them inline,
//! tagged with the 1-based position of the offending record.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::UserFacingError;

/// Why a recognised event failed validation against its variant rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Violation {
    #[error("missing field `{field}`")]
    MissingField { field: String },

    #[error("unexpected field(s): {}", .fields.join(", "))]
    UnexpectedFields { fields: Vec<String> },

    #[error("invalid value for `{field}`: expected {expected}")]
    InvalidValue { field: String, expected: String },

    #[error("conflicting fields: {}", .fields.join(" and "))]
    ConflictingFields { fields: Vec<String> },

    #[error("expected exactly one of: {}", .fields.join(", "))]
    MissingOneOf { fields: Vec<String> },

    #[error("unknown {field} `{value}`")]
    UnknownDiscriminant { field: String, value: String },
}

impl Violation {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            expected: expected.into(),
        }
    }

    pub fn conflicting<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ConflictingFields {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn missing_one_of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingOneOf {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unexpected<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        fields.sort();
        Self::UnexpectedFields { fields }
    }

    pub fn unknown_discriminant(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownDiscriminant {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Names of the fields this violation is about.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidValue { field, .. }
            | Self::UnknownDiscriminant { field, .. } => vec![field.as_str()],
            Self::UnexpectedFields { fields }
            | Self::ConflictingFields { fields }
            | Self::MissingOneOf { fields } => fields.iter().map(String::as_str).collect(),
        }
    }

    /// Prefix every field name with `parent.`, for violations found inside
    /// a nested object such as `pkg` or `added`.
    #[must_use]
    pub fn nested(self, parent: &str) -> Self {
        let qualify = |field: String| format!("{parent}.{field}");
        match self {
            Self::MissingField { field } => Self::MissingField {
                field: qualify(field),
            },
            Self::InvalidValue { field, expected } => Self::InvalidValue {
                field: qualify(field),
                expected,
            },
            Self::UnknownDiscriminant { field, value } => Self::UnknownDiscriminant {
                field: qualify(field),
                value,
            },
            Self::UnexpectedFields { fields } => Self::UnexpectedFields {
                fields: fields.into_iter().map(qualify).collect(),
            },
            Self::ConflictingFields { fields } => Self::ConflictingFields {
                fields: fields.into_iter().map(qualify).collect(),
            },
            Self::MissingOneOf { fields } => Self::MissingOneOf {
                fields: fields.into_iter().map(qualify).collect(),
            },
        }
    }
}

/// Coarse classification of a [`DecodeError`], used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DecodeErrorKind {
    MalformedRecord,
    UnknownEventName,
    SchemaViolation,
}

/// A record that could not be turned into a typed event.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DecodeError {
    /// The record is not an envelope: not a JSON object, or no usable
    /// `name`/`level`.
    #[error("record {position}: malformed record: {reason}")]
    MalformedRecord {
        position: usize,
        reason: String,
        raw: String,
    },

    /// The envelope parsed but names an event family this schema does not know.
    #[error("record {position}: unknown event name `{name}`")]
    UnknownEventName {
        position: usize,
        name: String,
        envelope: Map<String, Value>,
    },

    /// The family is known but the payload does not match any of its variants.
    #[error("record {position}: invalid `{name}` event: {violation}")]
    SchemaViolation {
        position: usize,
        name: String,
        violation: Violation,
    },
}

impl DecodeError {
    /// 1-based position of the record in its input stream
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::MalformedRecord { position, .. }
            | Self::UnknownEventName { position, .. }
            | Self::SchemaViolation { position, .. } => *position,
        }
    }

    #[must_use]
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::MalformedRecord { .. } => DecodeErrorKind::MalformedRecord,
            Self::UnknownEventName { .. } => DecodeErrorKind::UnknownEventName,
            Self::SchemaViolation { .. } => DecodeErrorKind::SchemaViolation,
        }
    }
}

impl UserFacingError for DecodeError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MalformedRecord { .. } => {
                Some("Each line must be a JSON object with string `name` and `level` fields.")
            }
            Self::UnknownEventName { .. } => {
                Some("The log was probably written by a newer producer; the record is kept verbatim.")
            }
            Self::SchemaViolation { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::MalformedRecord { .. } => "decode.malformed_record",
            Self::UnknownEventName { .. } => "decode.unknown_event_name",
            Self::SchemaViolation { .. } => "decode.schema_violation",
        })
    }
}

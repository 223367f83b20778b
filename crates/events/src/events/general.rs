use pnlog_errors::Violation;
use serde::Serialize;
use serde_json::Value;

use super::EventName;
use crate::meta::ENVELOPE_KEYS;
use crate::schema::{FieldReader, Fields, Payload};

/// Free-text diagnostic, used by the registry family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardMessage {
    pub message: String,
}

impl StandardMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Payload for StandardMessage {
    const FAMILY: EventName = EventName::Registry;

    fn write_fields(&self, out: &mut Fields) {
        out.insert("message".into(), self.message.as_str().into());
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        Ok(Self {
            message: fields.string("message")?,
        })
    }
}

/// Uncategorized event logged under the bare root tag.
///
/// Nothing about its shape is guaranteed beyond an optional `message`; any
/// other fields are carried along untouched. Extra fields may not use the
/// envelope keys or `message`, so every value encodes to a record that
/// decodes back to itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseMessage {
    message: Option<String>,
    extra: Fields,
}

impl BaseMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            extra: Fields::new(),
        }
    }

    /// A message with no text, only extra fields.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach an extra field.
    ///
    /// # Errors
    ///
    /// [`Violation::ConflictingFields`] when `key` is `message` or one of
    /// [`ENVELOPE_KEYS`].
    pub fn with_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, Violation> {
        let key = key.into();
        if key == "message" || ENVELOPE_KEYS.contains(&key.as_str()) {
            return Err(Violation::conflicting([key]));
        }
        self.extra.insert(key, value.into());
        Ok(self)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Fields beyond `message`. A decoded non-string `message` lands here.
    #[must_use]
    pub fn extra(&self) -> &Fields {
        &self.extra
    }
}

impl Payload for BaseMessage {
    const FAMILY: EventName = EventName::Base;

    fn write_fields(&self, out: &mut Fields) {
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        if let Some(message) = &self.message {
            out.insert("message".into(), message.as_str().into());
        }
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        let message = fields.take("message");
        let mut extra = fields.take_rest();
        let message = match message {
            Some(Value::String(message)) => Some(message),
            Some(other) => {
                extra.insert("message".into(), other);
                None
            }
            None => None,
        };
        Ok(Self { message, extra })
    }
}

/// End-of-run marker; carries no payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryMessage;

impl Payload for SummaryMessage {
    const FAMILY: EventName = EventName::Summary;

    fn write_fields(&self, _out: &mut Fields) {}

    fn read_fields(_fields: &mut FieldReader) -> Result<Self, Violation> {
        Ok(Self)
    }
}

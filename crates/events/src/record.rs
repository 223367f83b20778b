use pnlog_types::LogLevel;
use serde::{Serialize, Serializer};

use crate::events::{EventName, LogEvent};
use crate::meta::{tracing_level, RecordMeta};

/// One immutable log record: a typed event at a level, plus envelope metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub event: LogEvent,
    pub meta: RecordMeta,
}

impl LogRecord {
    /// Create a record without envelope metadata.
    pub fn new(level: LogLevel, event: impl Into<LogEvent>) -> Self {
        Self {
            level,
            event: event.into(),
            meta: RecordMeta::default(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: RecordMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn name(&self) -> EventName {
        self.event.name()
    }

    #[must_use]
    pub fn tracing_level(&self) -> tracing::Level {
        tracing_level(self.level)
    }

    #[must_use]
    pub fn log_target(&self) -> &'static str {
        self.event.log_target()
    }
}

/// Serializes to the wire envelope produced by [`crate::encode::encode`].
impl Serialize for LogRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        crate::encode::encode(self).serialize(serializer)
    }
}

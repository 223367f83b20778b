use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use pnlog_errors::Violation;
use pnlog_types::LogLevel;
use serde_json::Value;
use tracing::Level;

use crate::schema::{FieldReader, Fields};

/// Envelope keys that are not part of any payload.
pub const ENVELOPE_KEYS: [&str; 5] = ["name", "level", "time", "hostname", "pid"];

/// Years an RFC 3339 `time` can carry; four digits, no sign.
pub const TIME_YEARS: RangeInclusive<i32> = 0..=9999;

fn check_time(time: DateTime<Utc>) -> Result<DateTime<Utc>, Violation> {
    if TIME_YEARS.contains(&time.year()) {
        Ok(time)
    } else {
        Err(Violation::invalid("time", "a timestamp between years 0 and 9999"))
    }
}

/// Metadata line-oriented loggers stamp on every record.
///
/// All of it is optional: records written by hand or by other producers
/// decode fine without it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordMeta {
    time: Option<DateTime<Utc>>,
    pub hostname: Option<String>,
    /// Process that emitted the record.
    pub pid: Option<u32>,
}

impl RecordMeta {
    /// Metadata for a record emitted by this process right now.
    #[must_use]
    pub fn now() -> Self {
        Self {
            time: Some(Utc::now()),
            hostname: None,
            pid: Some(std::process::id()),
        }
    }

    /// Timestamp captured at emission time.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    /// Set the timestamp.
    ///
    /// # Errors
    ///
    /// A time outside [`TIME_YEARS`], which RFC 3339 cannot express.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Result<Self, Violation> {
        self.time = Some(check_time(time)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn write_fields(&self, out: &mut Fields) {
        if let Some(time) = &self.time {
            out.insert(
                "time".into(),
                time.to_rfc3339_opts(SecondsFormat::AutoSi, true).into(),
            );
        }
        if let Some(hostname) = &self.hostname {
            out.insert("hostname".into(), hostname.as_str().into());
        }
        if let Some(pid) = self.pid {
            out.insert("pid".into(), pid.into());
        }
    }

    /// Consume the metadata keys from a record.
    ///
    /// `time` may be an RFC 3339 string or epoch milliseconds, the two forms
    /// JSON loggers commonly write.
    ///
    /// # Errors
    ///
    /// A metadata key present with an unusable value.
    pub fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        let time = match fields.take("time") {
            None => None,
            Some(Value::String(text)) => Some(
                DateTime::parse_from_rfc3339(&text)
                    .map_err(|_| Violation::invalid("time", "an RFC 3339 timestamp"))?
                    .with_timezone(&Utc),
            ),
            Some(Value::Number(millis)) => Some(
                millis
                    .as_i64()
                    .and_then(DateTime::from_timestamp_millis)
                    .ok_or_else(|| Violation::invalid("time", "epoch milliseconds"))?,
            ),
            Some(_) => return Err(Violation::invalid("time", "a timestamp")),
        };
        let time = time.map(check_time).transpose()?;
        let hostname = fields.optional_string("hostname")?;
        let pid = if fields.contains("pid") {
            Some(fields.unsigned_u32("pid")?)
        } else {
            None
        };
        Ok(Self {
            time,
            hostname,
            pid,
        })
    }
}

/// Convert a record level into a tracing level for downstream logging.
#[must_use]
pub fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

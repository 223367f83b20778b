//! Event encoder: typed records to JSON lines

use std::io::Write;

use pnlog_errors::Error;
use serde_json::Value;

use crate::record::LogRecord;
use crate::schema::{Fields, Payload};

/// Build the wire envelope of a record.
///
/// Payload fields are written first so the envelope keys always win.
#[must_use]
pub fn encode(record: &LogRecord) -> Fields {
    let mut out = Fields::new();
    record.event.write_fields(&mut out);
    record.meta.write_fields(&mut out);
    out.insert("name".into(), record.name().qualified().into());
    out.insert("level".into(), record.level.as_str().into());
    out
}

/// Wire envelope of a bare payload, without metadata.
#[must_use]
pub fn encode_payload<P: Payload>(payload: &P) -> Fields {
    let mut out = Fields::new();
    payload.write_fields(&mut out);
    out.insert("name".into(), P::FAMILY.qualified().into());
    out
}

/// Render a record as a single JSON line (no trailing newline).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_line(record: &LogRecord) -> Result<String, Error> {
    Ok(serde_json::to_string(&Value::Object(encode(record)))?)
}

/// Write a record as a newline-terminated JSON line.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_record<W: Write>(writer: &mut W, record: &LogRecord) -> Result<(), Error> {
    serde_json::to_writer(&mut *writer, &Value::Object(encode(record)))?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LifecycleMessage, ProgressMessage, RecordMeta, SummaryMessage};
    use pnlog_types::LogLevel;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let record = LogRecord::new(
            LogLevel::Info,
            ProgressMessage::fetching_started("pkg-a", Some(1024), 1),
        );
        assert_eq!(
            Value::Object(encode(&record)),
            json!({
                "name": "pnpm:progress",
                "level": "info",
                "status": "fetching_started",
                "pkgId": "pkg-a",
                "size": 1024,
                "attempt": 1,
            })
        );
    }

    #[test]
    fn test_null_size_is_written() {
        let record = LogRecord::new(
            LogLevel::Debug,
            ProgressMessage::fetching_started("pkg-a", None, 3),
        );
        let fields = encode(&record);
        assert_eq!(fields.get("size"), Some(&Value::Null));
    }

    #[test]
    fn test_write_record_appends_newline() {
        let record = LogRecord::new(LogLevel::Warn, LifecycleMessage::exit("pkg-a", "install", 1))
            .with_meta(RecordMeta::default().with_pid(7));
        let mut buffer = Vec::new();
        write_record(&mut buffer, &record).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.contains(r#""exitCode":1"#));
        assert!(text.contains(r#""pid":7"#));
    }

    #[test]
    fn test_summary_has_only_envelope() {
        let record = LogRecord::new(LogLevel::Info, SummaryMessage);
        assert_eq!(
            to_line(&record).unwrap(),
            r#"{"level":"info","name":"pnpm:summary"}"#
        );
        assert_eq!(encode_payload(&SummaryMessage).len(), 1);
    }
}

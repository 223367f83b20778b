//! Record-by-record decoding

use pnlog_errors::DecodeError;
use pnlog_events::{read_event, EventName, FieldReader, LogRecord, RecordMeta};
use pnlog_types::LogLevel;
use serde_json::{Map, Value};
use tracing::debug;

/// Records above this size are rejected without being parsed.
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1024 * 1024;

/// Longest excerpt of a malformed record kept for diagnostics.
const RAW_PREVIEW_CHARS: usize = 512;

/// Result of decoding one record.
pub type Outcome = Result<LogRecord, DecodeError>;

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_record_bytes: usize,
    /// Skip whitespace-only records instead of reporting them as malformed.
    pub ignore_blank: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            ignore_blank: true,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn with_max_record_bytes(mut self, max_record_bytes: usize) -> Self {
        self.max_record_bytes = max_record_bytes;
        self
    }

    #[must_use]
    pub fn with_ignore_blank(mut self, ignore_blank: bool) -> Self {
        self.ignore_blank = ignore_blank;
        self
    }
}

pub(crate) fn is_blank(record: &[u8]) -> bool {
    record.iter().all(u8::is_ascii_whitespace)
}

fn preview(record: &[u8]) -> String {
    let text = String::from_utf8_lossy(record);
    match text.char_indices().nth(RAW_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.into_owned(),
    }
}

fn malformed(position: usize, record: &[u8], reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedRecord {
        position,
        reason: reason.into(),
        raw: preview(record),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn envelope_level(
    position: usize,
    record: &[u8],
    envelope: &Map<String, Value>,
) -> Result<LogLevel, DecodeError> {
    match envelope.get("level") {
        Some(Value::String(level)) => level
            .parse()
            .map_err(|err: pnlog_types::ParseLevelError| malformed(position, record, err.to_string())),
        Some(other) => Err(malformed(
            position,
            record,
            format!("`level` must be a string, found {}", json_kind(other)),
        )),
        None => Err(malformed(position, record, "missing `level`")),
    }
}

fn envelope_name(
    position: usize,
    record: &[u8],
    envelope: &Map<String, Value>,
) -> Result<String, DecodeError> {
    match envelope.get("name") {
        Some(Value::String(name)) => Ok(name.clone()),
        Some(other) => Err(malformed(
            position,
            record,
            format!("`name` must be a string, found {}", json_kind(other)),
        )),
        None => Err(malformed(position, record, "missing `name`")),
    }
}

/// Decode a single serialized record.
///
/// `position` is the 1-based index of the record in its stream and is only
/// used to tag errors. The function is pure: the same input always yields
/// the same outcome.
///
/// # Errors
///
/// - [`DecodeError::MalformedRecord`] when the record is oversized, not a
///   JSON object, or lacks a usable `name`/`level`
/// - [`DecodeError::UnknownEventName`] when `name` is not a known family;
///   the raw envelope is carried along
/// - [`DecodeError::SchemaViolation`] when the payload does not match the
///   family's variant rules
pub fn decode_record(position: usize, record: &[u8], options: &DecodeOptions) -> Outcome {
    if record.len() > options.max_record_bytes {
        return Err(malformed(
            position,
            record,
            format!(
                "record exceeds the limit of {} bytes",
                options.max_record_bytes
            ),
        ));
    }

    let value: Value = serde_json::from_slice(record)
        .map_err(|err| malformed(position, record, format!("invalid JSON: {err}")))?;
    let envelope = match value {
        Value::Object(envelope) => envelope,
        other => {
            return Err(malformed(
                position,
                record,
                format!("expected a JSON object, found {}", json_kind(&other)),
            ))
        }
    };

    let name = envelope_name(position, record, &envelope)?;
    let level = envelope_level(position, record, &envelope)?;

    let Some(family) = EventName::parse(&name) else {
        debug!(position, name = %name, "unknown event name");
        return Err(DecodeError::UnknownEventName {
            position,
            name,
            envelope,
        });
    };

    let mut fields = FieldReader::new(envelope);
    fields.take("name");
    fields.take("level");

    let decoded = RecordMeta::read_fields(&mut fields)
        .and_then(|meta| Ok((meta, read_event(family, fields.take_rest())?)));

    match decoded {
        Ok((meta, event)) => Ok(LogRecord { level, event, meta }),
        Err(violation) => {
            debug!(position, name = %name, %violation, "schema violation");
            Err(DecodeError::SchemaViolation {
                position,
                name,
                violation,
            })
        }
    }
}

/// Lazy decoder over a sequence of serialized records.
///
/// Yields exactly one outcome per input record, in input order, except for
/// blank records when [`DecodeOptions::ignore_blank`] is set. Positions
/// count every input record, skipped ones included, so they match line
/// numbers of a newline-framed file.
#[derive(Debug)]
pub struct Decoder<I> {
    records: I,
    position: usize,
    options: DecodeOptions,
}

impl<I> Decoder<I> {
    pub fn new(records: I) -> Self {
        Self::with_options(records, DecodeOptions::default())
    }

    pub fn with_options(records: I, options: DecodeOptions) -> Self {
        Self {
            records,
            position: 0,
            options,
        }
    }

    /// Number of input records pulled so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get_ref(&self) -> &I {
        &self.records
    }

    pub fn get_mut(&mut self) -> &mut I {
        &mut self.records
    }

    /// Stop decoding and give the underlying record sequence back.
    pub fn into_inner(self) -> I {
        self.records
    }
}

impl<I> Iterator for Decoder<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = Outcome;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = self.records.next()?;
            self.position += 1;
            let bytes = record.as_ref();
            if self.options.ignore_blank && is_blank(bytes) {
                continue;
            }
            return Some(decode_record(self.position, bytes, &self.options));
        }
    }
}

/// Decode a sequence of records with default options.
pub fn decode<I>(records: I) -> Decoder<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Decoder::new(records.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnlog_errors::{DecodeErrorKind, Violation};
    use pnlog_events::{LogEvent, ProgressMessage};

    fn decode_one(line: &str) -> Outcome {
        decode_record(1, line.as_bytes(), &DecodeOptions::default())
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = decode_one("npm WARN something").unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedRecord);
        match err {
            DecodeError::MalformedRecord { raw, reason, .. } => {
                assert_eq!(raw, "npm WARN something");
                assert!(reason.starts_with("invalid JSON"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_envelope_requirements() {
        for line in [
            r#"[1, 2]"#,
            r#"{"level": "info"}"#,
            r#"{"name": 7, "level": "info"}"#,
            r#"{"name": "pnpm:summary"}"#,
            r#"{"name": "pnpm:summary", "level": "fatal"}"#,
            r#"{"name": "pnpm:summary", "level": 30}"#,
        ] {
            let err = decode_one(line).unwrap_err();
            assert_eq!(err.kind(), DecodeErrorKind::MalformedRecord, "{line}");
        }
    }

    #[test]
    fn test_unknown_name_keeps_envelope() {
        let err = decode_one(r#"{"name": "totally-unknown", "level": "warn", "x": [1]}"#)
            .unwrap_err();
        match err {
            DecodeError::UnknownEventName {
                position,
                name,
                envelope,
            } => {
                assert_eq!(position, 1);
                assert_eq!(name, "totally-unknown");
                assert_eq!(envelope.get("x"), Some(&serde_json::json!([1])));
                assert_eq!(envelope.get("level"), Some(&Value::from("warn")));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_short_and_qualified_names_decode_alike() {
        let short = decode_one(
            r#"{"name": "progress", "level": "info", "status": "fetched", "pkgId": "pkg-a"}"#,
        )
        .unwrap();
        let qualified = decode_one(
            r#"{"name": "pnpm:progress", "level": "info", "status": "fetched", "pkgId": "pkg-a"}"#,
        )
        .unwrap();
        assert_eq!(short, qualified);
    }

    #[test]
    fn test_extra_fields_are_violations_but_metadata_is_not() {
        let record = decode_one(
            r#"{"name":"pnpm:progress","level":"debug","time":1700000000000,"hostname":"h","pid":9,"status":"fetching_progress","pkgId":"pkg-a","downloaded":5}"#,
        )
        .unwrap();
        assert_eq!(record.meta.pid, Some(9));
        assert_eq!(
            record.event,
            LogEvent::Progress(ProgressMessage::fetching_progress("pkg-a", 5))
        );

        let err = decode_one(
            r#"{"name":"pnpm:progress","level":"debug","status":"fetched","pkgId":"pkg-a","color":"red"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DecodeError::SchemaViolation {
                position: 1,
                name: "pnpm:progress".into(),
                violation: Violation::unexpected(["color"]),
            }
        );
    }

    #[test]
    fn test_oversized_record() {
        let options = DecodeOptions::default().with_max_record_bytes(16);
        let err = decode_record(
            4,
            br#"{"name":"pnpm:summary","level":"info"}"#,
            &options,
        )
        .unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedRecord);
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = decode_record(1, b"{\"name\":\"\xff\"}", &DecodeOptions::default()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedRecord);
    }

    #[test]
    fn test_blank_records_are_skipped_but_counted() {
        let lines = [
            "",
            r#"{"name":"pnpm:summary","level":"info"}"#,
            "   ",
            "garbage",
        ];
        let outcomes: Vec<Outcome> = decode(lines).collect();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1].as_ref().unwrap_err().position(), 4);

        let strict = Decoder::with_options(
            lines.iter(),
            DecodeOptions::default().with_ignore_blank(false),
        );
        assert_eq!(strict.filter(Result::is_err).count(), 3);
    }

    #[test]
    fn test_preview_is_truncated() {
        let long = "x".repeat(RAW_PREVIEW_CHARS * 2);
        let err = decode_one(&long).unwrap_err();
        match err {
            DecodeError::MalformedRecord { raw, .. } => {
                assert_eq!(raw.chars().count(), RAW_PREVIEW_CHARS + 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

//! Record sources with scoped acquisition
//!
//! A [`RecordSource`] owns its input handle for as long as it is being
//! pulled from. Dropping the source (or the [`Decoder`] wrapping it)
//! releases the handle, however many records were consumed.
//!
//! Records are read with a byte cap. A line longer than the cap is kept
//! only up to the cap and the rest of it is skipped, so an input without
//! newlines cannot grow the buffer past the record limit.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use pnlog_errors::SourceError;
use tracing::{debug, warn};

use crate::decode::{DecodeOptions, Decoder, DEFAULT_MAX_RECORD_BYTES};

/// Newline-framed records read from a file, stdin, or any buffered reader
pub struct RecordSource {
    reader: Box<dyn BufRead>,
    label: String,
    max_record_bytes: usize,
    error: Option<SourceError>,
    exhausted: bool,
}

impl std::fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSource")
            .field("label", &self.label)
            .field("max_record_bytes", &self.max_record_bytes)
            .field("error", &self.error)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl RecordSource {
    /// Open a log file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] if the file cannot be opened or
    /// is a directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let file = File::open(path).map_err(|err| SourceError::unavailable(&label, &err))?;
        let metadata = file
            .metadata()
            .map_err(|err| SourceError::unavailable(&label, &err))?;
        if metadata.is_dir() {
            return Err(SourceError::Unavailable {
                path: label,
                reason: "is a directory".into(),
            });
        }
        debug!(path = %label, "opened record source");
        Ok(Self::from_reader(label, BufReader::new(file)))
    }

    /// Read records from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::from_reader("<stdin>", io::stdin().lock())
    }

    pub fn from_reader(label: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            label: label.into(),
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            error: None,
            exhausted: false,
        }
    }

    /// Cap the bytes kept per record. Longer records are truncated just past
    /// the cap, which the decoder then rejects as oversized.
    #[must_use]
    pub fn with_max_record_bytes(mut self, max_record_bytes: usize) -> Self {
        self.max_record_bytes = max_record_bytes;
        self
    }

    /// Human-readable name of the input
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The read error that ended iteration early, if any.
    pub fn take_error(&mut self) -> Option<SourceError> {
        self.error.take()
    }

    /// Wrap the source in a decoder, capping reads at the decoder's limit.
    #[must_use]
    pub fn decode(self, options: DecodeOptions) -> Decoder<Self> {
        Decoder::with_options(self.with_max_record_bytes(options.max_record_bytes), options)
    }
}

/// Bytes kept for a record limited to `max_record_bytes`. The extra two
/// leave room for a `\r\n` terminator, so a truncated record is still over
/// the limit once trimmed.
pub(crate) fn record_cap(max_record_bytes: usize) -> usize {
    max_record_bytes.saturating_add(2)
}

/// Read one newline-framed record, keeping at most `cap` bytes of it.
///
/// Bytes past the cap are consumed up to and including the next newline
/// but not stored. Returns the number of bytes consumed; 0 means EOF.
pub(crate) fn read_record<R: BufRead + ?Sized>(
    reader: &mut R,
    cap: usize,
    line: &mut Vec<u8>,
) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if available.is_empty() {
            return Ok(consumed);
        }
        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(newline) => (newline + 1, true),
            None => (available.len(), false),
        };
        let room = cap.saturating_sub(line.len());
        line.extend_from_slice(&available[..used.min(room)]);
        reader.consume(used);
        consumed += used;
        if done {
            return Ok(consumed);
        }
    }
}

/// Strip the line terminator (`\n` or `\r\n`).
pub(crate) fn trim_newline(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

impl Iterator for RecordSource {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let mut line = Vec::new();
        match read_record(&mut self.reader, record_cap(self.max_record_bytes), &mut line) {
            Ok(0) => {
                self.exhausted = true;
                None
            }
            Ok(_) => {
                trim_newline(&mut line);
                Some(line)
            }
            Err(err) => {
                warn!(source = %self.label, error = %err, "record source read failed");
                self.error = Some(SourceError::read(&self.label, &err));
                self.exhausted = true;
                None
            }
        }
    }
}

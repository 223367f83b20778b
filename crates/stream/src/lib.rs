#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Streaming decoder for pnlog record streams
//!
//! Turns a lazy sequence of serialized records (one JSON object per line)
//! into a lazy sequence of outcomes: a typed [`LogRecord`] or a
//! [`DecodeError`]. A bad record never ends the stream. Failing to acquire
//! the input is reported as [`SourceError::Unavailable`] before anything is
//! decoded; an I/O error mid-stream ends it with [`SourceError::Read`].
//!
//! Decoding is synchronous and stateless per record. The async entry point
//! only awaits while pulling the next line.

pub mod async_decode;
pub mod decode;
pub mod source;

pub use async_decode::{decode_async, open_async};
pub use decode::{decode, decode_record, DecodeOptions, Decoder, Outcome, DEFAULT_MAX_RECORD_BYTES};
pub use source::RecordSource;

pub use pnlog_errors::{DecodeError, SourceError};
pub use pnlog_events::LogRecord;

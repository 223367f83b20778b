#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Typed install-event taxonomy for pnlog
//!
//! This crate defines the closed set of event families a package manager
//! emits while it resolves, fetches and links packages, the wire envelope
//! those events travel in, and the typed channels producers use to emit
//! them.
//!
//! ## Architecture
//!
//! - **Family payloads**: one type per event name, discriminated unions as enums
//! - **Schema**: a single field-level reader per family that both validates
//!   and constructs, so validation cannot drift from decoding
//! - **Encoder**: typed record to JSON envelope (`name`, `level`, metadata, payload)
//! - **Channels**: `Logger<T>` handles that only accept the family's payload type

pub mod channel;
pub mod encode;
pub mod events;
pub mod meta;
pub mod record;
pub mod schema;

pub use channel::{channel, EventEmitter, EventReceiver, EventSender, Logger, Loggers};
pub use encode::{encode, encode_payload, to_line, write_record};
pub use events::{
    AddedDependency, BaseMessage, DeprecationMessage, EventName, InstallCheckMessage,
    LifecycleMessage, LifecycleOutput, LogEvent, PkgMilestone, ProgressMessage, ProgressStatus,
    RemovedDependency, RequestStatus, RootMessage, StageMessage, StandardMessage, SummaryMessage,
    ROOT_TAG,
};
pub use meta::{tracing_level, RecordMeta, ENVELOPE_KEYS, TIME_YEARS};
pub use record::LogRecord;
pub use schema::{read_event, validate, FieldReader, Fields, Payload};

//! Typed producer channels
//!
//! Each event family gets its own [`Logger`], parameterized by the family's
//! payload type, so producers cannot emit an ill-typed event. Loggers are
//! plain handles around an [`EventSender`]; build them once at startup with
//! [`Loggers::new`] and hand them to the subsystems that need them.

use std::marker::PhantomData;

use pnlog_types::LogLevel;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::events::{
    BaseMessage, DeprecationMessage, InstallCheckMessage, LifecycleMessage, LogEvent,
    ProgressMessage, RootMessage, StageMessage, StandardMessage, SummaryMessage,
};
use crate::meta::RecordMeta;
use crate::record::LogRecord;
use crate::schema::Payload;

/// Type alias for the record sender
pub type EventSender = UnboundedSender<LogRecord>;

/// Type alias for the record receiver
pub type EventReceiver = UnboundedReceiver<LogRecord>;

/// Create a new record channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Anything that can hand records to the transport
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit a record through this emitter
    fn emit(&self, record: LogRecord) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(record);
        }
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Emission handle for one event family
pub struct Logger<T> {
    sender: EventSender,
    payload: PhantomData<fn(T)>,
}

impl<T> Clone for Logger<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            payload: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Logger<T>
where
    T: Payload,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("family", &T::FAMILY)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<T> EventEmitter for Logger<T> {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.sender)
    }
}

impl<T> Logger<T>
where
    T: Payload + Into<LogEvent>,
{
    #[must_use]
    pub fn new(sender: EventSender) -> Self {
        Self {
            sender,
            payload: PhantomData,
        }
    }

    /// Emit `payload` at `level`, stamped with the current time and pid.
    pub fn log(&self, level: LogLevel, payload: T) {
        let record = LogRecord::new(level, payload).with_meta(RecordMeta::now());
        self.emit(record);
    }

    pub fn debug(&self, payload: T) {
        self.log(LogLevel::Debug, payload);
    }

    pub fn info(&self, payload: T) {
        self.log(LogLevel::Info, payload);
    }

    pub fn warn(&self, payload: T) {
        self.log(LogLevel::Warn, payload);
    }

    pub fn error(&self, payload: T) {
        self.log(LogLevel::Error, payload);
    }
}

/// One logger per event family, all feeding the same sender
#[derive(Debug, Clone)]
pub struct Loggers {
    pub base: Logger<BaseMessage>,
    pub deprecation: Logger<DeprecationMessage>,
    pub root: Logger<RootMessage>,
    pub install_check: Logger<InstallCheckMessage>,
    pub progress: Logger<ProgressMessage>,
    pub lifecycle: Logger<LifecycleMessage>,
    pub stage: Logger<StageMessage>,
    pub summary: Logger<SummaryMessage>,
    pub registry: Logger<StandardMessage>,
}

impl Loggers {
    #[must_use]
    pub fn new(sender: &EventSender) -> Self {
        Self {
            base: Logger::new(sender.clone()),
            deprecation: Logger::new(sender.clone()),
            root: Logger::new(sender.clone()),
            install_check: Logger::new(sender.clone()),
            progress: Logger::new(sender.clone()),
            lifecycle: Logger::new(sender.clone()),
            stage: Logger::new(sender.clone()),
            summary: Logger::new(sender.clone()),
            registry: Logger::new(sender.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventName;
    use pnlog_types::LoggedPkg;

    #[tokio::test]
    async fn test_loggers_stamp_level_and_family() {
        let (tx, mut rx) = channel();
        let loggers = Loggers::new(&tx);

        loggers
            .progress
            .debug(ProgressMessage::request(
                LoggedPkg::root("lodash", "^4.17.0"),
                crate::RequestStatus::Resolving,
            ));
        loggers.stage.info(StageMessage::ResolutionDone);
        loggers.summary.info(SummaryMessage);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, LogLevel::Debug);
        assert_eq!(first.name(), EventName::Progress);
        assert!(first.meta.time().is_some());
        assert_eq!(first.meta.pid, Some(std::process::id()));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.event, LogEvent::Stage(StageMessage::ResolutionDone));

        let third = rx.recv().await.unwrap();
        assert_eq!(third.name(), EventName::Summary);
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        let loggers = Loggers::new(&tx);
        loggers.registry.warn(StandardMessage::new("ignored"));
    }
}

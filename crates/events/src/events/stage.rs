use pnlog_errors::Violation;

use super::EventName;
use crate::schema::{FieldReader, Fields, Payload};

/// Milestones of an install run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageMessage {
    ResolutionDone,
}

impl StageMessage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolutionDone => "resolution_done",
        }
    }
}

impl Payload for StageMessage {
    const FAMILY: EventName = EventName::Stage;

    fn write_fields(&self, out: &mut Fields) {
        out.insert("message".into(), self.as_str().into());
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        let message = fields.string("message")?;
        match message.as_str() {
            "resolution_done" => Ok(Self::ResolutionDone),
            _ => Err(Violation::unknown_discriminant("message", message)),
        }
    }
}

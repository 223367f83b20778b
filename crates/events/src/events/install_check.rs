use pnlog_errors::Violation;
use serde::Serialize;

use super::EventName;
use crate::schema::{FieldReader, Fields, Payload};

/// A package instance that failed an installability check (engine, os, cpu)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallCheckMessage {
    pub code: String,
    pub pkg_id: String,
}

impl InstallCheckMessage {
    pub fn new(code: impl Into<String>, pkg_id: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            pkg_id: pkg_id.into(),
        }
    }
}

impl Payload for InstallCheckMessage {
    const FAMILY: EventName = EventName::InstallCheck;

    fn write_fields(&self, out: &mut Fields) {
        out.insert("code".into(), self.code.as_str().into());
        out.insert("pkgId".into(), self.pkg_id.as_str().into());
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        Ok(Self {
            code: fields.string("code")?,
            pkg_id: fields.string("pkgId")?,
        })
    }
}

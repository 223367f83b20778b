use pnlog_errors::Violation;
use serde::Serialize;

use super::EventName;
use crate::schema::{FieldReader, Fields, Payload};

/// A resolved package whose registry entry carries a deprecation notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationMessage {
    pub pkg_name: String,
    pub pkg_version: String,
    pub pkg_id: String,
    /// Deprecation text published by the package author
    pub deprecated: String,
    /// Distance from the root manifest; 0 is a direct dependency
    pub depth: u64,
}

impl Payload for DeprecationMessage {
    const FAMILY: EventName = EventName::Deprecation;

    fn write_fields(&self, out: &mut Fields) {
        out.insert("pkgName".into(), self.pkg_name.as_str().into());
        out.insert("pkgVersion".into(), self.pkg_version.as_str().into());
        out.insert("pkgId".into(), self.pkg_id.as_str().into());
        out.insert("deprecated".into(), self.deprecated.as_str().into());
        out.insert("depth".into(), self.depth.into());
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        Ok(Self {
            pkg_name: fields.string("pkgName")?,
            pkg_version: fields.string("pkgVersion")?,
            pkg_id: fields.string("pkgId")?,
            deprecated: fields.string("deprecated")?,
            depth: fields.unsigned("depth")?,
        })
    }
}

use pnlog_errors::Violation;

use super::EventName;
use crate::schema::{FieldReader, Fields, Payload};

/// What a lifecycle script reported: a line of output or its exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutput {
    Line(String),
    ExitCode(i32),
}

/// Output of a package lifecycle script (`preinstall`, `postinstall`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleMessage {
    pub pkg_id: String,
    pub script: String,
    pub output: LifecycleOutput,
}

impl LifecycleMessage {
    pub fn line(
        pkg_id: impl Into<String>,
        script: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            pkg_id: pkg_id.into(),
            script: script.into(),
            output: LifecycleOutput::Line(line.into()),
        }
    }

    pub fn exit(pkg_id: impl Into<String>, script: impl Into<String>, exit_code: i32) -> Self {
        Self {
            pkg_id: pkg_id.into(),
            script: script.into(),
            output: LifecycleOutput::ExitCode(exit_code),
        }
    }
}

impl Payload for LifecycleMessage {
    const FAMILY: EventName = EventName::Lifecycle;

    fn write_fields(&self, out: &mut Fields) {
        out.insert("pkgId".into(), self.pkg_id.as_str().into());
        out.insert("script".into(), self.script.as_str().into());
        match &self.output {
            LifecycleOutput::Line(line) => {
                out.insert("line".into(), line.as_str().into());
            }
            LifecycleOutput::ExitCode(code) => {
                out.insert("exitCode".into(), (*code).into());
            }
        }
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        let pkg_id = fields.string("pkgId")?;
        let script = fields.string("script")?;
        let output = match (fields.contains("line"), fields.contains("exitCode")) {
            (true, true) => return Err(Violation::conflicting(["line", "exitCode"])),
            (false, false) => return Err(Violation::missing_one_of(["line", "exitCode"])),
            (true, false) => LifecycleOutput::Line(fields.string("line")?),
            (false, true) => LifecycleOutput::ExitCode(fields.signed_i32("exitCode")?),
        };
        Ok(Self {
            pkg_id,
            script,
            output,
        })
    }
}

//! Serializable snapshot of a run

use pnlog_errors::DecodeErrorKind;
use pnlog_events::{AddedDependency, DeprecationMessage, ProgressStatus, RemovedDependency};
use pnlog_types::LogLevel;
use serde::Serialize;

use crate::package::{PackageProgress, RequestState};

/// Something that arrived in an unexpected order. Applied anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Anomaly {
    /// Progress reported for a package whose fetch was never started.
    ProgressWithoutStart {
        pkg_id: String,
        status: ProgressStatus,
    },
    DownloadedExceedsSize {
        pkg_id: String,
        downloaded: u64,
        size: u64,
    },
    /// `sequence` is the 1-based index of the record among applied records.
    EventAfterSummary { sequence: usize, name: String },
}

/// Records seen per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

impl LevelCounts {
    pub fn record(&mut self, level: LogLevel) {
        match level {
            LogLevel::Debug => self.debug += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Error => self.error += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error
    }
}

/// Records the decoder rejected, per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeErrorCounts {
    pub malformed_record: usize,
    pub unknown_event_name: usize,
    pub schema_violation: usize,
}

impl DecodeErrorCounts {
    pub fn record(&mut self, kind: DecodeErrorKind) {
        match kind {
            DecodeErrorKind::MalformedRecord => self.malformed_record += 1,
            DecodeErrorKind::UnknownEventName => self.unknown_event_name += 1,
            DecodeErrorKind::SchemaViolation => self.schema_violation += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.malformed_record + self.unknown_event_name + self.schema_violation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub pkg_id: String,
    #[serde(flatten)]
    pub progress: PackageProgress,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub packages: usize,
    pub installed: usize,
    pub expected_bytes: u64,
    pub downloaded_bytes: u64,
    pub failed_scripts: usize,
    pub failed_requests: usize,
    pub deprecations: usize,
}

/// Everything a [`crate::RunState`] knows, in a form ready for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub records: usize,
    pub finished: bool,
    pub resolution_done: bool,
    pub levels: LevelCounts,
    pub decode_errors: DecodeErrorCounts,
    pub totals: Totals,
    pub packages: Vec<PackageSummary>,
    pub requests: Vec<RequestState>,
    pub added: Vec<AddedDependency>,
    pub removed: Vec<RemovedDependency>,
    pub deprecations: Vec<DeprecationMessage>,
    pub registry_messages: Vec<String>,
    pub messages: Vec<String>,
    pub anomalies: Vec<Anomaly>,
}

impl RunSummary {
    /// True when the run finished and nothing failed along the way.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.finished
            && self.decode_errors.total() == 0
            && self.levels.error == 0
            && self.totals.failed_scripts == 0
            && self.totals.failed_requests == 0
    }
}

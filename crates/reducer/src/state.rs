use std::collections::BTreeMap;

use pnlog_errors::DecodeError;
use pnlog_events::{
    AddedDependency, DeprecationMessage, LifecycleMessage, LifecycleOutput, LogEvent, LogRecord,
    ProgressMessage, ProgressStatus, RemovedDependency, RootMessage, StageMessage,
};
use pnlog_types::LoggedPkg;
use tracing::debug;

use crate::package::{PackageProgress, RequestState};
use crate::summary::{Anomaly, DecodeErrorCounts, LevelCounts, PackageSummary, RunSummary, Totals};

/// State of one install run, built by applying records in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    records: usize,
    packages: BTreeMap<String, PackageProgress>,
    requests: BTreeMap<LoggedPkg, RequestState>,
    added: Vec<AddedDependency>,
    removed: Vec<RemovedDependency>,
    deprecations: Vec<DeprecationMessage>,
    registry_messages: Vec<String>,
    messages: Vec<String>,
    resolution_done: bool,
    finished: bool,
    levels: LevelCounts,
    decode_errors: DecodeErrorCounts,
    anomalies: Vec<Anomaly>,
}

impl RunState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a whole stream of decode outcomes.
    pub fn fold<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<LogRecord, DecodeError>>,
    {
        let mut state = Self::new();
        for outcome in outcomes {
            state.apply_outcome(&outcome);
        }
        state
    }

    /// Apply a decoded record, or count a rejected one.
    pub fn apply_outcome(&mut self, outcome: &Result<LogRecord, DecodeError>) {
        match outcome {
            Ok(record) => self.apply(record),
            Err(err) => {
                debug!(position = err.position(), kind = ?err.kind(), "counting rejected record");
                self.decode_errors.record(err.kind());
            }
        }
    }

    pub fn apply(&mut self, record: &LogRecord) {
        self.records += 1;
        self.levels.record(record.level);

        if self.finished {
            self.note(Anomaly::EventAfterSummary {
                sequence: self.records,
                name: record.name().to_string(),
            });
        }

        match &record.event {
            LogEvent::Base(message) => {
                if let Some(text) = message.message() {
                    self.messages.push(text.to_owned());
                }
            }
            LogEvent::Progress(message) => self.apply_progress(message),
            LogEvent::Lifecycle(message) => self.apply_lifecycle(message),
            LogEvent::InstallCheck(message) => {
                self.package_mut(&message.pkg_id)
                    .install_checks
                    .push(message.code.clone());
            }
            LogEvent::Deprecation(message) => self.deprecations.push(message.clone()),
            LogEvent::Stage(StageMessage::ResolutionDone) => self.resolution_done = true,
            LogEvent::Registry(message) => self.registry_messages.push(message.message.clone()),
            LogEvent::Root(RootMessage::Added(dep)) => self.added.push(dep.clone()),
            LogEvent::Root(RootMessage::Removed(dep)) => self.removed.push(dep.clone()),
            LogEvent::Summary(_) => self.finished = true,
        }
    }

    fn apply_progress(&mut self, message: &ProgressMessage) {
        match message {
            ProgressMessage::Request { pkg, .. } => {
                let status = message.status();
                self.requests
                    .entry(pkg.clone())
                    .and_modify(|request| request.status = status)
                    .or_insert_with(|| RequestState {
                        pkg: pkg.clone(),
                        status,
                        pkg_id: None,
                    });
            }
            ProgressMessage::Resolved { pkg_id, pkg } => {
                self.package_mut(pkg_id).status = Some(ProgressStatus::Resolved);
                let request = self
                    .requests
                    .entry(pkg.clone())
                    .or_insert_with(|| RequestState {
                        pkg: pkg.clone(),
                        status: ProgressStatus::Resolved,
                        pkg_id: None,
                    });
                request.status = ProgressStatus::Resolved;
                request.pkg_id = Some(pkg_id.clone());
            }
            ProgressMessage::Milestone { pkg_id, .. } => {
                self.package_mut(pkg_id).status = Some(message.status());
            }
            ProgressMessage::FetchingStarted {
                pkg_id,
                size,
                attempt,
            } => {
                let package = self.package_mut(pkg_id);
                package.status = Some(ProgressStatus::FetchingStarted);
                package.size = *size;
                package.downloaded = 0;
                package.attempts = package.attempts.max(*attempt);
                package.fetch_started = true;
            }
            ProgressMessage::FetchingProgress { pkg_id, downloaded } => {
                let package = self.package_mut(pkg_id);
                package.status = Some(ProgressStatus::FetchingProgress);
                package.downloaded = *downloaded;
                let first_untracked = !package.fetch_started && !package.untracked;
                if !package.fetch_started {
                    package.untracked = true;
                }
                let overflow = package.size.filter(|size| downloaded > size);

                if first_untracked {
                    self.note(Anomaly::ProgressWithoutStart {
                        pkg_id: pkg_id.clone(),
                        status: ProgressStatus::FetchingProgress,
                    });
                }
                if let Some(size) = overflow {
                    self.note(Anomaly::DownloadedExceedsSize {
                        pkg_id: pkg_id.clone(),
                        downloaded: *downloaded,
                        size,
                    });
                }
            }
            ProgressMessage::DownloadedManifest {
                pkg_id,
                pkg_version,
            } => {
                let package = self.package_mut(pkg_id);
                package.status = Some(ProgressStatus::DownloadedManifest);
                package.version = Some(pkg_version.clone());
            }
        }
    }

    fn apply_lifecycle(&mut self, message: &LifecycleMessage) {
        let script = self
            .package_mut(&message.pkg_id)
            .scripts
            .entry(message.script.clone())
            .or_default();
        match &message.output {
            LifecycleOutput::Line(line) => script.lines.push(line.clone()),
            LifecycleOutput::ExitCode(code) => script.exit_code = Some(*code),
        }
    }

    fn package_mut(&mut self, pkg_id: &str) -> &mut PackageProgress {
        self.packages.entry(pkg_id.to_string()).or_default()
    }

    fn note(&mut self, anomaly: Anomaly) {
        debug!(?anomaly, "out-of-order event");
        self.anomalies.push(anomaly);
    }

    #[must_use]
    pub fn package(&self, pkg_id: &str) -> Option<&PackageProgress> {
        self.packages.get(pkg_id)
    }

    pub fn packages(&self) -> impl Iterator<Item = (&str, &PackageProgress)> {
        self.packages.iter().map(|(id, package)| (id.as_str(), package))
    }

    #[must_use]
    pub fn request(&self, pkg: &LoggedPkg) -> Option<&RequestState> {
        self.requests.get(pkg)
    }

    /// Records applied so far, not counting rejected ones.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn resolution_done(&self) -> bool {
        self.resolution_done
    }

    #[must_use]
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    #[must_use]
    pub fn decode_errors(&self) -> DecodeErrorCounts {
        self.decode_errors
    }

    #[must_use]
    pub fn levels(&self) -> LevelCounts {
        self.levels
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let totals = Totals {
            packages: self.packages.len(),
            installed: self.packages.values().filter(|p| p.is_installed()).count(),
            // sizes come straight off the wire, so totals saturate
            expected_bytes: self
                .packages
                .values()
                .filter_map(|p| p.size)
                .fold(0, u64::saturating_add),
            downloaded_bytes: self
                .packages
                .values()
                .map(|p| p.downloaded)
                .fold(0, u64::saturating_add),
            failed_scripts: self
                .packages
                .values()
                .map(|p| p.failed_scripts().count())
                .sum(),
            failed_requests: self
                .requests
                .values()
                .filter(|r| r.status == ProgressStatus::Error)
                .count(),
            deprecations: self.deprecations.len(),
        };

        RunSummary {
            records: self.records,
            finished: self.finished,
            resolution_done: self.resolution_done,
            levels: self.levels,
            decode_errors: self.decode_errors,
            totals,
            packages: self
                .packages
                .iter()
                .map(|(pkg_id, progress)| PackageSummary {
                    pkg_id: pkg_id.clone(),
                    progress: progress.clone(),
                })
                .collect(),
            requests: self.requests.values().cloned().collect(),
            added: self.added.clone(),
            removed: self.removed.clone(),
            deprecations: self.deprecations.clone(),
            registry_messages: self.registry_messages.clone(),
            messages: self.messages.clone(),
            anomalies: self.anomalies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnlog_events::{
        BaseMessage, InstallCheckMessage, PkgMilestone, RequestStatus, StandardMessage,
        SummaryMessage,
    };
    use pnlog_types::{DependencyType, LogLevel};

    fn info(event: impl Into<LogEvent>) -> LogRecord {
        LogRecord::new(LogLevel::Info, event)
    }

    #[test]
    fn test_fetch_progress_is_tracked_per_package() {
        let mut state = RunState::new();
        state.apply(&info(ProgressMessage::fetching_started("pkg-a", Some(1024), 1)));
        state.apply(&info(ProgressMessage::fetching_progress("pkg-a", 256)));
        state.apply(&info(ProgressMessage::fetching_progress("pkg-a", 512)));

        let package = state.package("pkg-a").unwrap();
        assert_eq!(package.size, Some(1024));
        assert_eq!(package.downloaded, 512);
        assert_eq!(package.attempts, 1);
        assert_eq!(package.status, Some(ProgressStatus::FetchingProgress));
        assert!(!package.untracked);
        assert!(state.anomalies().is_empty());
    }

    #[test]
    fn test_byte_totals_saturate() {
        let mut state = RunState::new();
        state.apply(&info(ProgressMessage::fetching_started("a", Some(u64::MAX), 1)));
        state.apply(&info(ProgressMessage::fetching_started("b", Some(2), 1)));
        state.apply(&info(ProgressMessage::fetching_progress("a", u64::MAX)));
        state.apply(&info(ProgressMessage::fetching_progress("b", 1)));

        let totals = state.summary().totals;
        assert_eq!(totals.packages, 2);
        assert_eq!(totals.expected_bytes, u64::MAX);
        assert_eq!(totals.downloaded_bytes, u64::MAX);
    }

    #[test]
    fn test_progress_without_start_is_flagged_once() {
        let mut state = RunState::new();
        state.apply(&info(ProgressMessage::fetching_progress("pkg-b", 10)));
        state.apply(&info(ProgressMessage::fetching_progress("pkg-b", 20)));

        let package = state.package("pkg-b").unwrap();
        assert!(package.untracked);
        assert_eq!(package.downloaded, 20);
        assert_eq!(
            state.anomalies(),
            &[Anomaly::ProgressWithoutStart {
                pkg_id: "pkg-b".into(),
                status: ProgressStatus::FetchingProgress,
            }]
        );
    }

    #[test]
    fn test_downloaded_beyond_size() {
        let mut state = RunState::new();
        state.apply(&info(ProgressMessage::fetching_started("pkg-a", Some(100), 1)));
        state.apply(&info(ProgressMessage::fetching_progress("pkg-a", 150)));
        assert_eq!(
            state.anomalies(),
            &[Anomaly::DownloadedExceedsSize {
                pkg_id: "pkg-a".into(),
                downloaded: 150,
                size: 100,
            }]
        );
    }

    #[test]
    fn test_retry_resets_downloaded() {
        let mut state = RunState::new();
        state.apply(&info(ProgressMessage::fetching_started("pkg-a", Some(100), 1)));
        state.apply(&info(ProgressMessage::fetching_progress("pkg-a", 60)));
        state.apply(&info(ProgressMessage::fetching_started("pkg-a", Some(100), 2)));

        let package = state.package("pkg-a").unwrap();
        assert_eq!(package.downloaded, 0);
        assert_eq!(package.attempts, 2);
    }

    #[test]
    fn test_request_is_linked_by_resolved() {
        let pkg = LoggedPkg::dependency_of("lodash", "^4", "app@1.0.0");
        let mut state = RunState::new();
        state.apply(&info(ProgressMessage::request(pkg.clone(), RequestStatus::Resolving)));
        assert!(!state.request(&pkg).unwrap().is_resolved());

        state.apply(&info(ProgressMessage::resolved("lodash@4.17.21", pkg.clone())));
        let request = state.request(&pkg).unwrap();
        assert_eq!(request.pkg_id.as_deref(), Some("lodash@4.17.21"));
        assert_eq!(request.status, ProgressStatus::Resolved);
        assert_eq!(
            state.package("lodash@4.17.21").unwrap().status,
            Some(ProgressStatus::Resolved)
        );

        // Same name and spec from another dependent is a separate request.
        let other = LoggedPkg::root("lodash", "^4");
        assert!(state.request(&other).is_none());
    }

    #[test]
    fn test_lifecycle_scripts() {
        let mut state = RunState::new();
        state.apply(&info(LifecycleMessage::line("esbuild@0.19.0", "postinstall", "ok")));
        state.apply(&info(LifecycleMessage::exit("esbuild@0.19.0", "postinstall", 0)));
        state.apply(&info(LifecycleMessage::exit("fsevents@2.3.3", "install", 1)));

        let script = &state.package("esbuild@0.19.0").unwrap().scripts["postinstall"];
        assert_eq!(script.lines, vec!["ok".to_string()]);
        assert_eq!(script.exit_code, Some(0));
        assert!(state.anomalies().is_empty());
        assert_eq!(state.summary().totals.failed_scripts, 1);
    }

    #[test]
    fn test_events_after_summary_are_noted() {
        let mut state = RunState::new();
        state.apply(&info(SummaryMessage));
        assert!(state.is_finished());
        state.apply(&LogRecord::new(LogLevel::Warn, StandardMessage::new("late")));

        assert_eq!(
            state.anomalies(),
            &[Anomaly::EventAfterSummary {
                sequence: 2,
                name: "pnpm:registry".into(),
            }]
        );
        assert_eq!(state.summary().registry_messages, vec!["late".to_string()]);
    }

    #[test]
    fn test_misc_families() {
        let mut state = RunState::new();
        state.apply(&info(StageMessage::ResolutionDone));
        state.apply(&info(RootMessage::added("react", "18.2.0", DependencyType::Prod)));
        state.apply(&info(RootMessage::removed("left-pad", None, DependencyType::Dev)));
        state.apply(&info(InstallCheckMessage::new("EBADPLATFORM", "fsevents@2.3.3")));
        state.apply(&info(BaseMessage::new("hello")));
        state.apply(&info(ProgressMessage::milestone("react@18.2.0", PkgMilestone::Installed)));

        let summary = state.summary();
        assert!(summary.resolution_done);
        assert_eq!(summary.added.len(), 1);
        assert_eq!(summary.removed.len(), 1);
        assert_eq!(summary.messages, vec!["hello".to_string()]);
        assert_eq!(summary.totals.installed, 1);
        assert_eq!(
            state.package("fsevents@2.3.3").unwrap().install_checks,
            vec!["EBADPLATFORM".to_string()]
        );
        assert_eq!(summary.levels.info, 6);
    }

    #[test]
    fn test_decode_errors_are_counted() {
        let mut state = RunState::new();
        state.apply_outcome(&Err(DecodeError::MalformedRecord {
            position: 1,
            reason: "expected value".into(),
            raw: "{".into(),
        }));
        state.apply_outcome(&Ok(info(SummaryMessage)));

        assert_eq!(state.decode_errors().malformed_record, 1);
        assert_eq!(state.records(), 1);
        assert!(!state.summary().is_clean());
    }
}

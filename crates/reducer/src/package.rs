//! Per-package and per-request state

use std::collections::BTreeMap;

use pnlog_events::ProgressStatus;
use pnlog_types::LoggedPkg;
use serde::Serialize;

/// Output and result of one lifecycle script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptState {
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ScriptState {
    /// `None` while the script has not reported an exit code.
    #[must_use]
    pub fn succeeded(&self) -> Option<bool> {
        self.exit_code.map(|code| code == 0)
    }
}

/// Everything known about one package, keyed by its `pkgId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageProgress {
    /// Latest progress status seen for the package.
    pub status: Option<ProgressStatus>,
    /// Expected tarball size announced by `fetching_started`.
    pub size: Option<u64>,
    /// Running total reported by the latest `fetching_progress`.
    pub downloaded: u64,
    /// Highest fetch attempt number seen.
    pub attempts: u32,
    pub version: Option<String>,
    pub scripts: BTreeMap<String, ScriptState>,
    pub install_checks: Vec<String>,
    /// Progress arrived without a prior `fetching_started`.
    pub untracked: bool,
    #[serde(skip)]
    pub(crate) fetch_started: bool,
}

impl PackageProgress {
    /// Downloaded share of the expected size, when the size is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        match self.size {
            Some(0) | None => None,
            Some(size) => Some(self.downloaded as f64 / size as f64),
        }
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(
            self.status,
            Some(ProgressStatus::Installed | ProgressStatus::DependenciesInstalled)
        )
    }

    /// Scripts that exited with a non-zero code
    pub fn failed_scripts(&self) -> impl Iterator<Item = (&str, i32)> {
        self.scripts.iter().filter_map(|(name, script)| match script.exit_code {
            Some(code) if code != 0 => Some((name.as_str(), code)),
            _ => None,
        })
    }
}

/// A package request that may not have a `pkgId` yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestState {
    pub pkg: LoggedPkg,
    pub status: ProgressStatus,
    /// Set once a `resolved` event names the same request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkg_id: Option<String>,
}

impl RequestState {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.pkg_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_needs_a_size() {
        let mut progress = PackageProgress {
            downloaded: 512,
            ..PackageProgress::default()
        };
        assert_eq!(progress.fraction(), None);
        progress.size = Some(0);
        assert_eq!(progress.fraction(), None);
        progress.size = Some(1024);
        assert_eq!(progress.fraction(), Some(0.5));
    }

    #[test]
    fn test_failed_scripts() {
        let mut progress = PackageProgress::default();
        progress.scripts.insert(
            "install".into(),
            ScriptState {
                lines: vec![],
                exit_code: Some(0),
            },
        );
        progress.scripts.insert(
            "postinstall".into(),
            ScriptState {
                lines: vec!["boom".into()],
                exit_code: Some(2),
            },
        );
        progress.scripts.insert("prepare".into(), ScriptState::default());

        let failed: Vec<_> = progress.failed_scripts().collect();
        assert_eq!(failed, vec![("postinstall", 2)]);
        assert_eq!(progress.scripts["prepare"].succeeded(), None);
        assert_eq!(progress.scripts["install"].succeeded(), Some(true));
    }
}

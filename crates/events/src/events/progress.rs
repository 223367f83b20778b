use std::fmt;

use pnlog_errors::Violation;
use pnlog_types::LoggedPkg;
use serde::Serialize;

use super::EventName;
use crate::schema::{logged_pkg_value, FieldReader, Fields, Payload};

/// Every value the `status` discriminant of a progress event can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Resolving,
    Resolved,
    ResolvingContent,
    DownloadedManifest,
    FetchingStarted,
    FetchingProgress,
    Fetched,
    FoundInStore,
    Installing,
    Installed,
    DependenciesInstalled,
    Error,
}

impl ProgressStatus {
    pub const ALL: [Self; 12] = [
        Self::Resolving,
        Self::Resolved,
        Self::ResolvingContent,
        Self::DownloadedManifest,
        Self::FetchingStarted,
        Self::FetchingProgress,
        Self::Fetched,
        Self::FoundInStore,
        Self::Installing,
        Self::Installed,
        Self::DependenciesInstalled,
        Self::Error,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::ResolvingContent => "resolving_content",
            Self::DownloadedManifest => "downloaded_manifest",
            Self::FetchingStarted => "fetching_started",
            Self::FetchingProgress => "fetching_progress",
            Self::Fetched => "fetched",
            Self::FoundInStore => "found_in_store",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::DependenciesInstalled => "dependencies_installed",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses that carry nothing but the package id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PkgMilestone {
    Fetched,
    Installed,
    DependenciesInstalled,
    FoundInStore,
    ResolvingContent,
}

impl From<PkgMilestone> for ProgressStatus {
    fn from(milestone: PkgMilestone) -> Self {
        match milestone {
            PkgMilestone::Fetched => Self::Fetched,
            PkgMilestone::Installed => Self::Installed,
            PkgMilestone::DependenciesInstalled => Self::DependenciesInstalled,
            PkgMilestone::FoundInStore => Self::FoundInStore,
            PkgMilestone::ResolvingContent => Self::ResolvingContent,
        }
    }
}

/// Statuses reported against a package request, before it has an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Resolving,
    Error,
    Installing,
}

impl From<RequestStatus> for ProgressStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Resolving => Self::Resolving,
            RequestStatus::Error => Self::Error,
            RequestStatus::Installing => Self::Installing,
        }
    }
}

/// Progress of a single package through resolution, fetching and linking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    Milestone {
        pkg_id: String,
        status: PkgMilestone,
    },
    Resolved {
        pkg_id: String,
        pkg: LoggedPkg,
    },
    Request {
        pkg: LoggedPkg,
        status: RequestStatus,
    },
    FetchingStarted {
        pkg_id: String,
        /// Tarball size, when the registry announced one
        size: Option<u64>,
        attempt: u32,
    },
    FetchingProgress {
        pkg_id: String,
        /// Bytes received so far for the current attempt
        downloaded: u64,
    },
    DownloadedManifest {
        pkg_id: String,
        pkg_version: String,
    },
}

impl ProgressMessage {
    pub fn milestone(pkg_id: impl Into<String>, status: PkgMilestone) -> Self {
        Self::Milestone {
            pkg_id: pkg_id.into(),
            status,
        }
    }

    pub fn resolved(pkg_id: impl Into<String>, pkg: LoggedPkg) -> Self {
        Self::Resolved {
            pkg_id: pkg_id.into(),
            pkg,
        }
    }

    #[must_use]
    pub fn request(pkg: LoggedPkg, status: RequestStatus) -> Self {
        Self::Request { pkg, status }
    }

    pub fn fetching_started(pkg_id: impl Into<String>, size: Option<u64>, attempt: u32) -> Self {
        Self::FetchingStarted {
            pkg_id: pkg_id.into(),
            size,
            attempt,
        }
    }

    pub fn fetching_progress(pkg_id: impl Into<String>, downloaded: u64) -> Self {
        Self::FetchingProgress {
            pkg_id: pkg_id.into(),
            downloaded,
        }
    }

    pub fn downloaded_manifest(pkg_id: impl Into<String>, pkg_version: impl Into<String>) -> Self {
        Self::DownloadedManifest {
            pkg_id: pkg_id.into(),
            pkg_version: pkg_version.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        match self {
            Self::Milestone { status, .. } => (*status).into(),
            Self::Resolved { .. } => ProgressStatus::Resolved,
            Self::Request { status, .. } => (*status).into(),
            Self::FetchingStarted { .. } => ProgressStatus::FetchingStarted,
            Self::FetchingProgress { .. } => ProgressStatus::FetchingProgress,
            Self::DownloadedManifest { .. } => ProgressStatus::DownloadedManifest,
        }
    }

    #[must_use]
    pub fn pkg_id(&self) -> Option<&str> {
        match self {
            Self::Milestone { pkg_id, .. }
            | Self::Resolved { pkg_id, .. }
            | Self::FetchingStarted { pkg_id, .. }
            | Self::FetchingProgress { pkg_id, .. }
            | Self::DownloadedManifest { pkg_id, .. } => Some(pkg_id),
            Self::Request { .. } => None,
        }
    }

    #[must_use]
    pub fn pkg(&self) -> Option<&LoggedPkg> {
        match self {
            Self::Resolved { pkg, .. } | Self::Request { pkg, .. } => Some(pkg),
            _ => None,
        }
    }
}

impl Payload for ProgressMessage {
    const FAMILY: EventName = EventName::Progress;

    fn write_fields(&self, out: &mut Fields) {
        out.insert("status".into(), self.status().as_str().into());
        if let Some(pkg_id) = self.pkg_id() {
            out.insert("pkgId".into(), pkg_id.into());
        }
        if let Some(pkg) = self.pkg() {
            out.insert("pkg".into(), logged_pkg_value(pkg));
        }
        match self {
            Self::FetchingStarted { size, attempt, .. } => {
                out.insert("size".into(), (*size).into());
                out.insert("attempt".into(), (*attempt).into());
            }
            Self::FetchingProgress { downloaded, .. } => {
                out.insert("downloaded".into(), (*downloaded).into());
            }
            Self::DownloadedManifest { pkg_version, .. } => {
                out.insert("pkgVersion".into(), pkg_version.as_str().into());
            }
            Self::Milestone { .. } | Self::Resolved { .. } | Self::Request { .. } => {}
        }
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        let status = fields.string("status")?;
        let status = ProgressStatus::parse(&status)
            .ok_or_else(|| Violation::unknown_discriminant("status", status))?;

        match status {
            ProgressStatus::Fetched => read_milestone(fields, PkgMilestone::Fetched),
            ProgressStatus::Installed => read_milestone(fields, PkgMilestone::Installed),
            ProgressStatus::DependenciesInstalled => {
                read_milestone(fields, PkgMilestone::DependenciesInstalled)
            }
            ProgressStatus::FoundInStore => read_milestone(fields, PkgMilestone::FoundInStore),
            ProgressStatus::ResolvingContent => {
                read_milestone(fields, PkgMilestone::ResolvingContent)
            }
            ProgressStatus::Resolving => read_request(fields, RequestStatus::Resolving),
            ProgressStatus::Error => read_request(fields, RequestStatus::Error),
            ProgressStatus::Installing => read_request(fields, RequestStatus::Installing),
            ProgressStatus::Resolved => Ok(Self::Resolved {
                pkg_id: fields.string("pkgId")?,
                pkg: fields.logged_pkg("pkg")?,
            }),
            ProgressStatus::FetchingStarted => Ok(Self::FetchingStarted {
                pkg_id: fields.string("pkgId")?,
                size: fields.nullable_unsigned("size")?,
                attempt: fields.unsigned_u32("attempt")?,
            }),
            ProgressStatus::FetchingProgress => Ok(Self::FetchingProgress {
                pkg_id: fields.string("pkgId")?,
                downloaded: fields.unsigned("downloaded")?,
            }),
            ProgressStatus::DownloadedManifest => Ok(Self::DownloadedManifest {
                pkg_id: fields.string("pkgId")?,
                pkg_version: fields.string("pkgVersion")?,
            }),
        }
    }
}

fn read_milestone(
    fields: &mut FieldReader,
    status: PkgMilestone,
) -> Result<ProgressMessage, Violation> {
    Ok(ProgressMessage::Milestone {
        pkg_id: fields.string("pkgId")?,
        status,
    })
}

fn read_request(
    fields: &mut FieldReader,
    status: RequestStatus,
) -> Result<ProgressMessage, Violation> {
    Ok(ProgressMessage::Request {
        pkg: fields.logged_pkg("pkg")?,
        status,
    })
}

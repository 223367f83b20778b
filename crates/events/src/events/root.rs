use pnlog_errors::Violation;
use pnlog_types::DependencyType;
use serde::Serialize;

use super::EventName;
use crate::schema::{FieldReader, Fields, Payload};

/// A dependency written to the root manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedDependency {
    pub name: String,
    pub version: String,
    pub dependency_type: DependencyType,
}

/// A dependency dropped from the root manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedDependency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub dependency_type: DependencyType,
}

/// Change to the root manifest's dependency lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootMessage {
    Added(AddedDependency),
    Removed(RemovedDependency),
}

impl RootMessage {
    pub fn added(
        name: impl Into<String>,
        version: impl Into<String>,
        dependency_type: DependencyType,
    ) -> Self {
        Self::Added(AddedDependency {
            name: name.into(),
            version: version.into(),
            dependency_type,
        })
    }

    pub fn removed(
        name: impl Into<String>,
        version: Option<String>,
        dependency_type: DependencyType,
    ) -> Self {
        Self::Removed(RemovedDependency {
            name: name.into(),
            version,
            dependency_type,
        })
    }

    #[must_use]
    pub fn dependency_name(&self) -> &str {
        match self {
            Self::Added(dep) => &dep.name,
            Self::Removed(dep) => &dep.name,
        }
    }
}

fn read_dependency_type(fields: &mut FieldReader) -> Result<DependencyType, Violation> {
    let value = fields.string("dependencyType")?;
    value
        .parse()
        .map_err(|_| Violation::unknown_discriminant("dependencyType", value))
}

fn read_added(fields: &mut FieldReader) -> Result<AddedDependency, Violation> {
    let dep = AddedDependency {
        name: fields.string("name")?,
        version: fields.string("version")?,
        dependency_type: read_dependency_type(fields)?,
    };
    std::mem::take(fields).finish()?;
    Ok(dep)
}

fn read_removed(fields: &mut FieldReader) -> Result<RemovedDependency, Violation> {
    let dep = RemovedDependency {
        name: fields.string("name")?,
        version: fields.optional_string("version")?,
        dependency_type: read_dependency_type(fields)?,
    };
    std::mem::take(fields).finish()?;
    Ok(dep)
}

impl Payload for RootMessage {
    const FAMILY: EventName = EventName::Root;

    fn write_fields(&self, out: &mut Fields) {
        let mut dep = Fields::new();
        let key = match self {
            Self::Added(added) => {
                dep.insert("name".into(), added.name.as_str().into());
                dep.insert("version".into(), added.version.as_str().into());
                dep.insert(
                    "dependencyType".into(),
                    added.dependency_type.as_str().into(),
                );
                "added"
            }
            Self::Removed(removed) => {
                dep.insert("name".into(), removed.name.as_str().into());
                if let Some(version) = &removed.version {
                    dep.insert("version".into(), version.as_str().into());
                }
                dep.insert(
                    "dependencyType".into(),
                    removed.dependency_type.as_str().into(),
                );
                "removed"
            }
        };
        out.insert(key.into(), dep.into());
    }

    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation> {
        match (fields.contains("added"), fields.contains("removed")) {
            (true, true) => Err(Violation::conflicting(["added", "removed"])),
            (false, false) => Err(Violation::missing_one_of(["added", "removed"])),
            (true, false) => {
                let mut added = fields.object("added")?;
                read_added(&mut added)
                    .map(Self::Added)
                    .map_err(|violation| violation.nested("added"))
            }
            (false, true) => {
                let mut removed = fields.object("removed")?;
                read_removed(&mut removed)
                    .map(Self::Removed)
                    .map_err(|violation| violation.nested("removed"))
            }
        }
    }
}

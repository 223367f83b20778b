//! Package-related type definitions

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A package resolution request as it appears in progress events.
///
/// `dependent_id` is absent for requests made directly from the root
/// manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedPkg {
    pub raw_spec: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependent_id: Option<String>,
}

impl LoggedPkg {
    /// Create a request made from the root manifest
    pub fn root(name: impl Into<String>, raw_spec: impl Into<String>) -> Self {
        Self {
            raw_spec: raw_spec.into(),
            name: name.into(),
            dependent_id: None,
        }
    }

    /// Create a request made on behalf of another package
    pub fn dependency_of(
        name: impl Into<String>,
        raw_spec: impl Into<String>,
        dependent_id: impl Into<String>,
    ) -> Self {
        Self {
            raw_spec: raw_spec.into(),
            name: name.into(),
            dependent_id: Some(dependent_id.into()),
        }
    }

    /// Whether the request originates from the root manifest
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.dependent_id.is_none()
    }
}

impl fmt::Display for LoggedPkg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.raw_spec)
    }
}

/// Section of the root manifest a dependency belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Prod,
    Dev,
    Optional,
}

impl DependencyType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            "optional" => Ok(Self::Optional),
            other => Err(format!("unknown dependency type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_pkg_wire_shape() {
        let pkg = LoggedPkg::dependency_of("lodash", "^4.17.0", "registry/express/4.18.2");
        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rawSpec": "^4.17.0",
                "name": "lodash",
                "dependentId": "registry/express/4.18.2",
            })
        );

        let root = LoggedPkg::root("lodash", "^4.17.0");
        let json = serde_json::to_string(&root).unwrap();
        assert!(!json.contains("dependentId"));
        assert!(root.is_root());
    }

    #[test]
    fn test_dependency_type_serialization() {
        let json = serde_json::to_string(&DependencyType::Optional).unwrap();
        assert_eq!(json, r#""optional""#);
        assert_eq!("dev".parse::<DependencyType>().unwrap(), DependencyType::Dev);
        assert!("peer".parse::<DependencyType>().is_err());
    }
}

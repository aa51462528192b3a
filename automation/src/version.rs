//! Selection of the TwinCAT version that an IDE session runs with.
//!
//! More than one TwinCAT version can be installed side by side. The version
//! is decided by these rules, in order:
//!
//! 1. a version forced on the command line,
//! 2. the version the project is pinned to,
//! 3. otherwise the latest installed version.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelection {
    /// The user asked for this version.
    Forced(String),
    /// The project is pinned to this version.
    Pinned(String),
    /// Use the latest installed version.
    Latest,
}

impl VersionSelection {
    /// Applies the selection rules.
    pub fn select(project_version: &str, pinned: bool, forced: Option<&str>) -> Self {
        match forced.map(str::trim).filter(|v| !v.is_empty()) {
            Some(version) => VersionSelection::Forced(version.to_string()),
            None if pinned => VersionSelection::Pinned(project_version.to_string()),
            None => VersionSelection::Latest,
        }
    }

    /// The specific version to load, or `None` for the latest.
    pub fn version(&self) -> Option<&str> {
        match self {
            VersionSelection::Forced(version) | VersionSelection::Pinned(version) => {
                Some(version.as_str())
            }
            VersionSelection::Latest => None,
        }
    }
}

impl fmt::Display for VersionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelection::Forced(version) => write!(f, "{version} (forced)"),
            VersionSelection::Pinned(version) => write!(f, "{version} (pinned)"),
            VersionSelection::Latest => write!(f, "latest installed"),
        }
    }
}

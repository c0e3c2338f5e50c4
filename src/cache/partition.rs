//! Partition naming and cache versions.

use std::fmt;

use serde::Serialize;

use crate::error::{OfflineError, Result};

// == Partition Role ==
/// Logical role of a partition. Exactly one partition per role is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionRole {
    /// Precached shell, fonts, build assets
    Static,
    /// Runtime-fetched pages and images
    Dynamic,
    Api,
}

impl PartitionRole {
    pub const ALL: [PartitionRole; 3] = [
        PartitionRole::Static,
        PartitionRole::Dynamic,
        PartitionRole::Api,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionRole::Static => "static",
            PartitionRole::Dynamic => "dynamic",
            PartitionRole::Api => "api",
        }
    }
}

impl fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Cache Version ==
/// Version tag shared by every partition of one generation (e.g. `v3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Validates and wraps a version tag. Tags may not be empty or contain
    /// whitespace, so `<role>-<version>` stays a single token.
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(OfflineError::InvalidRequest(format!(
                "invalid cache version '{}'",
                tag
            )));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Partition Name ==
/// Identifier of one partition, rendered as `<role>-<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionName {
    pub role: PartitionRole,
    pub version: CacheVersion,
}

impl PartitionName {
    pub fn new(role: PartitionRole, version: &CacheVersion) -> Self {
        Self {
            role,
            version: version.clone(),
        }
    }
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_name_format() {
        let v3 = CacheVersion::new("v3").unwrap();
        assert_eq!(
            PartitionName::new(PartitionRole::Static, &v3).to_string(),
            "static-v3"
        );
        assert_eq!(PartitionName::new(PartitionRole::Api, &v3).to_string(), "api-v3");
    }

    #[test]
    fn test_version_rejects_empty_and_whitespace() {
        assert!(CacheVersion::new("").is_err());
        assert!(CacheVersion::new("v 2").is_err());
        assert!(CacheVersion::new("2024-06-01").is_ok());
    }
}

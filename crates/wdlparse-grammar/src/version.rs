//! Representation for version definitions.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Represents a supported WDL version.
///
/// The `Default` implementation of this type returns the most recent
/// supported version of WDL.
// NOTE: it is expected that this enumeration is in increasing order of WDL versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SupportedVersion {
    /// The document version is 1.0.
    #[serde(rename = "1.0")]
    V1_0,
    /// The document version is 1.1.
    #[serde(rename = "1.1")]
    V1_1,
    /// The document version is 1.2.
    #[serde(rename = "1.2")]
    V1_2,
}

impl SupportedVersion {
    /// Returns an iterator over all supported WDL versions.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::V1_0, Self::V1_1, Self::V1_2].into_iter()
    }
}

impl Default for SupportedVersion {
    fn default() -> Self {
        Self::V1_2
    }
}

impl fmt::Display for SupportedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_0 => write!(f, "1.0"),
            Self::V1_1 => write!(f, "1.1"),
            Self::V1_2 => write!(f, "1.2"),
        }
    }
}

/// An error for when a version string is not a supported WDL version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported WDL version `{0}`")]
pub struct UnsupportedVersion(pub String);

impl FromStr for SupportedVersion {
    type Err = UnsupportedVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            "1.2" => Ok(Self::V1_2),
            _ => Err(UnsupportedVersion(s.to_string())),
        }
    }
}

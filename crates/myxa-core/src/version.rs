//! Two-slot package versions.
//!
//! A myxa version carries a major and a minor slot only. Ordering is
//! lexicographic, and two versions are compatible exactly when their
//! majors are equal. Versions render and parse as `<major>.<minor>`, which
//! also lets them key JSON objects in the persisted index.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing a version string.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The input is not of the form `<major>.<minor>`.
    #[error("invalid version '{input}': {reason}")]
    Invalid { input: String, reason: &'static str },
}

/// A two-slot version: `(major, minor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Incremented on breaking interface changes.
    pub major: u32,
    /// Incremented on non-breaking interface changes.
    pub minor: u32,
}

impl Version {
    /// The version every package carries on its first publish.
    pub const INITIAL: Version = Version { major: 1, minor: 0 };

    /// Create a version from its two slots.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Two versions are compatible when their majors are equal.
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Version) -> bool {
        self.major == other.major
    }

    /// The next major version: `(major + 1, 0)`.
    #[must_use]
    pub const fn bump_major(&self) -> Version {
        Version {
            major: self.major + 1,
            minor: 0,
        }
    }

    /// The next minor version: `(major, minor + 1)`.
    #[must_use]
    pub const fn bump_minor(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor + 1,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((major, minor)) = s.split_once('.') else {
            return Err(VersionError::Invalid {
                input: s.to_string(),
                reason: "expected '<major>.<minor>'",
            });
        };
        Ok(Self {
            major: parse_slot(major, s)?,
            minor: parse_slot(minor, s)?,
        })
    }
}

fn parse_slot(slot: &str, input: &str) -> Result<u32, VersionError> {
    if slot.is_empty() || !slot.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::Invalid {
            input: input.to_string(),
            reason: "slots must be non-negative integers",
        });
    }
    slot.parse().map_err(|_| VersionError::Invalid {
        input: input.to_string(),
        reason: "slot out of range",
    })
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Version::new(1, 0) < Version::new(1, 1));
        assert!(Version::new(1, 9) < Version::new(2, 0));
        assert!(Version::new(2, 0) < Version::new(10, 0));
        assert_eq!(Version::new(3, 4), Version::new(3, 4));
    }

    #[test]
    fn compatibility_is_major_equality() {
        assert!(Version::new(1, 0).is_compatible_with(&Version::new(1, 9)));
        assert!(!Version::new(1, 9).is_compatible_with(&Version::new(2, 0)));
    }

    #[test]
    fn bumps() {
        assert_eq!(Version::new(1, 4).bump_minor(), Version::new(1, 5));
        assert_eq!(Version::new(1, 4).bump_major(), Version::new(2, 0));
    }

    #[test]
    fn parse_and_display_round_trip() {
        let v: Version = "3.14".parse().unwrap();
        assert_eq!(v, Version::new(3, 14));
        assert_eq!(v.to_string(), "3.14");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("1".parse::<Version>().is_err());
        assert!("1.2.3".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!("-1.0".parse::<Version>().is_err());
        assert!("+1.0".parse::<Version>().is_err());
        assert!("1.".parse::<Version>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Version::new(2, 1)).unwrap();
        assert_eq!(json, "\"2.1\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Version::new(2, 1));
    }
}

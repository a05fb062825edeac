// crates/flowctl-graph/src/semver.rs
// ============================================================================
// Module: Package Semantic Version
// Description: A minimal major.minor.patch triple with total ordering.
// Purpose: Let the install engine's version guard compare a package's
// declared version against the latest installed one.
// Dependencies: serde
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A `major.minor.patch` version triple.
///
/// # Invariants
/// - Ordering is lexicographic on `(major, minor, patch)`, matching semver's
///   precedence rules for release versions (no pre-release/build metadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl PackageVersion {
    /// Builds a version from its three components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parses a `major.minor.patch` string.
    ///
    /// # Errors
    ///
    /// Returns [`PackageVersionError`] when the string is not exactly three
    /// dot-separated non-negative integers.
    pub fn parse(raw: &str) -> Result<Self, PackageVersionError> {
        let parts: Vec<&str> = raw.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(PackageVersionError(raw.to_string()));
        };
        let parse_component = |s: &str| s.parse::<u32>().map_err(|_| PackageVersionError(raw.to_string()));
        Ok(Self {
            major: parse_component(major)?,
            minor: parse_component(minor)?,
            patch: parse_component(patch)?,
        })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

/// A version string that did not parse as `major.minor.patch`.
#[derive(Debug, thiserror::Error)]
#[error("invalid package version: {0}")]
pub struct PackageVersionError(String);

#[cfg(test)]
mod tests {
    use super::PackageVersion;

    #[test]
    fn parses_a_valid_triple() {
        let v = PackageVersion::parse("1.5.0").unwrap_or_else(|_| panic!("should parse"));
        assert_eq!(v, PackageVersion::new(1, 5, 0));
    }

    #[test]
    fn orders_by_major_then_minor_then_patch() {
        let lower = PackageVersion::new(1, 5, 0);
        let higher = PackageVersion::new(2, 0, 0);
        assert!(lower < higher);
        assert!(PackageVersion::new(1, 4, 9) < PackageVersion::new(1, 5, 0));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(PackageVersion::parse("1.5").is_err());
        assert!(PackageVersion::parse("1.5.x").is_err());
    }
}

//! Version values and the grammar registry
//!
//! A [`Version`] is one value within an ecosystem's version space, tagged with
//! the ecosystem that produced it. Ordering is only defined within one
//! ecosystem; comparing across ecosystems yields `None` rather than a silent
//! misordering.

use std::cmp::Ordering;
use std::str::FromStr;

use pep508_rs::pep440_rs;

use crate::matcher::ecosystem::{Ecosystem, Grammar};
use crate::matcher::error::MatchError;
use crate::matcher::versions::go::GoVersion;
use crate::matcher::versions::maven::MavenVersion;
use crate::matcher::versions::nuget::NuGetVersion;

/// One parsed version, tagged with its ecosystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    ecosystem: Ecosystem,
    key: VersionKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum VersionKey {
    Semver(semver::Version),
    Pep440(pep440_rs::Version),
    Maven(MavenVersion),
    Go(GoVersion),
    NuGet(NuGetVersion),
}

impl Version {
    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }
}

impl PartialOrd for Version {
    /// `None` when the two versions belong to different ecosystems
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.ecosystem != other.ecosystem {
            return None;
        }

        match (&self.key, &other.key) {
            (VersionKey::Semver(a), VersionKey::Semver(b)) => Some(a.cmp(b)),
            (VersionKey::Pep440(a), VersionKey::Pep440(b)) => Some(a.cmp(b)),
            (VersionKey::Maven(a), VersionKey::Maven(b)) => Some(a.cmp(b)),
            (VersionKey::Go(a), VersionKey::Go(b)) => Some(a.cmp(b)),
            (VersionKey::NuGet(a), VersionKey::NuGet(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Parses version strings under the grammar registered for an ecosystem
pub struct VersionFactory;

impl VersionFactory {
    /// Parse `spec` under the grammar of the named ecosystem.
    ///
    /// The name is matched case-insensitively against the registry; both feed
    /// names ("crates.io") and purl types ("cargo") resolve.
    pub fn parse(ecosystem: &str, spec: &str) -> Result<Version, MatchError> {
        Self::for_ecosystem(Ecosystem::resolve(ecosystem)?, spec)
    }

    /// Parse `spec` for an already-resolved ecosystem
    pub fn for_ecosystem(ecosystem: Ecosystem, spec: &str) -> Result<Version, MatchError> {
        let invalid = || MatchError::InvalidVersion {
            ecosystem: ecosystem.to_string(),
            spec: spec.to_string(),
        };

        let key = match ecosystem.grammar() {
            Grammar::Semver => parse_semver(spec).map(VersionKey::Semver).ok_or_else(invalid)?,
            Grammar::Pep440 => pep440_rs::Version::from_str(spec)
                .map(VersionKey::Pep440)
                .map_err(|_| invalid())?,
            Grammar::Maven => MavenVersion::parse(spec).map(VersionKey::Maven).ok_or_else(invalid)?,
            Grammar::Go => GoVersion::parse(spec).map(VersionKey::Go).ok_or_else(invalid)?,
            Grammar::NuGet => NuGetVersion::parse(spec)
                .map(VersionKey::NuGet)
                .ok_or_else(invalid)?,
        };

        Ok(Version { ecosystem, key })
    }
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub(crate) fn parse_semver(version: &str) -> Option<semver::Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    semver::Version::parse(&normalized).ok()
}

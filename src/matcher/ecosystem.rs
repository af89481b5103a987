//! The closed registry of ecosystems with version grammars
//!
//! Advisory feeds and purls name the same ecosystems differently ("crates.io"
//! vs `cargo`, "Go" vs `golang`); both vocabularies resolve here. Adding an
//! ecosystem means adding one variant and its registry entries, never touching
//! call sites.

use crate::matcher::error::MatchError;

/// A package registry's versioning domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    CratesIo,
    PyPi,
    Maven,
    Go,
    NuGet,
}

/// Which version grammar an ecosystem's versions follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Semantic versioning; shared by npm and crates.io
    Semver,
    /// PEP 440
    Pep440,
    /// Maven's ComparableVersion ordering
    Maven,
    /// Go module versions, including pseudo-versions
    Go,
    /// NuGet versions: four-part numeric core plus SemVer pre-release rules
    NuGet,
}

impl Ecosystem {
    /// Resolve an ecosystem name or purl type, case-insensitively.
    ///
    /// Accepts both the OSV feed vocabulary ("crates.io", "PyPI", "Go") and
    /// the purl type vocabulary ("cargo", "pypi", "golang").
    pub fn resolve(name: &str) -> Result<Self, MatchError> {
        match name.to_ascii_lowercase().as_str() {
            "npm" => Ok(Ecosystem::Npm),
            "cargo" | "crates.io" => Ok(Ecosystem::CratesIo),
            "pypi" => Ok(Ecosystem::PyPi),
            "maven" => Ok(Ecosystem::Maven),
            "go" | "golang" => Ok(Ecosystem::Go),
            "nuget" => Ok(Ecosystem::NuGet),
            _ => Err(MatchError::UnsupportedEcosystem(name.to_string())),
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::CratesIo => "crates.io",
            Ecosystem::PyPi => "pypi",
            Ecosystem::Maven => "maven",
            Ecosystem::Go => "go",
            Ecosystem::NuGet => "nuget",
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Ecosystem::Npm | Ecosystem::CratesIo => Grammar::Semver,
            Ecosystem::PyPi => Grammar::Pep440,
            Ecosystem::Maven => Grammar::Maven,
            Ecosystem::Go => Grammar::Go,
            Ecosystem::NuGet => Grammar::NuGet,
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

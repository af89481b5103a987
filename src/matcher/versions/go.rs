//! Go module version grammar
//!
//! Go modules use semver with module-system suffixes:
//! - Standard semver: v1.2.3
//! - +incompatible suffix: v2.0.0+incompatible (pre-go.mod v2+ modules)
//! - Pseudo-versions: v0.0.0-20210101000000-abcdef123456

use std::cmp::Ordering;

use crate::matcher::version::parse_semver;

/// One Go module version.
///
/// Pseudo-versions keep their timestamp; at equal base versions the timestamp
/// decides, and a pseudo-version sorts after the bare base it cuts from.
/// Commit hashes never participate in ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoVersion {
    base: semver::Version,
    pseudo_timestamp: Option<String>,
}

impl GoVersion {
    pub fn parse(spec: &str) -> Option<Self> {
        let normalized = normalize(spec);

        if let Some((base, rest)) = normalized.split_once('-') {
            // Pseudo-version: base-YYYYMMDDHHMMSS-commit
            let parts: Vec<&str> = rest.split('-').collect();
            if parts.len() >= 2
                && parts[0].len() == 14
                && parts[0].chars().all(|c| c.is_ascii_digit())
            {
                return Some(GoVersion {
                    base: parse_semver(base)?,
                    pseudo_timestamp: Some(parts[0].to_string()),
                });
            }

            // Regular pre-release version
            return Some(GoVersion {
                base: semver::Version::parse(&normalized).ok()?,
                pseudo_timestamp: None,
            });
        }

        Some(GoVersion {
            base: parse_semver(&normalized)?,
            pseudo_timestamp: None,
        })
    }
}

impl Ord for GoVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base
            .cmp(&other.base)
            .then_with(|| match (&self.pseudo_timestamp, &other.pseudo_timestamp) {
                (Some(a), Some(b)) => a.cmp(b),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl PartialOrd for GoVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Normalize a Go module version for parsing.
///
/// Handles:
/// - v prefix: v1.2.3 -> 1.2.3
/// - +incompatible suffix: v2.0.0+incompatible -> 2.0.0
fn normalize(version: &str) -> String {
    let version = version.strip_prefix('v').unwrap_or(version);
    let version = version.strip_suffix("+incompatible").unwrap_or(version);
    version.to_string()
}

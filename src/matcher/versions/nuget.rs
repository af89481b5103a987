//! NuGet version grammar
//!
//! NuGet versions are SemVer with two amendments: the numeric core may have a
//! fourth (revision) part, and pre-release labels compare case-insensitively.
//! Build metadata is ignored for ordering.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NuGetVersion {
    release: [u64; 4],
    prerelease: Vec<PreIdent>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PreIdent {
    // Numeric identifiers sort below alphanumeric ones, as in SemVer;
    // the variant order here encodes that
    Numeric(u64),
    Alpha(String),
}

impl NuGetVersion {
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        // Build metadata is insignificant
        let spec = spec.split_once('+').map_or(spec, |(v, _)| v);

        let (core, pre) = match spec.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (spec, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return None;
        }
        let mut release = [0u64; 4];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            release[i] = part.parse().ok()?;
        }

        let prerelease = match pre {
            Some(pre) => {
                if pre.is_empty() {
                    return None;
                }
                pre.split('.')
                    .map(|ident| {
                        if ident.is_empty() {
                            return None;
                        }
                        if ident.chars().all(|c| c.is_ascii_digit()) {
                            ident.parse().ok().map(PreIdent::Numeric)
                        } else {
                            Some(PreIdent::Alpha(ident.to_ascii_lowercase()))
                        }
                    })
                    .collect::<Option<Vec<_>>>()?
            }
            None => Vec::new(),
        };

        Some(NuGetVersion { release, prerelease })
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release.cmp(&other.release).then_with(|| {
            match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                (true, true) => Ordering::Equal,
                // A release outranks any of its pre-releases
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.prerelease.cmp(&other.prerelease),
            }
        })
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cmp(left: &str, right: &str) -> Ordering {
        NuGetVersion::parse(left)
            .unwrap()
            .cmp(&NuGetVersion::parse(right).unwrap())
    }

    #[rstest]
    #[case("1.0", "1.0.0", Ordering::Equal)]
    #[case("1.0.0", "1.0.0.0", Ordering::Equal)]
    #[case("2.0.0", "2.88.6", Ordering::Less)]
    #[case("13.2.9", "13.3.0", Ordering::Less)]
    #[case("1.0.0.1", "1.0.0", Ordering::Greater)]
    #[case("1.0.0.1", "1.0.0.2", Ordering::Less)]
    fn numeric_core_ordering(#[case] left: &str, #[case] right: &str, #[case] expected: Ordering) {
        assert_eq!(cmp(left, right), expected);
    }

    #[rstest]
    #[case("1.0.0-alpha", "1.0.0", Ordering::Less)]
    #[case("1.0.0-alpha", "1.0.0-beta", Ordering::Less)]
    #[case("1.0.0-alpha.1", "1.0.0-alpha.2", Ordering::Less)]
    #[case("1.0.0-alpha.1", "1.0.0-alpha.beta", Ordering::Less)]
    #[case("1.0.0-ALPHA", "1.0.0-alpha", Ordering::Equal)]
    #[case("2.88.6-preview.1", "2.88.6", Ordering::Less)]
    fn prerelease_ordering(#[case] left: &str, #[case] right: &str, #[case] expected: Ordering) {
        assert_eq!(cmp(left, right), expected);
    }

    #[test]
    fn build_metadata_is_ignored() {
        assert_eq!(cmp("1.0.0+build1", "1.0.0+build2"), Ordering::Equal);
    }

    #[rstest]
    #[case("one.two")]
    #[case("1.2.3.4.5")]
    #[case("1..2")]
    #[case("1.0.0-")]
    #[case("")]
    fn parse_rejects_malformed_versions(#[case] spec: &str) {
        assert!(NuGetVersion::parse(spec).is_none());
    }
}

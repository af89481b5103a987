//! purl affectedness matching

use std::str::FromStr;

use packageurl::PackageUrl;
use tracing::warn;

use crate::matcher::ecosystem::Ecosystem;
use crate::matcher::error::MatchError;
use crate::matcher::range::VersionRangeFactory;
use crate::matcher::version::{Version, VersionFactory};
use crate::model::osv::{Advisory, AffectedPackage, RangeType};

pub struct PurlMatcher;

impl PurlMatcher {
    /// Decide whether `purl` is affected by `advisory`.
    ///
    /// A purl without a version is never affected: no comparison is possible,
    /// and that is an answer, not an error. A subject version that does not
    /// parse under its own ecosystem grammar is caller misuse and propagates;
    /// malformed data inside the stored advisory only skips the range it
    /// appears in. GIT ranges are skipped, never failed.
    pub fn is_affected(purl: &PackageUrl<'_>, advisory: &Advisory) -> Result<bool, MatchError> {
        let Some(subject) = purl.version() else {
            return Ok(false);
        };

        let mut parsed: Option<Version> = None;

        for affected in advisory.affected.iter().filter(|a| package_matches(purl, a)) {
            if affected.versions.iter().any(|v| v == subject) {
                return Ok(true);
            }

            for descriptor in &affected.ranges {
                if descriptor.kind == RangeType::Git {
                    continue;
                }

                let ecosystem = Ecosystem::resolve(purl.ty())?;
                let range = match VersionRangeFactory::resolve_in(ecosystem, descriptor) {
                    Ok(range) => range,
                    Err(err) => {
                        warn!(advisory = %advisory.id, %err, "skipping unresolvable range");
                        continue;
                    }
                };

                if parsed.is_none() {
                    parsed = Some(VersionFactory::for_ecosystem(ecosystem, subject)?);
                }
                if let Some(version) = &parsed
                    && range.contains(version)
                {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// Does this affected-package entry name the same package as `purl`?
///
/// Identity is (type, namespace, name); version, qualifiers and subpath never
/// participate. When the record carries its own purl that purl decides;
/// otherwise the feed's ecosystem/name pair is compared.
pub(crate) fn package_matches(purl: &PackageUrl<'_>, affected: &AffectedPackage) -> bool {
    let Some(package) = &affected.package else {
        return false;
    };

    if let Some(raw) = &package.purl {
        return match PackageUrl::from_str(raw) {
            Ok(candidate) => same_identity(purl, &candidate),
            Err(err) => {
                warn!(purl = %raw, %err, "skipping affected package with malformed purl");
                false
            }
        };
    }

    let (Ok(theirs), Ok(ours)) = (
        Ecosystem::resolve(&package.ecosystem),
        Ecosystem::resolve(purl.ty()),
    ) else {
        return false;
    };

    theirs == ours && package.name == qualified_name(purl)
}

pub(crate) fn same_identity(a: &PackageUrl<'_>, b: &PackageUrl<'_>) -> bool {
    a.ty().eq_ignore_ascii_case(b.ty()) && a.namespace() == b.namespace() && a.name() == b.name()
}

/// The purl's name as an advisory feed states it: namespace-qualified when a
/// namespace is present (`github.com/chai2010` + `webp` -> `github.com/chai2010/webp`).
pub(crate) fn qualified_name(purl: &PackageUrl<'_>) -> String {
    match purl.namespace() {
        Some(namespace) => format!("{}/{}", namespace, purl.name()),
        None => purl.name().to_string(),
    }
}

/// The version-stripped identity purl: type, namespace and name only.
///
/// This is the canonical form the purl index stores and the views group by.
pub fn identity(purl: &PackageUrl<'_>) -> Option<PackageUrl<'static>> {
    let mut stripped =
        PackageUrl::new(purl.ty().to_string(), purl.name().to_string()).ok()?;
    if let Some(namespace) = purl.namespace() {
        stripped.with_namespace(namespace.to_string());
    }
    Some(stripped)
}

//! Vulnerabilities affecting one purl

use std::str::FromStr;

use packageurl::PackageUrl;
use tracing::warn;

use crate::db::store::AdvisoryStore;
use crate::matcher::ecosystem::Ecosystem;
use crate::matcher::purl::{identity, package_matches};
use crate::matcher::range::VersionRangeFactory;
use crate::model::osv::RangeType;
use crate::view::ViewError;

/// One advisory affecting the queried purl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurlVulnerability {
    /// The advisory's own id, never an alias
    pub id: String,
    pub aliases: Vec<String>,
    /// The raw enumerated affected-version list
    pub affected_versions: Vec<String>,
    /// One human-readable constraint per resolved interval
    pub affected_version_ranges: Vec<String>,
}

/// Every advisory indexed for the purl's identity (type + namespace + name;
/// any version in the query is ignored).
///
/// A purl that matches nothing yields an empty list: unlike an unknown
/// advisory id, an unindexed package is an ordinary answer. A malformed purl
/// string fails.
pub fn by_purl<S: AdvisoryStore>(
    store: &S,
    purl_str: &str,
) -> Result<Vec<PurlVulnerability>, ViewError> {
    let purl = PackageUrl::from_str(purl_str)?;
    let Some(stripped) = identity(&purl) else {
        return Ok(Vec::new());
    };

    let advisories = store.find_by_purl(&stripped.to_string())?;

    let mut summaries = Vec::with_capacity(advisories.len());
    for advisory in &advisories {
        let mut affected_versions = Vec::new();
        let mut affected_version_ranges = Vec::new();

        for affected in advisory.affected.iter().filter(|a| package_matches(&purl, a)) {
            affected_versions.extend(affected.versions.iter().cloned());

            let ecosystem = match Ecosystem::resolve(purl.ty()) {
                Ok(ecosystem) => ecosystem,
                Err(err) => {
                    warn!(advisory = %advisory.id, %err, "cannot render ranges");
                    continue;
                }
            };

            for range in affected.ranges.iter().filter(|r| r.kind != RangeType::Git) {
                match VersionRangeFactory::resolve_in(ecosystem, range) {
                    Ok(resolved) => affected_version_ranges.extend(resolved.to_human()),
                    Err(err) => {
                        warn!(advisory = %advisory.id, %err, "skipping unresolvable range");
                    }
                }
            }
        }

        summaries.push(PurlVulnerability {
            id: advisory.id.clone(),
            aliases: advisory.aliases.clone(),
            affected_versions,
            affected_version_ranges,
        });
    }

    summaries.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(summaries)
}

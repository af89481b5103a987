//! Affected packages for an advisory id or alias

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use packageurl::PackageUrl;
use tracing::warn;

use crate::db::store::AdvisoryStore;
use crate::matcher::ecosystem::Ecosystem;
use crate::matcher::purl::identity;
use crate::matcher::range::VersionRangeFactory;
use crate::model::osv::RangeType;
use crate::view::ViewError;

/// One affected package, aggregated across every advisory matching the query
#[derive(Debug, Clone, PartialEq)]
pub struct AffectedPurl {
    /// Version-stripped identity purl
    pub purl: PackageUrl<'static>,
    /// The contributing advisories' ids and aliases
    pub ids: BTreeSet<String>,
    /// `vers:` specifiers from resolved ranges plus literal enumerated versions
    pub versions: BTreeSet<String>,
}

/// Affected packages for every advisory whose id or alias set matches `key`.
///
/// Packages group by identity purl (type + namespace + name); each interval of
/// each resolved range contributes one `vers:` specifier, enumerated versions
/// carry over verbatim, and identical specifiers from different advisories
/// collapse. Fails with the store's not-found error when nothing matches.
pub fn by_id<S: AdvisoryStore>(store: &S, key: &str) -> Result<Vec<AffectedPurl>, ViewError> {
    let advisories = store.find_by_id_or_alias(key)?;

    let mut groups: BTreeMap<String, AffectedPurl> = BTreeMap::new();

    for advisory in &advisories {
        for affected in &advisory.affected {
            let Some(raw) = affected.package.as_ref().and_then(|p| p.purl.as_deref()) else {
                continue;
            };
            let Some(stripped) = PackageUrl::from_str(raw).ok().and_then(|p| identity(&p)) else {
                warn!(advisory = %advisory.id, purl = %raw, "skipping malformed purl");
                continue;
            };

            let entry = groups
                .entry(stripped.to_string())
                .or_insert_with(|| AffectedPurl {
                    purl: stripped,
                    ids: BTreeSet::new(),
                    versions: BTreeSet::new(),
                });

            entry.ids.insert(advisory.id.clone());
            entry.ids.extend(advisory.aliases.iter().cloned());
            entry.versions.extend(affected.versions.iter().cloned());

            let ecosystem = match Ecosystem::resolve(entry.purl.ty()) {
                Ok(ecosystem) => ecosystem,
                Err(err) => {
                    warn!(advisory = %advisory.id, %err, "cannot render ranges");
                    continue;
                }
            };

            for range in affected.ranges.iter().filter(|r| r.kind != RangeType::Git) {
                match VersionRangeFactory::resolve_in(ecosystem, range) {
                    Ok(resolved) => {
                        entry.versions.extend(resolved.to_vers(entry.purl.ty()));
                    }
                    Err(err) => {
                        warn!(advisory = %advisory.id, %err, "skipping unresolvable range");
                    }
                }
            }
        }
    }

    Ok(groups.into_values().collect())
}

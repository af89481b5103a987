//! The storage seam the engine consumes

#[cfg(test)]
use mockall::automock;

use crate::db::error::StoreError;
use crate::model::osv::Advisory;

/// The two lookups the views and matcher are built on.
///
/// `find_by_id_or_alias` signals not-found; `find_by_purl` answers with an
/// empty list. The asymmetry is deliberate: an unknown identifier is caller
/// error, an unindexed package is an ordinary answer.
#[cfg_attr(test, automock)]
pub trait AdvisoryStore: Send + Sync {
    /// Every advisory whose id equals `key` or whose alias set contains it
    fn find_by_id_or_alias(&self, key: &str) -> Result<Vec<Advisory>, StoreError>;

    /// Every advisory indexed under the version-stripped identity purl
    fn find_by_purl(&self, identity: &str) -> Result<Vec<Advisory>, StoreError>;
}

//! User-facing aggregation queries over the advisory store
//!
//! - [`affected_purls`]: advisory id or alias -> affected packages with
//!   rendered `vers:` specifiers
//! - [`purl_vulnerabilities`]: purl -> advisories with human-readable
//!   affected ranges

pub mod affected_purls;
pub mod purl_vulnerabilities;

use thiserror::Error;

use crate::db::error::StoreError;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Invalid purl: {0}")]
    InvalidPurl(#[from] packageurl::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

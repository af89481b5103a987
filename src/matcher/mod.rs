//! Version-range resolution and purl affectedness matching
//!
//! The core engine: pure, synchronous functions over immutable advisory data.
//! Versions and ranges are parsed per call and discarded; nothing here does
//! I/O or holds state across calls.
//!
//! - [`ecosystem`]: the closed registry of ecosystems with version grammars
//! - [`version`]: `Version` values and the per-ecosystem parsers
//! - [`versions`]: grammars without an ecosystem crate (Maven, NuGet, Go)
//! - [`range`]: resolved intervals, containment, and the two renderers
//! - [`purl`]: the affectedness decision for one purl against one advisory
//! - [`error`]: the engine error taxonomy

pub mod ecosystem;
pub mod error;
pub mod purl;
pub mod range;
pub mod version;
pub mod versions;

pub use ecosystem::Ecosystem;
pub use error::MatchError;
pub use purl::PurlMatcher;
pub use range::{VersionRange, VersionRangeFactory};
pub use version::{Version, VersionFactory};

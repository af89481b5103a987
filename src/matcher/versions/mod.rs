//! Ecosystem-specific version grammars
//!
//! Semver and PEP 440 come from their crates; the grammars without an
//! ecosystem crate live here.

pub mod go;
pub mod maven;
pub mod nuget;

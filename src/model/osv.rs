//! OSV-shaped advisory records
//!
//! The subset of the OSV schema this system stores and queries. Records are
//! persisted as JSON and materialized through these types; fields the store
//! does not consume are carried through untouched so a stored record
//! round-trips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One vulnerability advisory as published by an OSV feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    /// Native identifier of the advisory (e.g. `GHSA-j7hp-h8jx-5ppr`)
    pub id: String,
    /// Equivalent identifiers from other databases (e.g. the CVE id)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected: Vec<AffectedPackage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub severity: Vec<Severity>,
}

/// One package the advisory affects, with the grounds for affectedness.
///
/// Either `versions` (enumerated exact versions) or `ranges` (interval
/// descriptors) establishes affectedness; the two are alternatives, not
/// qualifiers of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<Package>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<Range>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
}

/// Package identity as the feed states it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub ecosystem: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
}

/// An affected-version interval descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "type")]
    pub kind: RangeType,
    /// Ordered boundary markers; order is significant and encodes
    /// interleaved interval boundaries
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RangeType {
    Semver,
    Ecosystem,
    /// Commit-identifier ranges; never resolvable against version grammars
    Git,
}

/// One boundary marker within a range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// Opens an interval at this version
    Introduced(String),
    /// Closes the open interval, exclusive of this version
    Fixed(String),
    /// Closes the open interval, inclusive of this version
    LastAffected(String),
    /// Closes the open interval, exclusive; a feed-side scan horizon
    Limit(String),
}

impl Event {
    /// The version literal the event carries
    pub fn version(&self) -> &str {
        match self {
            Event::Introduced(v) | Event::Fixed(v) | Event::LastAffected(v) | Event::Limit(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Severity {
    #[serde(rename = "type")]
    pub kind: String,
    pub score: String,
}

//! Resolved version ranges and the range factory
//!
//! A [`VersionRange`] is the resolved form of an advisory's event list: a set
//! of bounded or unbounded intervals over one ecosystem's version space. It is
//! rebuilt for every query and never persisted.

use packageurl::PackageUrl;

use crate::matcher::ecosystem::Ecosystem;
use crate::matcher::error::MatchError;
use crate::matcher::version::{Version, VersionFactory};
use crate::model::osv::{Event, Range, RangeType};

/// Resolved affected-version intervals for one ecosystem
#[derive(Debug, Clone)]
pub struct VersionRange {
    ecosystem: Ecosystem,
    intervals: Vec<Interval>,
}

#[derive(Debug, Clone)]
pub struct Interval {
    lower: Option<Lower>,
    upper: Option<Upper>,
}

/// Lower bound, always inclusive.
///
/// `explicit` distinguishes a stated introduction point from the feed's
/// conventional minimum (no `introduced` event, or `introduced("0")`); only
/// explicit bounds are rendered.
#[derive(Debug, Clone)]
struct Lower {
    version: Version,
    raw: String,
    explicit: bool,
}

#[derive(Debug, Clone)]
struct Upper {
    version: Version,
    raw: String,
    inclusive: bool,
}

impl VersionRange {
    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    /// True iff the version falls within any interval.
    ///
    /// A version from a different ecosystem is never contained.
    pub fn contains(&self, version: &Version) -> bool {
        self.intervals.iter().any(|interval| interval.contains(version))
    }

    /// Render each interval as a `vers:<type>/<constraints>` specifier.
    ///
    /// One specifier per interval; intervals are never merged. `ty` is the
    /// purl type the specifier is scoped to.
    pub fn to_vers(&self, ty: &str) -> Vec<String> {
        self.intervals
            .iter()
            .map(|interval| {
                let mut tokens = Vec::new();
                if let Some(lower) = interval.lower.as_ref().filter(|l| l.explicit) {
                    tokens.push(format!(">={}", lower.raw));
                }
                if let Some(upper) = &interval.upper {
                    let op = if upper.inclusive { "<=" } else { "<" };
                    tokens.push(format!("{}{}", op, upper.raw));
                }
                if tokens.is_empty() {
                    // No stated bounds at all: every version
                    tokens.push("*".to_string());
                }
                format!("vers:{}/{}", ty, tokens.join("|"))
            })
            .collect()
    }

    /// Render each interval as a human-readable constraint string.
    pub fn to_human(&self) -> Vec<String> {
        self.intervals
            .iter()
            .map(|interval| {
                let lower = interval.lower.as_ref().filter(|l| l.explicit);
                match (lower, &interval.upper) {
                    (Some(lower), Some(upper)) => {
                        let op = if upper.inclusive { "<=" } else { "<" };
                        format!(">= {} and {} {}", lower.raw, op, upper.raw)
                    }
                    (None, Some(upper)) => {
                        let op = if upper.inclusive { "<=" } else { "<" };
                        format!("{} {}", op, upper.raw)
                    }
                    (Some(lower), None) => format!(">= {}", lower.raw),
                    (None, None) => "all versions".to_string(),
                }
            })
            .collect()
    }
}

impl Interval {
    fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            match version.partial_cmp(&lower.version) {
                Some(ordering) if ordering.is_ge() => {}
                _ => return false,
            }
        }
        if let Some(upper) = &self.upper {
            match version.partial_cmp(&upper.version) {
                Some(ordering) if upper.inclusive && ordering.is_le() => {}
                Some(ordering) if !upper.inclusive && ordering.is_lt() => {}
                _ => return false,
            }
        }
        true
    }
}

/// Resolves advisory range descriptors against an ecosystem's version grammar
pub struct VersionRangeFactory;

impl VersionRangeFactory {
    /// Resolve a range for the ecosystem named by the purl's type.
    pub fn resolve(purl: &PackageUrl<'_>, range: &Range) -> Result<VersionRange, MatchError> {
        Self::resolve_in(Ecosystem::resolve(purl.ty())?, range)
    }

    /// Resolve a range for an already-resolved ecosystem.
    ///
    /// Walks the events in feed order: `introduced` opens an interval (closing
    /// any still-open one as unbounded above), `fixed`/`limit` close it
    /// exclusive, `last_affected` closes it inclusive. A close with no open
    /// interval closes the implicit minimum-rooted interval, except `limit`,
    /// which requires one.
    pub fn resolve_in(ecosystem: Ecosystem, range: &Range) -> Result<VersionRange, MatchError> {
        if range.kind == RangeType::Git {
            return Err(MatchError::UnsupportedRangeType(
                "GIT ranges carry commit identifiers, not versions".to_string(),
            ));
        }

        let mut intervals = Vec::new();
        let mut open: Option<Lower> = None;

        for event in &range.events {
            match event {
                Event::Introduced(raw) => {
                    // Malformed data can open intervals back to back; close
                    // the dangling one as unbounded above
                    if let Some(lower) = open.take() {
                        intervals.push(Interval {
                            lower: Some(lower),
                            upper: None,
                        });
                    }
                    open = Some(Lower {
                        version: VersionFactory::for_ecosystem(ecosystem, raw)?,
                        raw: raw.clone(),
                        explicit: raw != "0",
                    });
                }
                Event::Fixed(raw) | Event::LastAffected(raw) | Event::Limit(raw) => {
                    if matches!(event, Event::Limit(_)) && open.is_none() {
                        return Err(MatchError::UnsupportedRangeType(
                            "limit event with no open interval".to_string(),
                        ));
                    }
                    let upper = Upper {
                        version: VersionFactory::for_ecosystem(ecosystem, raw)?,
                        raw: raw.clone(),
                        inclusive: matches!(event, Event::LastAffected(_)),
                    };
                    intervals.push(Interval {
                        lower: open.take(),
                        upper: Some(upper),
                    });
                }
            }
        }

        if let Some(lower) = open.take() {
            intervals.push(Interval {
                lower: Some(lower),
                upper: None,
            });
        }

        Ok(VersionRange { ecosystem, intervals })
    }
}

//! Maven version grammar
//!
//! A port of Maven's ComparableVersion ordering: versions tokenize into
//! numeric and qualifier items, `-` opens a nested sublist, digit/letter
//! transitions act as `-`, and trailing "null" items (zero, empty qualifier,
//! ga/final/release) are trimmed before comparison. Known qualifiers order
//! alpha < beta < milestone < rc < snapshot < release < sp; unknown
//! qualifiers sort after all known ones, lexically.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenVersion {
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Int(u128),
    Qualifier(String),
    List(Vec<Item>),
}

impl MavenVersion {
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() || spec.chars().any(|c| c.is_whitespace()) {
            return None;
        }

        Some(MavenVersion {
            items: parse_items(&spec.to_ascii_lowercase()),
        })
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_lists(&self.items, &other.items)
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_items(version: &str) -> Vec<Item> {
    // `current` is the innermost open list; a `-` (or a digit/letter
    // transition) opens a new sublist, which always ends up as the last
    // element of its parent.
    let mut parents: Vec<Vec<Item>> = Vec::new();
    let mut current: Vec<Item> = Vec::new();
    let mut buf = String::new();
    let mut is_digit = false;

    for c in version.chars() {
        match c {
            '.' => {
                let item = take_item(&mut buf, is_digit, false);
                current.push(item);
            }
            '-' => {
                let item = take_item(&mut buf, is_digit, false);
                current.push(item);
                parents.push(std::mem::take(&mut current));
            }
            c if c.is_ascii_digit() => {
                if !is_digit && !buf.is_empty() {
                    // letter -> digit transition: "beta3" reads as "beta-3"
                    let item = take_item(&mut buf, false, true);
                    current.push(item);
                    parents.push(std::mem::take(&mut current));
                }
                is_digit = true;
                buf.push(c);
            }
            c => {
                if is_digit && !buf.is_empty() {
                    // digit -> letter transition: "1rc" reads as "1-rc"
                    let item = take_item(&mut buf, true, false);
                    current.push(item);
                    parents.push(std::mem::take(&mut current));
                }
                is_digit = false;
                buf.push(c);
            }
        }
    }
    if !buf.is_empty() {
        let item = take_item(&mut buf, is_digit, false);
        current.push(item);
    }

    // Collapse back to the root, trimming null items from the tail of
    // every list
    while let Some(mut parent) = parents.pop() {
        normalize(&mut current);
        parent.push(Item::List(current));
        current = parent;
    }
    normalize(&mut current);
    current
}

fn take_item(buf: &mut String, is_digit: bool, followed_by_digit: bool) -> Item {
    let raw = std::mem::take(buf);
    if raw.is_empty() {
        return Item::Int(0);
    }
    if is_digit {
        match raw.parse::<u128>() {
            Ok(value) => Item::Int(value),
            Err(_) => Item::Qualifier(raw),
        }
    } else {
        Item::Qualifier(alias_qualifier(raw, followed_by_digit))
    }
}

/// Qualifier shorthands: a1 = alpha-1, b1 = beta-1, m1 = milestone-1,
/// cr = rc, and ga/final/release are the empty (release) qualifier.
fn alias_qualifier(raw: String, followed_by_digit: bool) -> String {
    let expanded = if followed_by_digit && raw.len() == 1 {
        match raw.as_str() {
            "a" => "alpha",
            "b" => "beta",
            "m" => "milestone",
            other => other,
        }
        .to_string()
    } else {
        raw
    };

    match expanded.as_str() {
        "ga" | "final" | "release" => String::new(),
        "cr" => "rc".to_string(),
        _ => expanded,
    }
}

fn is_null(item: &Item) -> bool {
    match item {
        Item::Int(value) => *value == 0,
        Item::Qualifier(q) => q.is_empty(),
        Item::List(items) => items.is_empty(),
    }
}

/// Trim null items from the tail; stop at the first non-null non-list item
fn normalize(items: &mut Vec<Item>) {
    for i in (0..items.len()).rev() {
        if is_null(&items[i]) {
            items.remove(i);
        } else if !matches!(items[i], Item::List(_)) {
            break;
        }
    }
}

/// Rank string for a qualifier: known qualifiers compare by registry position,
/// unknown ones after all known, lexically among themselves.
fn comparable_qualifier(qualifier: &str) -> String {
    const QUALIFIERS: [&str; 7] = ["alpha", "beta", "milestone", "rc", "snapshot", "", "sp"];

    match QUALIFIERS.iter().position(|q| *q == qualifier) {
        Some(index) => index.to_string(),
        None => format!("{}-{}", QUALIFIERS.len(), qualifier),
    }
}

fn cmp_lists(left: &[Item], right: &[Item]) -> Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let ord = cmp_item(left.get(i), right.get(i));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn cmp_item(left: Option<&Item>, right: Option<&Item>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (Some(item), None) => cmp_to_null(item),
        (None, Some(item)) => cmp_to_null(item).reverse(),
        (Some(Item::Int(a)), Some(Item::Int(b))) => a.cmp(b),
        (Some(Item::Int(_)), Some(_)) => Ordering::Greater,
        (Some(_), Some(Item::Int(_))) => Ordering::Less,
        (Some(Item::Qualifier(a)), Some(Item::Qualifier(b))) => {
            comparable_qualifier(a).cmp(&comparable_qualifier(b))
        }
        (Some(Item::Qualifier(_)), Some(Item::List(_))) => Ordering::Less,
        (Some(Item::List(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::List(a)), Some(Item::List(b))) => cmp_lists(a, b),
    }
}

/// How an item compares against the padding beyond the other version's end
fn cmp_to_null(item: &Item) -> Ordering {
    match item {
        Item::Int(0) => Ordering::Equal,
        Item::Int(_) => Ordering::Greater,
        Item::Qualifier(q) => comparable_qualifier(q).cmp(&comparable_qualifier("")),
        Item::List(items) => match items.first() {
            Some(first) => cmp_to_null(first),
            None => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cmp(left: &str, right: &str) -> Ordering {
        MavenVersion::parse(left)
            .unwrap()
            .cmp(&MavenVersion::parse(right).unwrap())
    }

    #[rstest]
    #[case("1.8.3", "2.9.0", Ordering::Less)]
    #[case("1.8.3", "1.8.3", Ordering::Equal)]
    #[case("1.8.3", "1.8.2", Ordering::Greater)]
    #[case("1.8.3", "1.8", Ordering::Greater)]
    #[case("1.8", "1.8.3", Ordering::Less)]
    #[case("1.8", "1.8.0", Ordering::Equal)]
    #[case("1.8-beta3", "1.8-beta4", Ordering::Less)]
    #[case("1.8-beta-3", "1.8-beta-4", Ordering::Less)]
    #[case("1.8-beta4", "1.8-beta3", Ordering::Greater)]
    #[case("1.8-beta3", "1.8", Ordering::Less)]
    #[case("1.8", "1.8-beta-3", Ordering::Greater)]
    #[case("1.8-1", "1.8-3", Ordering::Less)]
    #[case("1.8-1", "1.8.0-3", Ordering::Less)]
    #[case("1.8-3", "1.8.0-1", Ordering::Greater)]
    fn ordering_matches_comparable_version(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(cmp(left, right), expected);
    }

    #[rstest]
    #[case("1.0-alpha-1", "1.0-beta-1", Ordering::Less)]
    #[case("1.0-beta", "1.0-milestone", Ordering::Less)]
    #[case("1.0-milestone", "1.0-rc", Ordering::Less)]
    #[case("1.0-rc", "1.0-snapshot", Ordering::Less)]
    #[case("1.0-snapshot", "1.0", Ordering::Less)]
    #[case("1.0", "1.0-sp", Ordering::Less)]
    #[case("1.0-sp", "1.0-whatever", Ordering::Less)]
    fn qualifier_registry_order(#[case] left: &str, #[case] right: &str, #[case] expected: Ordering) {
        assert_eq!(cmp(left, right), expected);
    }

    #[rstest]
    #[case("1.0-a1", "1.0-alpha-1")]
    #[case("1.0-b2", "1.0-beta-2")]
    #[case("1.0-m3", "1.0-milestone-3")]
    #[case("1.0-cr", "1.0-rc")]
    #[case("1.0-ga", "1.0")]
    #[case("1.0-final", "1.0")]
    #[case("1.0-RELEASE", "1.0")]
    #[case("1.0Alpha1", "1.0-alpha-1")]
    fn qualifier_aliases_are_equivalent(#[case] left: &str, #[case] right: &str) {
        assert_eq!(cmp(left, right), Ordering::Equal);
    }

    #[test]
    fn case_is_insignificant() {
        assert_eq!(cmp("1.0-BETA", "1.0-beta"), Ordering::Equal);
    }

    #[test]
    fn parse_rejects_empty_and_whitespace() {
        assert!(MavenVersion::parse("").is_none());
        assert!(MavenVersion::parse("1.0 final").is_none());
    }
}

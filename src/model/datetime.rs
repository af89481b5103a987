//! NVD feed timestamps
//!
//! The NVD API emits ISO-8601 timestamps without a UTC offset
//! (`2023-09-29T17:15:48.543`); chrono's RFC 3339 deserializer rejects those,
//! so the NVD models spell their handling out. Values are UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub(crate) fn parse(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

pub(crate) mod nvd {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(super::FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid NVD timestamp '{s}'")))
    }
}

pub(crate) mod nvd_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => super::nvd::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => super::parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid NVD timestamp '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2023-09-29T17:15:48.543")]
    #[case("2023-09-29T17:15:48")]
    #[case("2023-09-29T17:15:48.543Z")]
    #[case("2023-09-29T17:15:48+00:00")]
    fn parse_accepts_offset_and_naive_forms(#[case] input: &str) {
        let parsed = parse(input).unwrap();
        assert_eq!(
            parsed.date_naive(),
            Utc.with_ymd_and_hms(2023, 9, 29, 0, 0, 0).unwrap().date_naive()
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("last tuesday").is_none());
    }
}

//! NVD CVE records (API version 2.0)
//!
//! Stored round-trip; the matching engine never consults these. The CPE match
//! expressions inside `configurations` use the NVD's own wildcarded version
//! bounds, which are a different animal from OSV events and stay opaque here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cve {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_identifier: Option<String>,
    #[serde(with = "crate::model::datetime::nvd")]
    pub published: DateTime<Utc>,
    #[serde(with = "crate::model::datetime::nvd")]
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vuln_status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<Description>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weaknesses: Vec<Weakness>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<Configuration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

impl Cve {
    /// The description in the requested language, falling back to the first
    /// one published.
    pub fn description(&self, language: &str) -> Option<&str> {
        self.descriptions
            .iter()
            .find(|d| d.lang == language)
            .or_else(|| self.descriptions.first())
            .map(|d| d.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub lang: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cvss_metric_v31: Vec<CvssMetric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cvss_metric_v30: Vec<CvssMetric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cvss_metric_v2: Vec<CvssMetric>,
}

/// One scored metric entry; the vector-specific payload stays unparsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvssMetric {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cvss_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploitability_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Description>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub negate: bool,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub negate: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpe_match: Vec<CpeMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpeMatch {
    pub vulnerable: bool,
    pub criteria: String,
    pub match_criteria_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_start_including: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_start_excluding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_end_including: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_end_excluding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "id": "CVE-2023-4863",
            "sourceIdentifier": "chrome-cve-admin@google.com",
            "published": "2023-09-12T15:15:24.327Z",
            "lastModified": "2023-09-29T17:15:48.543Z",
            "vulnStatus": "Analyzed",
            "descriptions": [
                { "lang": "en", "value": "Heap buffer overflow in libwebp." },
                { "lang": "es", "value": "Desbordamiento del búfer." }
            ],
            "metrics": {
                "cvssMetricV31": [
                    {
                        "source": "nvd@nist.gov",
                        "type": "Primary",
                        "cvssData": { "baseScore": 8.8 },
                        "exploitabilityScore": 2.8,
                        "impactScore": 5.9
                    }
                ]
            },
            "configurations": [
                {
                    "nodes": [
                        {
                            "operator": "OR",
                            "cpeMatch": [
                                {
                                    "vulnerable": true,
                                    "criteria": "cpe:2.3:a:webmproject:libwebp:*:*:*:*:*:*:*:*",
                                    "matchCriteriaId": "9A78AE9E-2BF2-42F5-92E4-A1E3D6A3D3EB",
                                    "versionEndExcluding": "1.3.2"
                                }
                            ]
                        }
                    ]
                }
            ],
            "references": [
                { "url": "https://crbug.com/1479274", "source": "chrome-cve-admin@google.com" }
            ]
        })
    }

    #[test]
    fn cve_round_trips_through_json() {
        let cve: Cve = serde_json::from_value(sample()).unwrap();
        let text = serde_json::to_string(&cve).unwrap();
        let again: Cve = serde_json::from_str(&text).unwrap();

        assert_eq!(cve, again);
    }

    #[test]
    fn description_prefers_requested_language() {
        let cve: Cve = serde_json::from_value(sample()).unwrap();

        assert_eq!(cve.description("es"), Some("Desbordamiento del búfer."));
        assert_eq!(cve.description("en"), Some("Heap buffer overflow in libwebp."));
        // Unknown language falls back to the first entry
        assert_eq!(cve.description("de"), Some("Heap buffer overflow in libwebp."));
    }

    #[test]
    fn cpe_match_bounds_are_optional() {
        let cve: Cve = serde_json::from_value(sample()).unwrap();
        let cpe_match = &cve.configurations[0].nodes[0].cpe_match[0];

        assert!(cpe_match.vulnerable);
        assert_eq!(cpe_match.version_end_excluding.as_deref(), Some("1.3.2"));
        assert_eq!(cpe_match.version_start_including, None);
    }
}

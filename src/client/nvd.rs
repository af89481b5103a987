//! NVD 2.0 REST API client
//!
//! The feed pages by `startIndex`; incremental pulls narrow the window with
//! `lastModStartDate`/`lastModEndDate`. An API key raises the rate limit but
//! is optional. Every page carries the feed's own timestamp, which the
//! ingestion driver records as its checkpoint.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{ClientError, retrying};
use crate::config::{FETCH_MAX_RETRIES, NvdConfig};
use crate::model::cpe::Cpe;
use crate::model::cve::Cve;

/// Default base URL for the NVD REST API
const DEFAULT_BASE_URL: &str = "https://services.nvd.nist.gov/rest/json";

/// One page of CVE results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvePage {
    pub results_per_page: u64,
    pub start_index: u64,
    pub total_results: u64,
    #[serde(with = "crate::model::datetime::nvd")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub vulnerabilities: Vec<CveEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct CveEnvelope {
    pub cve: Cve,
}

/// One page of CPE results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpePage {
    pub results_per_page: u64,
    pub start_index: u64,
    pub total_results: u64,
    #[serde(with = "crate::model::datetime::nvd")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub products: Vec<CpeEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct CpeEnvelope {
    pub cpe: Cpe,
}

pub struct NvdClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    request_delay: Duration,
    max_retries: u32,
}

impl NvdClient {
    pub fn new(base_url: &str, api_key: Option<String>, request_delay: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("vulndb")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            api_key,
            request_delay,
            max_retries: FETCH_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn from_config(config: &NvdConfig) -> Self {
        Self::new(
            DEFAULT_BASE_URL,
            config.api_key.clone(),
            Duration::from_millis(config.request_delay_ms),
        )
    }

    /// Pause the ingestion driver should take between page requests
    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Fetch one page of CVEs starting at `start_index`, optionally narrowed
    /// to records modified within `window`.
    pub async fn cve_page(
        &self,
        start_index: u64,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<CvePage, ClientError> {
        self.page("cves/2.0", start_index, window).await
    }

    /// Fetch one page of CPE dictionary entries.
    pub async fn cpe_page(
        &self,
        start_index: u64,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<CpePage, ClientError> {
        self.page("cpes/2.0", start_index, window).await
    }

    async fn page<T: DeserializeOwned>(
        &self,
        stem: &str,
        start_index: u64,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.base_url, stem);
        retrying(self.max_retries, || {
            self.fetch_page(&url, start_index, window)
        })
        .await
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
        start_index: u64,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<T, ClientError> {
        debug!(url, start_index, "fetching feed page");

        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(&[("startIndex", start_index.to_string())]);

        if let Some((start, end)) = window {
            request = request.query(&[
                ("lastModStartDate", start.to_rfc3339()),
                ("lastModEndDate", end.to_rfc3339()),
            ]);
        }
        if let Some(api_key) = &self.api_key {
            request = request.header("apiKey", api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::InvalidResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Server;
    use serde_json::json;

    use super::*;

    fn cve_body(start_index: u64, total: u64, ids: &[&str]) -> serde_json::Value {
        json!({
            "resultsPerPage": ids.len(),
            "startIndex": start_index,
            "totalResults": total,
            "format": "NVD_CVE",
            "version": "2.0",
            "timestamp": "2023-09-29T17:20:33.120",
            "vulnerabilities": ids.iter().map(|id| json!({
                "cve": {
                    "id": id,
                    "published": "2023-09-12T15:15:24.327",
                    "lastModified": "2023-09-29T17:15:48.543",
                    "vulnStatus": "Analyzed"
                }
            })).collect::<Vec<_>>()
        })
    }

    #[tokio::test]
    async fn cve_page_parses_feed_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cves/2.0")
            .match_query(mockito::Matcher::UrlEncoded(
                "startIndex".into(),
                "0".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(cve_body(0, 2, &["CVE-2023-4863"]).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = NvdClient::new(&server.url(), None, Duration::ZERO);
        let page = client.cve_page(0, None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.total_results, 2);
        assert_eq!(page.vulnerabilities.len(), 1);
        assert_eq!(page.vulnerabilities[0].cve.id, "CVE-2023-4863");
    }

    #[tokio::test]
    async fn cve_page_sends_window_and_api_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cves/2.0")
            .match_header("apiKey", "secret")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("startIndex".into(), "100".into()),
                mockito::Matcher::Regex("lastModStartDate=2023".into()),
                mockito::Matcher::Regex("lastModEndDate=2023".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(cve_body(100, 101, &[]).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = NvdClient::new(&server.url(), Some("secret".to_string()), Duration::ZERO);
        let start = "2023-01-01T00:00:00Z".parse().unwrap();
        let end = "2023-09-29T00:00:00Z".parse().unwrap();
        let page = client.cve_page(100, Some((start, end))).await.unwrap();

        mock.assert_async().await;
        assert!(page.vulnerabilities.is_empty());
    }

    #[tokio::test]
    async fn server_error_surfaces_after_retries_are_exhausted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cves/2.0")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let client = NvdClient::new(&server.url(), None, Duration::ZERO).with_max_retries(2);
        let err = client.cve_page(0, None).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ClientError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn cpe_page_parses_products() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/cpes/2.0")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "resultsPerPage": 1,
                    "startIndex": 0,
                    "totalResults": 1,
                    "format": "NVD_CPE",
                    "version": "2.0",
                    "timestamp": "2023-09-29T17:20:33.120",
                    "products": [{
                        "cpe": {
                            "cpeName": "cpe:2.3:a:webmproject:libwebp:1.3.1:*:*:*:*:*:*:*",
                            "cpeNameId": "87316812-5F2C-4286-94FE-CC98B9EAEF53",
                            "lastModified": "2023-09-14T15:22:00.613",
                            "created": "2023-09-14T15:20:01.000",
                            "deprecated": false
                        }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = NvdClient::new(&server.url(), None, Duration::ZERO);
        let page = client.cpe_page(0, None).await.unwrap();

        assert_eq!(page.products.len(), 1);
        assert_eq!(
            page.products[0].cpe.cpe_name_id,
            "87316812-5F2C-4286-94FE-CC98B9EAEF53"
        );
    }
}

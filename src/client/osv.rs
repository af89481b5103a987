//! OSV API client
//!
//! Bulk OSV data arrives as per-ecosystem dump files ingested from disk; this
//! client covers the point lookups the API serves directly.

use crate::client::{ClientError, retrying};
use crate::config::FETCH_MAX_RETRIES;
use crate::model::osv::Advisory;

/// Default base URL for the OSV API
const DEFAULT_BASE_URL: &str = "https://api.osv.dev";

pub struct OsvClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OsvClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("vulndb")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            max_retries: FETCH_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fetch one advisory by its native id; `None` when the feed has no such
    /// record.
    pub async fn vuln(&self, id: &str) -> Result<Option<Advisory>, ClientError> {
        let url = format!("{}/v1/vulns/{}", self.base_url, id);

        let result = retrying(self.max_retries, || self.fetch_vuln(&url, id)).await;
        match result {
            Ok(advisory) => Ok(Some(advisory)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn fetch_vuln(&self, url: &str, id: &str) -> Result<Advisory, ClientError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Advisory>()
            .await
            .map_err(|err| ClientError::InvalidResponse(err.to_string()))
    }
}

impl Default for OsvClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

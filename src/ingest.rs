//! Ingestion drivers
//!
//! Pulls feed records into the store. The NVD drivers page through the REST
//! API as a cursor: the offset advances per page, and the first page's feed
//! timestamp becomes the checkpoint once the run completes, so an interrupted
//! run is simply re-run. OSV bulk data is ingested from dump files on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::client::ClientError;
use crate::client::nvd::NvdClient;
use crate::client::osv::OsvClient;
use crate::db::error::StoreError;
use crate::db::Database;
use crate::model::osv::Advisory;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Pull CVE records from the NVD feed into the store.
///
/// With `update`, only records modified since the last recorded checkpoint
/// are pulled. Returns the number of records upserted.
pub async fn cves(db: &Database, client: &NvdClient, update: bool) -> Result<u64, IngestError> {
    let window = feed_window(db, "cve", update)?;

    let mut offset: u64 = 0;
    let mut first_ts: Option<DateTime<Utc>> = None;
    let mut total: u64 = 0;

    loop {
        let page = client.cve_page(offset, window).await?;
        if first_ts.is_none() {
            first_ts = Some(page.timestamp);
        }
        if page.vulnerabilities.is_empty() {
            break;
        }

        for envelope in &page.vulnerabilities {
            db.upsert_cve(&envelope.cve)?;
        }
        total += page.vulnerabilities.len() as u64;
        offset += page.vulnerabilities.len() as u64;

        info!("Ingested {}/{} CVE records", offset, page.total_results);
        if offset >= page.total_results {
            break;
        }
        tokio::time::sleep(client.request_delay()).await;
    }

    if let Some(ts) = first_ts {
        db.upsert_checkpoint("cve", &ts)?;
    }
    Ok(total)
}

/// Pull CPE dictionary entries from the NVD feed into the store.
pub async fn cpes(db: &Database, client: &NvdClient, update: bool) -> Result<u64, IngestError> {
    let window = feed_window(db, "cpe", update)?;

    let mut offset: u64 = 0;
    let mut first_ts: Option<DateTime<Utc>> = None;
    let mut total: u64 = 0;

    loop {
        let page = client.cpe_page(offset, window).await?;
        if first_ts.is_none() {
            first_ts = Some(page.timestamp);
        }
        if page.products.is_empty() {
            break;
        }

        for envelope in &page.products {
            db.upsert_cpe(&envelope.cpe)?;
        }
        total += page.products.len() as u64;
        offset += page.products.len() as u64;

        info!("Ingested {}/{} CPE records", offset, page.total_results);
        if offset >= page.total_results {
            break;
        }
        tokio::time::sleep(client.request_delay()).await;
    }

    if let Some(ts) = first_ts {
        db.upsert_checkpoint("cpe", &ts)?;
    }
    Ok(total)
}

/// Ingest every OSV JSON dump file in a directory under one ecosystem.
///
/// Files that do not parse as advisories are skipped with a warning; one bad
/// record in a dump should not abort the rest of it.
pub fn osv_dir(db: &Database, ecosystem: &str, dir: &Path) -> Result<u64, IngestError> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut total: u64 = 0;
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(|source| IngestError::Io {
            path: path.clone(),
            source,
        })?;

        match serde_json::from_str::<Advisory>(&content) {
            Ok(advisory) => {
                db.upsert_advisory(ecosystem, &advisory)?;
                total += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unparsable advisory file");
            }
        }
    }

    info!("Ingested {} {} advisories from {:?}", total, ecosystem, dir);
    Ok(total)
}

/// Fetch individual advisories by id and upsert them.
pub async fn osv_ids(
    db: &Database,
    client: &OsvClient,
    ecosystem: &str,
    ids: &[String],
) -> Result<u64, IngestError> {
    let mut total: u64 = 0;
    for id in ids {
        match client.vuln(id).await? {
            Some(advisory) => {
                db.upsert_advisory(ecosystem, &advisory)?;
                total += 1;
            }
            None => warn!(%id, "advisory not present in feed"),
        }
    }
    Ok(total)
}

fn feed_window(
    db: &Database,
    source: &str,
    update: bool,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
    if !update {
        return Ok(None);
    }
    Ok(db.checkpoint(source)?.map(|since| (since, Utc::now())))
}

#[cfg(test)]
mod tests {
    use mockito::Server;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    use super::*;
    use crate::db::AdvisoryStore;

    fn open_db(temp_dir: &TempDir) -> Database {
        Database::open(&temp_dir.path().join("test.db")).unwrap()
    }

    fn cve_page_body(start: u64, total: u64, ids: &[&str]) -> String {
        json!({
            "resultsPerPage": ids.len(),
            "startIndex": start,
            "totalResults": total,
            "format": "NVD_CVE",
            "version": "2.0",
            "timestamp": "2023-09-29T17:20:33.120",
            "vulnerabilities": ids.iter().map(|id| json!({
                "cve": {
                    "id": id,
                    "published": "2023-09-12T15:15:24.327",
                    "lastModified": "2023-09-29T17:15:48.543"
                }
            })).collect::<Vec<_>>()
        })
        .to_string()
    }

    #[tokio::test]
    async fn cves_pages_through_feed_and_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/cves/2.0")
            .match_query(mockito::Matcher::UrlEncoded(
                "startIndex".into(),
                "0".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(cve_page_body(0, 2, &["CVE-2023-0001"]))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/cves/2.0")
            .match_query(mockito::Matcher::UrlEncoded(
                "startIndex".into(),
                "1".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(cve_page_body(1, 2, &["CVE-2023-0002"]))
            .expect(1)
            .create_async()
            .await;

        let client = NvdClient::new(&server.url(), None, Duration::ZERO);
        let total = cves(&db, &client, false).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;

        assert_eq!(total, 2);
        assert_eq!(db.cve_count().unwrap(), 2);
        assert!(db.cve_by_id("CVE-2023-0002").is_ok());

        // Checkpoint records the first page's feed timestamp
        let checkpoint = db.checkpoint("cve").unwrap().unwrap();
        assert_eq!(
            checkpoint,
            crate::model::datetime::parse("2023-09-29T17:20:33.120").unwrap()
        );
    }

    #[tokio::test]
    async fn cves_update_narrows_window_from_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let since = "2023-01-01T00:00:00Z".parse().unwrap();
        db.upsert_checkpoint("cve", &since).unwrap();

        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cves/2.0")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("startIndex".into(), "0".into()),
                mockito::Matcher::Regex("lastModStartDate=2023-01-01".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(cve_page_body(0, 0, &[]))
            .expect(1)
            .create_async()
            .await;

        let client = NvdClient::new(&server.url(), None, Duration::ZERO);
        let total = cves(&db, &client, true).await.unwrap();

        mock.assert_async().await;
        assert_eq!(total, 0);
    }

    #[test]
    fn osv_dir_ingests_dump_files_and_skips_bad_ones() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let dump_dir = TempDir::new().unwrap();
        std::fs::write(
            dump_dir.path().join("GHSA-aaaa.json"),
            json!({
                "id": "GHSA-aaaa",
                "aliases": ["CVE-2023-0001"],
                "modified": "2023-09-29T17:20:33Z",
                "affected": [{
                    "package": {
                        "ecosystem": "npm",
                        "name": "electron",
                        "purl": "pkg:npm/electron"
                    }
                }]
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(dump_dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dump_dir.path().join("README.md"), "ignored").unwrap();

        let total = osv_dir(&db, "npm", dump_dir.path()).unwrap();

        assert_eq!(total, 1);
        assert_eq!(db.advisory_count("npm").unwrap(), 1);
        assert_eq!(db.find_by_purl("pkg:npm/electron").unwrap().len(), 1);
    }

    #[test]
    fn osv_dir_fails_on_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            osv_dir(&db, "npm", &missing),
            Err(IngestError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn osv_ids_fetches_and_upserts() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/vulns/GHSA-aaaa")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "GHSA-aaaa",
                    "modified": "2023-09-29T17:20:33Z"
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/v1/vulns/GHSA-gone")
            .with_status(404)
            .create_async()
            .await;

        let client = OsvClient::new(&server.url());
        let total = osv_ids(
            &db,
            &client,
            "npm",
            &["GHSA-aaaa".to_string(), "GHSA-gone".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(total, 1);
        assert!(db.find_by_id_or_alias("GHSA-aaaa").is_ok());
    }
}

//! NVD CVE/CPE record storage
//!
//! Both record kinds are stored round-trip as JSON keyed by their native
//! identifier; nothing downstream queries inside them yet.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::error::StoreError;
use crate::db::{Database, from_timestamp_ms, timestamp_ms};
use crate::model::cpe::Cpe;
use crate::model::cve::Cve;

impl Database {
    pub fn upsert_cve(&self, cve: &Cve) -> Result<(), StoreError> {
        let data = serde_json::to_string(cve)?;
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT INTO cve (id, last_modified, data)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id)
            DO UPDATE SET last_modified = excluded.last_modified, data = excluded.data
            "#,
            (&cve.id, timestamp_ms(&cve.last_modified), &data),
        )?;

        debug!("Upserted {}", cve.id);
        Ok(())
    }

    pub fn cve_by_id(&self, id: &str) -> Result<Cve, StoreError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row("SELECT data FROM cve WHERE id = ?1", [id], |row| {
            row.get::<_, String>(0)
        });

        match result {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(StoreError::RecordNotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn cve_count(&self) -> Result<u64, StoreError> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM cve", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn cve_last_modified(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT last_modified FROM cve ORDER BY last_modified DESC LIMIT 1",
            [],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(ms) => Ok(from_timestamp_ms(ms)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn upsert_cpe(&self, cpe: &Cpe) -> Result<(), StoreError> {
        let data = serde_json::to_string(cpe)?;
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT INTO cpe (id, last_modified, data)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id)
            DO UPDATE SET last_modified = excluded.last_modified, data = excluded.data
            "#,
            (&cpe.cpe_name_id, timestamp_ms(&cpe.last_modified), &data),
        )?;

        debug!("Upserted CPE {}", cpe.cpe_name_id);
        Ok(())
    }

    pub fn cpe_by_name_id(&self, id: &str) -> Result<Cpe, StoreError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row("SELECT data FROM cpe WHERE id = ?1", [id], |row| {
            row.get::<_, String>(0)
        });

        match result {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(StoreError::RecordNotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn cpe_count(&self) -> Result<u64, StoreError> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM cpe", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;

    fn cve(id: &str, year: i32) -> Cve {
        Cve {
            id: id.to_string(),
            source_identifier: None,
            published: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
            last_modified: Utc.with_ymd_and_hms(year, 6, 1, 0, 0, 0).unwrap(),
            vuln_status: Some("Analyzed".to_string()),
            descriptions: vec![],
            metrics: None,
            weaknesses: vec![],
            configurations: vec![],
            references: vec![],
        }
    }

    fn cpe(id: &str) -> Cpe {
        Cpe {
            cpe_name: "cpe:2.3:a:webmproject:libwebp:1.3.1:*:*:*:*:*:*:*".to_string(),
            cpe_name_id: id.to_string(),
            last_modified: Utc.with_ymd_and_hms(2023, 9, 14, 15, 22, 0).unwrap(),
            created: None,
            deprecated: false,
            titles: vec![],
            refs: vec![],
            deprecated_by: vec![],
            deprecates: vec![],
        }
    }

    fn open_db(temp_dir: &TempDir) -> Database {
        Database::open(&temp_dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn cve_round_trips_through_store() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let stored = cve("CVE-2023-4863", 2023);
        db.upsert_cve(&stored).unwrap();

        assert_eq!(db.cve_by_id("CVE-2023-4863").unwrap(), stored);
        assert_eq!(db.cve_count().unwrap(), 1);
    }

    #[test]
    fn cve_by_id_signals_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        assert!(matches!(
            db.cve_by_id("CVE-1979-4242"),
            Err(StoreError::RecordNotFound(_))
        ));
    }

    #[test]
    fn cve_upsert_overwrites_existing_row() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        db.upsert_cve(&cve("CVE-2023-4863", 2023)).unwrap();
        let mut updated = cve("CVE-2023-4863", 2023);
        updated.vuln_status = Some("Modified".to_string());
        db.upsert_cve(&updated).unwrap();

        assert_eq!(db.cve_count().unwrap(), 1);
        assert_eq!(
            db.cve_by_id("CVE-2023-4863").unwrap().vuln_status.as_deref(),
            Some("Modified")
        );
    }

    #[test]
    fn cve_last_modified_returns_newest() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        assert_eq!(db.cve_last_modified().unwrap(), None);

        db.upsert_cve(&cve("CVE-2022-0001", 2022)).unwrap();
        db.upsert_cve(&cve("CVE-2023-0001", 2023)).unwrap();

        assert_eq!(
            db.cve_last_modified().unwrap(),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn cpe_round_trips_through_store() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);

        let stored = cpe("87316812-5F2C-4286-94FE-CC98B9EAEF53");
        db.upsert_cpe(&stored).unwrap();

        assert_eq!(
            db.cpe_by_name_id("87316812-5F2C-4286-94FE-CC98B9EAEF53")
                .unwrap(),
            stored
        );
        assert_eq!(db.cpe_count().unwrap(), 1);
        assert!(matches!(
            db.cpe_by_name_id("no-such-id"),
            Err(StoreError::RecordNotFound(_))
        ));
    }
}

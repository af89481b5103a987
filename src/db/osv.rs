//! OSV advisory storage
//!
//! Advisories are stored as JSON rows keyed by (ecosystem, id), with two side
//! tables maintained on every upsert: `aliases` for id-or-alias lookup, and
//! `purl_osv` mapping each affected package's version-stripped identity purl
//! to the advisory.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use packageurl::PackageUrl;
use tracing::{debug, warn};

use crate::db::error::StoreError;
use crate::db::store::AdvisoryStore;
use crate::db::{Database, from_timestamp_ms, timestamp_ms};
use crate::matcher::purl::identity;
use crate::model::osv::Advisory;

impl Database {
    /// Insert or update one advisory and its lookup rows
    pub fn upsert_advisory(&self, ecosystem: &str, advisory: &Advisory) -> Result<(), StoreError> {
        let data = serde_json::to_string(advisory)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO osv (ecosystem, id, last_modified, data)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(ecosystem, id)
            DO UPDATE SET last_modified = excluded.last_modified, data = excluded.data
            "#,
            (
                ecosystem,
                &advisory.id,
                timestamp_ms(&advisory.modified),
                &data,
            ),
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO aliases (id, alias) VALUES (?1, ?2)")?;
            for alias in &advisory.aliases {
                stmt.execute((&advisory.id, alias))?;
            }
        }

        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO purl_osv (purl, osv_id) VALUES (?1, ?2)")?;
            for raw in advisory
                .affected
                .iter()
                .filter_map(|a| a.package.as_ref())
                .filter_map(|p| p.purl.as_deref())
            {
                match PackageUrl::from_str(raw).ok().and_then(|p| identity(&p)) {
                    Some(stripped) => {
                        stmt.execute((stripped.to_string(), &advisory.id))?;
                    }
                    None => {
                        warn!(advisory = %advisory.id, purl = %raw, "not indexing malformed purl");
                    }
                }
            }
        }

        tx.commit()?;

        debug!("Upserted advisory {}/{}", ecosystem, advisory.id);
        Ok(())
    }

    pub fn delete_advisory(&self, ecosystem: &str, id: &str) -> Result<(), StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM osv WHERE ecosystem = ?1 AND id = ?2",
            (ecosystem, id),
        )?;
        if removed == 0 {
            return Err(StoreError::RecordNotFound(id.to_string()));
        }
        tx.execute("DELETE FROM aliases WHERE id = ?1", [id])?;
        tx.execute("DELETE FROM purl_osv WHERE osv_id = ?1", [id])?;

        tx.commit()?;
        Ok(())
    }

    /// Distinct ecosystems with at least one stored advisory
    pub fn advisory_ecosystems(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT ecosystem FROM osv ORDER BY ecosystem")?;
        let ecosystems = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ecosystems)
    }

    pub fn advisory_count(&self, ecosystem: &str) -> Result<u64, StoreError> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM osv WHERE ecosystem = ?1",
            [ecosystem],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn advisory_count_all(&self) -> Result<u64, StoreError> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM osv", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Most recent `modified` timestamp across stored advisories
    pub fn advisory_last_modified(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT last_modified FROM osv ORDER BY last_modified DESC LIMIT 1",
            [],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(ms) => Ok(from_timestamp_ms(ms)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn materialize(&self, data: &str) -> Result<Advisory, StoreError> {
        Ok(serde_json::from_str(data)?)
    }
}

impl AdvisoryStore for Database {
    fn find_by_id_or_alias(&self, key: &str) -> Result<Vec<Advisory>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT osv.id, osv.data
                FROM osv LEFT JOIN aliases a ON osv.id = a.id
                WHERE osv.id = ?1 OR a.alias = ?1
            "#,
        )?;

        let rows = stmt
            .query_map([key], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<String>, _>>()?;
        drop(stmt);
        drop(conn);

        if rows.is_empty() {
            return Err(StoreError::RecordNotFound(key.to_string()));
        }

        rows.iter().map(|data| self.materialize(data)).collect()
    }

    fn find_by_purl(&self, identity: &str) -> Result<Vec<Advisory>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT osv.id, osv.data
                FROM purl_osv pv JOIN osv ON osv.id = pv.osv_id
                WHERE pv.purl = ?1
            "#,
        )?;

        let rows = stmt
            .query_map([identity], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<String>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.iter().map(|data| self.materialize(data)).collect()
    }
}

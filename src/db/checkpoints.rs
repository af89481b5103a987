//! Ingestion checkpoints
//!
//! One row per feed source recording the feed timestamp of the last completed
//! ingestion run; incremental updates resume from here.

use chrono::{DateTime, Utc};

use crate::db::error::StoreError;
use crate::db::{Database, from_timestamp_ms, timestamp_ms};

impl Database {
    pub fn upsert_checkpoint(
        &self,
        source: &str,
        last_updated: &DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO checkpoints (source, last_updated)
            VALUES (?1, ?2)
            ON CONFLICT(source) DO UPDATE SET last_updated = excluded.last_updated
            "#,
            (source, timestamp_ms(last_updated)),
        )?;
        Ok(())
    }

    pub fn checkpoint(&self, source: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT last_updated FROM checkpoints WHERE source = ?1",
            [source],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(ms) => Ok(from_timestamp_ms(ms)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn delete_checkpoint(&self, source: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM checkpoints WHERE source = ?1", [source])?;
        Ok(())
    }
}

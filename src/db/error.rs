use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("No records found for id/alias {0}")]
    RecordNotFound(String),

    #[error("Stored record does not deserialize: {0}")]
    InvalidData(#[from] serde_json::Error),
}

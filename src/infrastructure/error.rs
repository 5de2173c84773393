use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error type for `pulse-store-sqlite`.

use pulse_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid bookmark: {0}")]
  InvalidBookmark(String),

  /// Only JSON objects can be stored as documents.
  #[error("document {0} is not a JSON object")]
  NotAnObject(String),
}

impl StoreError for Error {
  /// A busy or locked database is SQLite's way of shedding load.
  fn is_rate_limited(&self) -> bool {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked),
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

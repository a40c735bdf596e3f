//! Error types for `pulse-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Rejected before any storage call; never retried.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// The storage collaborator failed, either immediately or after the
  /// rate-limit retries were exhausted.
  #[error("storage unavailable: {0}")]
  ServiceUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("malformed document: {0}")]
  Decode(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn unavailable<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::ServiceUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

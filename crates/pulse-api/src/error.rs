//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("service unavailable: {0}")]
  Unavailable(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<pulse_core::Error> for ApiError {
  fn from(e: pulse_core::Error) -> Self {
    use pulse_core::Error as E;
    match e {
      E::InvalidArgument(m) => Self::BadRequest(m),
      E::NotFound(m) => Self::NotFound(m),
      e @ E::ServiceUnavailable(_) => Self::Unavailable(e.to_string()),
      e @ E::Decode(_) => Self::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::Unavailable(m) => {
        tracing::error!(error = %m, "store unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, m)
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, m)
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

//! Handler for `GET /jobs/filters/{field}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use pulse_core::{JobService, filters::FilterValues, store::DocumentStore};
use serde::Deserialize;

use crate::{error::ApiError, jobs::parse_count};

#[derive(Debug, Deserialize)]
pub struct ValuesParams {
  /// Narrow the values; locations get state alias expansion.
  pub q:     Option<String>,
  pub limit: Option<String>,
}

/// `GET /jobs/filters/{locations|categories|levels}[?q=...][&limit=...]`
pub async fn values<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Path(field): Path<String>,
  Query(params): Query<ValuesParams>,
) -> Result<Json<FilterValues>, ApiError> {
  let limit = parse_count("limit", params.limit.as_deref())?;
  Ok(Json(
    service
      .filter_values(&field, params.q.as_deref(), limit)
      .await?,
  ))
}

//! Handlers for `/jobs` search and lookup.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/jobs/search` | Filters plus `limit` (1-100, default 25) and `skip` |
//! | `GET`  | `/jobs/{id}` | 404 if missing or not a posting |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use pulse_core::{
  JobService, posting::JobDetail, search::SearchPage, store::DocumentStore,
};
use serde::Deserialize;

use crate::{error::ApiError, params::FilterParams};

// ─── Search ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(flatten)]
  pub filters: FilterParams,
  pub limit:   Option<String>,
  pub skip:    Option<String>,
}

/// `GET /jobs/search[?title=...][&location=...][&source=...][&limit=...][&skip=...]`
pub async fn search<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, ApiError> {
  let limit = parse_count("limit", params.limit.as_deref())?;
  let skip = parse_count("skip", params.skip.as_deref())?;
  let filters = params.filters.into_filters()?;
  Ok(Json(service.search(&filters, limit, skip).await?))
}

/// Parse an optional non-negative integer parameter.
pub fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<usize>, ApiError> {
  raw
    .map(|s| {
      s.trim().parse::<usize>().map_err(|_| {
        ApiError::BadRequest(format!("{name} must be a non-negative integer, got {s:?}"))
      })
    })
    .transpose()
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// `GET /jobs/{id}`
pub async fn get_one<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Path(id): Path<String>,
) -> Result<Json<JobDetail>, ApiError> {
  Ok(Json(service.get_by_id(&id).await?))
}

//! Handlers for the skill endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/jobs/match-skills` | `skills` is comma-separated, at most 25 |
//! | `GET`  | `/jobs/trending-skills` | Search filters plus `limit` (1-100, default 20) |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pulse_core::{
  JobService, skills::SkillMatches, store::DocumentStore, trending::TrendingSkills,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  jobs::parse_count,
  params::{FilterParams, parse_source, split_list},
};

// ─── Matching ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchParams {
  pub skills: Option<String>,
  pub source: Option<String>,
  pub limit:  Option<String>,
}

/// `GET /jobs/match-skills?skills=python,rust[&source=...][&limit=...]`
pub async fn match_skills<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(params): Query<MatchParams>,
) -> Result<Json<SkillMatches>, ApiError> {
  let skills = split_list(params.skills.as_deref());
  let source = parse_source(params.source.as_deref())?;
  let limit = parse_count("limit", params.limit.as_deref())?;
  Ok(Json(service.match_skills(&skills, source, limit).await?))
}

// ─── Trending ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
  #[serde(flatten)]
  pub filters: FilterParams,
  pub limit:   Option<String>,
}

/// `GET /jobs/trending-skills[?<filters>][&limit=...]`
pub async fn trending<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(params): Query<TrendingParams>,
) -> Result<Json<TrendingSkills>, ApiError> {
  let limit = parse_count("limit", params.limit.as_deref())?;
  let filters = params.filters.into_filters()?;
  Ok(Json(service.trending(&filters, limit).await?))
}

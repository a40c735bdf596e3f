//! Handlers for the salary benchmark endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/salaries/by-location` | `job_title`, optional `location` |
//! | `GET`  | `/salaries/by-experience` | `job_title`, optional `years_of_experience` and `location` |
//! | `GET`  | `/salaries/by-company` | `job_title`, optional `company` |
//! | `GET`  | `/salaries/compare` | `job_title`, repeated `locations` and/or `companies` |
//!
//! A missing `job_title` is a 400 with the usual JSON error body.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pulse_core::{JobService, salaries::SalaryResponse, store::DocumentStore};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LocationParams {
  pub job_title: Option<String>,
  pub location:  Option<String>,
}

/// `GET /salaries/by-location?job_title=...[&location=...]`
pub async fn by_location<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(params): Query<LocationParams>,
) -> Result<Json<SalaryResponse>, ApiError> {
  let job_title = params.job_title.unwrap_or_default();
  let response = service
    .salaries_by_location(&job_title, params.location.as_deref())
    .await?;
  Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ExperienceParams {
  pub job_title:           Option<String>,
  pub years_of_experience: Option<String>,
  pub location:            Option<String>,
}

/// `GET /salaries/by-experience?job_title=...[&years_of_experience=...][&location=...]`
pub async fn by_experience<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(params): Query<ExperienceParams>,
) -> Result<Json<SalaryResponse>, ApiError> {
  let job_title = params.job_title.unwrap_or_default();
  let response = service
    .salaries_by_experience(
      &job_title,
      params.years_of_experience.as_deref(),
      params.location.as_deref(),
    )
    .await?;
  Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct CompanyParams {
  pub job_title: Option<String>,
  pub company:   Option<String>,
}

/// `GET /salaries/by-company?job_title=...[&company=...]`
pub async fn by_company<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(params): Query<CompanyParams>,
) -> Result<Json<SalaryResponse>, ApiError> {
  let job_title = params.job_title.unwrap_or_default();
  let response = service
    .salaries_by_company(&job_title, params.company.as_deref())
    .await?;
  Ok(Json(response))
}

/// `GET /salaries/compare?job_title=...&locations=A&locations=B&companies=C`
///
/// The lists are repeated keys, so the query string is taken as raw pairs.
/// Blank entries are dropped; names are otherwise matched exactly.
pub async fn compare<S: DocumentStore>(
  State(service): State<Arc<JobService<S>>>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SalaryResponse>, ApiError> {
  let mut job_title = String::new();
  let mut locations = Vec::new();
  let mut companies = Vec::new();
  for (key, value) in pairs {
    let list = match key.as_str() {
      "job_title" => {
        job_title = value;
        continue;
      }
      "locations" => &mut locations,
      "companies" => &mut companies,
      _ => continue,
    };
    let value = value.trim();
    if !value.is_empty() {
      list.push(value.to_owned());
    }
  }
  let response = service
    .compare_salaries(&job_title, &locations, &companies)
    .await?;
  Ok(Json(response))
}

//! JSON REST API for Market Pulse.
//!
//! Exposes an axum [`Router`] backed by a [`JobService`] over any
//! [`DocumentStore`]. Auth, TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(pulse_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod filters;
pub mod jobs;
pub mod params;
pub mod salaries;
pub mod skills;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use pulse_core::{JobService, store::DocumentStore};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<JobService<S>>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Jobs
    .route("/jobs/search", get(jobs::search::<S>))
    .route("/jobs/{id}", get(jobs::get_one::<S>))
    // Filter discovery
    .route("/jobs/filters/{field}", get(filters::values::<S>))
    // Skills
    .route("/jobs/match-skills", get(skills::match_skills::<S>))
    .route("/jobs/trending-skills", get(skills::trending::<S>))
    // Salaries
    .route("/salaries/by-location", get(salaries::by_location::<S>))
    .route("/salaries/by-experience", get(salaries::by_experience::<S>))
    .route("/salaries/by-company", get(salaries::by_company::<S>))
    .route("/salaries/compare", get(salaries::compare::<S>))
    .with_state(service)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

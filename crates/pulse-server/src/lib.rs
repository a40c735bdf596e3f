//! Market Pulse server: configuration loading, the HTTP application and the
//! ingestion commands behind the `pulse-server` binary.

pub mod config;
pub mod ingest;

use std::sync::Arc;

use axum::Router;
use pulse_core::{JobService, store::DocumentStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;

/// The API router with request tracing and a permissive CORS policy: any
/// origin, method and header, credentials allowed.
pub fn app<S>(service: Arc<JobService<S>>) -> Router
where
  S: DocumentStore + 'static,
{
  pulse_api::api_router(service)
    .layer(CorsLayer::very_permissive())
    .layer(TraceLayer::new_for_http())
}

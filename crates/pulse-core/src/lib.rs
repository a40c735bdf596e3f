//! Core types and query logic for the Market Pulse job store.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! is reached only through the [`store::DocumentStore`] trait; the concrete
//! backend lives in `pulse-store-sqlite`.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alias;
pub mod company;
pub mod config;
pub mod error;
pub mod filters;
pub mod posting;
pub mod query;
pub mod role;
pub mod salaries;
pub mod scan;
pub mod search;
pub mod selector;
pub mod service;
pub mod skills;
pub mod store;
pub mod trending;

#[cfg(test)]
pub(crate) mod testing;

pub use config::QueryConfig;
pub use error::{Error, Result};
pub use service::JobService;

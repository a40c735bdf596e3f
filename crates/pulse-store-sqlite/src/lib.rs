//! SQLite backend for the Market Pulse document store.
//!
//! Documents are kept as JSON text keyed by document id. Selectors are
//! translated to SQL over SQLite's JSON functions, with a `regexp` scalar
//! function registered on every connection. All database access goes through
//! [`tokio_rusqlite`] so it never blocks the async runtime.

mod functions;
mod schema;
mod sql;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

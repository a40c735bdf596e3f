//! The `DocumentStore` trait and supporting request types.
//!
//! The trait is implemented by storage backends (e.g. `pulse-store-sqlite`).
//! The query layer depends on this abstraction only. Reads are the whole
//! contract here; writes belong to ingestion and live behind
//! [`DocumentWriter`].

use std::future::Future;

use serde_json::Value;

use crate::selector::Selector;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failure classification a backend exposes to the retry policy.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the backend is shedding load and the call may succeed if
  /// retried later.
  fn is_rate_limited(&self) -> bool;
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`DocumentStore::find`].
#[derive(Debug, Clone)]
pub struct FindRequest {
  pub selector: Selector,
  /// Top-level keys to return; `None` returns whole documents. `_id` is
  /// always included.
  pub fields:   Option<Vec<String>>,
  pub limit:    usize,
  pub skip:     usize,
  /// Opaque continuation token from a previous [`FindPage`].
  pub bookmark: Option<String>,
}

impl FindRequest {
  pub fn new(selector: Selector, limit: usize) -> Self {
    Self { selector, fields: None, limit, skip: 0, bookmark: None }
  }

  pub fn with_fields<'a>(mut self, fields: impl IntoIterator<Item = &'a str>) -> Self {
    self.fields = Some(fields.into_iter().map(str::to_owned).collect());
    self
  }

  pub fn with_skip(mut self, skip: usize) -> Self {
    self.skip = skip;
    self
  }
}

/// One page of results in the store's native order.
#[derive(Debug, Clone, Default)]
pub struct FindPage {
  pub docs:     Vec<Value>,
  /// Continuation token; `None` once the result set is exhausted.
  pub bookmark: Option<String>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Read access to a schemaless JSON document store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: StoreError;

  /// Return the page of documents matching `request.selector`.
  fn find<'a>(
    &'a self,
    request: &'a FindRequest,
  ) -> impl Future<Output = Result<FindPage, Self::Error>> + Send + 'a;

  /// Point lookup by document key. A missing document is `Ok(None)`.
  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;
}

/// Whole-document writes, used by ingestion.
pub trait DocumentWriter: DocumentStore {
  /// Store `doc` under `id`, replacing any previous document wholesale.
  fn put<'a>(
    &'a self,
    id: &'a str,
    doc: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

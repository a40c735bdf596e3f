//! In-memory `DocumentStore` fake for unit tests.

use std::{
  collections::BTreeMap,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::{
  posting::{JOB_POST_TYPE, PostingKey, Source},
  store::{DocumentStore, FindPage, FindRequest, StoreError},
};

#[derive(Debug, Error)]
pub enum FakeError {
  #[error("rate limited")]
  RateLimited,
  #[error("backend exploded")]
  Fatal,
}

impl StoreError for FakeError {
  fn is_rate_limited(&self) -> bool { matches!(self, Self::RateLimited) }
}

enum Injected {
  RateLimited,
  Fatal,
}

/// Documents kept in key order, which is the fake's native order.
#[derive(Default)]
pub struct MemoryStore {
  docs:     Mutex<BTreeMap<String, Value>>,
  /// Scripted outcomes for upcoming calls; `None` passes through.
  failures: Mutex<Vec<Option<Injected>>>,
  finds:    AtomicUsize,
  /// When set, each `find` is counted and then waits for a permit.
  gate:     Mutex<Option<Arc<Semaphore>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&self, doc: Value) {
    let id = doc["_id"].as_str().expect("test docs carry _id").to_owned();
    self.docs.lock().insert(id, doc);
  }

  /// The next `n` `find` calls fail with a rate-limit error.
  pub fn rate_limit_next(&self, n: usize) {
    let mut failures = self.failures.lock();
    failures.extend((0..n).map(|_| Some(Injected::RateLimited)));
  }

  /// The next `find` call fails with a non-retryable error.
  pub fn fail_next(&self) { self.failures.lock().push(Some(Injected::Fatal)); }

  /// Let `successes` calls through, then fail one with a non-retryable error.
  pub fn fail_after(&self, successes: usize) {
    let mut failures = self.failures.lock();
    failures.extend((0..successes).map(|_| None));
    failures.push(Some(Injected::Fatal));
  }

  pub fn find_calls(&self) -> usize { self.finds.load(Ordering::SeqCst) }

  /// Hold every later `find` until the returned semaphore hands it a permit.
  /// Documents are read after the permit is taken.
  pub fn gate(&self) -> Arc<Semaphore> {
    let gate = Arc::new(Semaphore::new(0));
    *self.gate.lock() = Some(Arc::clone(&gate));
    gate
  }

  fn take_injected(&self) -> Result<(), FakeError> {
    let mut failures = self.failures.lock();
    if failures.is_empty() {
      return Ok(());
    }
    match failures.remove(0) {
      Some(Injected::RateLimited) => Err(FakeError::RateLimited),
      Some(Injected::Fatal) => Err(FakeError::Fatal),
      None => Ok(()),
    }
  }
}

impl DocumentStore for MemoryStore {
  type Error = FakeError;

  async fn find(&self, request: &FindRequest) -> Result<FindPage, FakeError> {
    self.finds.fetch_add(1, Ordering::SeqCst);
    let gate = self.gate.lock().clone();
    if let Some(gate) = gate {
      gate.acquire().await.expect("gate is never closed").forget();
    }
    self.take_injected()?;

    let docs = self.docs.lock();
    let after = request.bookmark.as_deref();
    let page: Vec<(String, Value)> = docs
      .iter()
      .filter(|(id, _)| after.is_none_or(|b| id.as_str() > b))
      .filter(|(_, doc)| request.selector.matches(doc))
      .skip(request.skip)
      .take(request.limit)
      .map(|(id, doc)| (id.clone(), project(doc, request.fields.as_deref())))
      .collect();

    let bookmark = if page.len() == request.limit {
      page.last().map(|(id, _)| id.clone())
    } else {
      None
    };
    Ok(FindPage { docs: page.into_iter().map(|(_, d)| d).collect(), bookmark })
  }

  async fn get(&self, id: &str) -> Result<Option<Value>, FakeError> {
    self.take_injected()?;
    Ok(self.docs.lock().get(id).cloned())
  }
}

fn project(doc: &Value, fields: Option<&[String]>) -> Value {
  let (Some(fields), Some(obj)) = (fields, doc.as_object()) else {
    return doc.clone();
  };
  let kept: Map<String, Value> = obj
    .iter()
    .filter(|(k, _)| *k == "_id" || fields.iter().any(|f| f == *k))
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect();
  Value::Object(kept)
}

// ─── Document builders ───────────────────────────────────────────────────────

/// A normalized-schema posting (The Muse).
pub fn muse_doc(external_id: &str, title: &str, posted_at: &str) -> Value {
  json!({
    "_id": PostingKey::new(Source::TheMuse, external_id).as_str(),
    "type": JOB_POST_TYPE,
    "source": "themuse",
    "external_id": external_id,
    "title_raw": title,
    "company_name": "Acme",
    "locations": ["New York, NY"],
    "categories": ["Software Engineering"],
    "levels": ["Mid Level"],
    "posted_at": posted_at,
    "url": format!("https://themuse.example/{external_id}"),
    "description_raw": "",
  })
}

/// A legacy-schema posting (raw Adzuna).
pub fn adzuna_doc(external_id: &str, title: &str, created: &str) -> Value {
  json!({
    "_id": PostingKey::new(Source::Adzuna, external_id).as_str(),
    "type": JOB_POST_TYPE,
    "source": "adzuna",
    "external_id": external_id,
    "title": title,
    "company": { "display_name": "Initech" },
    "location": { "display_name": "San Jose, CA" },
    "category": { "label": "IT Jobs" },
    "created": created,
    "url": format!("https://adzuna.example/{external_id}"),
    "description": "",
  })
}

/// An Adzuna posting rewritten into the normalized schema.
pub fn normalized_adzuna_doc(external_id: &str, title: &str, posted_at: &str) -> Value {
  json!({
    "_id": PostingKey::new(Source::Adzuna, external_id).as_str(),
    "type": JOB_POST_TYPE,
    "source": "adzuna",
    "external_id": external_id,
    "title_raw": title,
    "company_name": "Initech",
    "locations": ["San Jose, CA"],
    "location_area": ["US", "California"],
    "categories": ["IT Jobs"],
    "category_tag": "it-jobs",
    "levels": [],
    "posted_at": posted_at,
    "url": format!("https://adzuna.example/{external_id}"),
    "description_raw": "",
    "salary_max": 150000,
  })
}

/// A salary data point of kind `location`, `experience` or `company`.
/// `context` carries the keys that kind is broken down by.
pub fn salary_doc(kind: &str, job_title: &str, context: Value) -> Value {
  let mut doc = json!({
    "_id": format!("salary_{kind}:{job_title}:{context}"),
    "type": format!("salary_by_{kind}"),
    "job_title": job_title,
    "api_response": {
      "median_salary": 150000,
      "min_salary": 120000,
      "max_salary": 190000,
      "median_base_salary": 135000,
      "salary_currency": "USD",
      "salary_period": "YEAR",
      "publisher_name": "Glassdoor",
      "confidence": "CONFIDENT",
    },
  });
  if let (Some(doc), Some(context)) = (doc.as_object_mut(), context.as_object()) {
    doc.extend(context.clone());
  }
  doc
}

pub fn with(mut doc: Value, key: &str, value: Value) -> Value {
  doc[key] = value;
  doc
}

//! Filter discovery: a TTL-gated snapshot of every distinct location,
//! category and level in the corpus.
//!
//! The snapshot is rebuilt wholesale from a full scan and published by
//! swapping one `Arc`. Readers clone the `Arc` and never see a half-built
//! index. Two requests that both find the cache stale will both rebuild; the
//! later swap wins.

use std::{
  collections::BTreeSet,
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
  Error, Result, alias,
  posting::{DocSchema, Facet, JobPosting},
  query::{SearchFilters, build_selector},
  scan::{RetryPolicy, Scan},
  selector::Pattern,
  store::DocumentStore,
};

/// Filter values for one facet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterValues {
  pub field:  Facet,
  pub values: Vec<String>,
  /// Matches before `limit` truncation.
  pub total:  usize,
}

/// An immutable index of distinct facet values.
#[derive(Debug, Clone)]
pub struct FilterSnapshot {
  pub locations:  Vec<String>,
  pub categories: Vec<String>,
  pub levels:     Vec<String>,
  pub built_at:   DateTime<Utc>,
  built:          Instant,
}

impl FilterSnapshot {
  fn from_sets(
    locations: BTreeSet<String>,
    categories: BTreeSet<String>,
    levels: BTreeSet<String>,
  ) -> Self {
    Self {
      locations:  locations.into_iter().collect(),
      categories: categories.into_iter().collect(),
      levels:     levels.into_iter().collect(),
      built_at:   Utc::now(),
      built:      Instant::now(),
    }
  }

  pub fn values(&self, facet: Facet) -> &[String] {
    match facet {
      Facet::Locations => &self.locations,
      Facet::Categories => &self.categories,
      Facet::Levels => &self.levels,
    }
  }

  pub fn is_fresh(&self, ttl: Duration) -> bool { self.built.elapsed() <= ttl }

  /// Narrow one facet by `q` and truncate to `limit`.
  ///
  /// Location queries get the same alias expansion as search; other facets
  /// use a plain case-insensitive substring.
  pub fn query(&self, facet: Facet, q: Option<&str>, limit: usize) -> Result<FilterValues> {
    let all = self.values(facet);
    let q = q.map(str::trim).filter(|q| !q.is_empty());

    let matched: Vec<&String> = match q {
      None => all.iter().collect(),
      Some(q) => {
        let pattern = match facet {
          Facet::Locations => alias::expand(q),
          Facet::Categories | Facet::Levels => Pattern::substring(q),
        };
        let re = pattern
          .compile()
          .map_err(|e| Error::InvalidArgument(format!("filter query {q:?}: {e}")))?;
        all.iter().filter(|v| re.is_match(v)).collect()
      }
    };

    Ok(FilterValues {
      field:  facet,
      total:  matched.len(),
      values: matched.into_iter().take(limit).cloned().collect(),
    })
  }
}

/// Owner of the current snapshot.
pub struct FilterCache {
  ttl:     Duration,
  current: RwLock<Option<Arc<FilterSnapshot>>>,
}

impl FilterCache {
  pub fn new(ttl: Duration) -> Self { Self { ttl, current: RwLock::new(None) } }

  /// The published snapshot if it is still within its TTL.
  pub fn fresh(&self) -> Option<Arc<FilterSnapshot>> {
    self
      .current
      .read()
      .as_ref()
      .filter(|s| s.is_fresh(self.ttl))
      .cloned()
  }

  /// Return a fresh snapshot, rebuilding from `store` if needed.
  ///
  /// A failed rebuild leaves the previous snapshot in place and propagates
  /// the error.
  pub async fn snapshot<S: DocumentStore>(
    &self,
    store: &S,
    page_size: usize,
    policy: RetryPolicy,
  ) -> Result<Arc<FilterSnapshot>> {
    if let Some(snapshot) = self.fresh() {
      return Ok(snapshot);
    }
    let rebuilt = Arc::new(rebuild(store, page_size, policy).await?);
    *self.current.write() = Some(Arc::clone(&rebuilt));
    Ok(rebuilt)
  }
}

async fn rebuild<S: DocumentStore>(
  store: &S,
  page_size: usize,
  policy: RetryPolicy,
) -> Result<FilterSnapshot> {
  let started = Instant::now();
  let fields: Vec<&str> =
    DocSchema::BOTH.iter().flat_map(|s| s.facet_keys()).copied().collect();
  let scan = Scan {
    selector: build_selector(&SearchFilters::default()),
    fields: &fields,
    page_size,
    cap: None,
  };

  let mut locations = BTreeSet::new();
  let mut categories = BTreeSet::new();
  let mut levels = BTreeSet::new();
  let scanned = scan
    .run(store, policy, |doc| match JobPosting::from_value(doc) {
      Ok(posting) => {
        extend_trimmed(&mut locations, posting.locations);
        extend_trimmed(&mut categories, posting.categories);
        extend_trimmed(&mut levels, posting.levels);
      }
      Err(e) => warn!(error = %e, "skipping undecodable posting"),
    })
    .await?;

  let snapshot = FilterSnapshot::from_sets(locations, categories, levels);
  info!(
    scanned,
    locations = snapshot.locations.len(),
    categories = snapshot.categories.len(),
    levels = snapshot.levels.len(),
    elapsed_ms = started.elapsed().as_millis() as u64,
    "filter cache rebuilt"
  );
  Ok(snapshot)
}

fn extend_trimmed(set: &mut BTreeSet<String>, values: Vec<String>) {
  set.extend(
    values
      .into_iter()
      .map(|v| v.trim().to_owned())
      .filter(|v| !v.is_empty()),
  );
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use serde_json::json;

  use super::*;
  use crate::testing::{MemoryStore, adzuna_doc, muse_doc, with};

  const POLICY: RetryPolicy =
    RetryPolicy { max_attempts: 5, backoff_base: Duration::from_millis(1) };

  fn corpus() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(with(
      muse_doc("1", "Dev", ""),
      "locations",
      json!(["San Jose, CA", "Remote"]),
    ));
    store.insert(with(
      muse_doc("2", "Dev", ""),
      "locations",
      json!(["Arcata, NV", "Los Angeles, California"]),
    ));
    store.insert(adzuna_doc("3", "Dev", ""));
    store
  }

  #[tokio::test]
  async fn snapshot_merges_both_schemas() {
    let store = corpus();
    let cache = FilterCache::new(Duration::from_secs(3600));
    let snap = cache.snapshot(&store, 200, POLICY).await.unwrap();

    assert_eq!(snap.locations, vec![
      "Arcata, NV",
      "Los Angeles, California",
      "Remote",
      "San Jose, CA",
    ]);
    assert_eq!(snap.categories, vec!["IT Jobs", "Software Engineering"]);
    assert_eq!(snap.levels, vec!["Mid Level"]);
  }

  #[tokio::test]
  async fn snapshot_is_reused_within_ttl() {
    let store = corpus();
    let cache = FilterCache::new(Duration::from_secs(3600));
    let first = cache.snapshot(&store, 200, POLICY).await.unwrap();
    let calls = store.find_calls();

    store.insert(with(muse_doc("9", "Dev", ""), "levels", json!(["Internship"])));
    let second = cache.snapshot(&store, 200, POLICY).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.levels, vec!["Mid Level"]);
    assert_eq!(store.find_calls(), calls);
  }

  #[tokio::test]
  async fn expired_snapshot_is_rebuilt() {
    let store = corpus();
    let cache = FilterCache::new(Duration::ZERO);
    cache.snapshot(&store, 200, POLICY).await.unwrap();

    store.insert(with(muse_doc("9", "Dev", ""), "levels", json!(["Internship"])));
    tokio::time::sleep(Duration::from_millis(5)).await;
    let rebuilt = cache.snapshot(&store, 200, POLICY).await.unwrap();
    assert_eq!(rebuilt.levels, vec!["Internship", "Mid Level"]);
  }

  #[tokio::test]
  async fn failed_rebuild_keeps_previous_snapshot() {
    let store = corpus();
    let cache = FilterCache::new(Duration::ZERO);
    let first = cache.snapshot(&store, 1, POLICY).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    store.fail_after(1);
    let err = cache.snapshot(&store, 1, POLICY).await.unwrap_err();
    assert!(matches!(err, Error::ServiceUnavailable(_)));

    let kept = cache.current.read().clone().unwrap();
    assert!(Arc::ptr_eq(&first, &kept));
  }

  async fn finds_reach(store: &MemoryStore, n: usize) {
    while store.find_calls() < n {
      tokio::task::yield_now().await;
    }
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn racing_rebuilds_publish_whole_snapshots() {
    let store = Arc::new(corpus());
    let cache = Arc::new(FilterCache::new(Duration::ZERO));
    let old = cache.snapshot(&*store, 200, POLICY).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let gate = store.gate();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
      let (cache, done) = (Arc::clone(&cache), Arc::clone(&done));
      tokio::spawn(async move {
        let mut seen: Vec<Vec<String>> = Vec::new();
        while !done.load(Ordering::SeqCst) {
          let snap = cache.current.read().clone().unwrap();
          if seen.last() != Some(&snap.levels) {
            seen.push(snap.levels.clone());
          }
          tokio::task::yield_now().await;
        }
        seen
      })
    };

    // Two stale-cache requests, both parked inside their scan.
    let spawn_rebuild = || {
      let (store, cache) = (Arc::clone(&store), Arc::clone(&cache));
      tokio::spawn(async move { cache.snapshot(&*store, 200, POLICY).await })
    };
    let base = store.find_calls();
    let first = spawn_rebuild();
    finds_reach(&store, base + 1).await;
    let second = spawn_rebuild();
    finds_reach(&store, base + 2).await;
    assert!(Arc::ptr_eq(&cache.current.read().clone().unwrap(), &old));

    store.insert(with(muse_doc("9", "Dev", ""), "levels", json!(["Internship"])));
    gate.add_permits(1);
    let (earlier, later) = loop {
      if first.is_finished() {
        break (first, second);
      }
      if second.is_finished() {
        break (second, first);
      }
      tokio::task::yield_now().await;
    };
    let a = earlier.await.unwrap().unwrap();
    assert_eq!(a.levels, vec!["Internship", "Mid Level"]);
    assert!(Arc::ptr_eq(&cache.current.read().clone().unwrap(), &a));

    store.insert(with(muse_doc("10", "Dev", ""), "levels", json!(["Director"])));
    gate.add_permits(1);
    let b = later.await.unwrap().unwrap();
    assert_eq!(b.levels, vec!["Director", "Internship", "Mid Level"]);
    // The later swap wins.
    assert!(Arc::ptr_eq(&cache.current.read().clone().unwrap(), &b));

    done.store(true, Ordering::SeqCst);
    let seen = reader.await.unwrap();
    let order = [&old.levels, &a.levels, &b.levels];
    let positions: Vec<usize> = seen
      .iter()
      .map(|levels| {
        order
          .iter()
          .position(|o| *o == levels)
          .expect("reader saw a snapshot that was never published")
      })
      .collect();
    assert_eq!(positions.first(), Some(&0));
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
  }

  #[tokio::test]
  async fn location_query_uses_alias_expansion() {
    let store = corpus();
    let cache = FilterCache::new(Duration::from_secs(3600));
    let snap = cache.snapshot(&store, 200, POLICY).await.unwrap();

    let ca = snap.query(Facet::Locations, Some("CA"), 10).unwrap();
    assert_eq!(ca.values, vec!["Los Angeles, California", "San Jose, CA"]);

    let california = snap.query(Facet::Locations, Some("california"), 10).unwrap();
    assert_eq!(california.values, ca.values);
  }

  #[test]
  fn total_counts_matches_before_truncation() {
    let snap = FilterSnapshot::from_sets(
      ["Austin, TX", "Dallas, TX", "Houston, TX", "Boston, MA"]
        .map(String::from)
        .into(),
      BTreeSet::new(),
      BTreeSet::new(),
    );
    let values = snap.query(Facet::Locations, Some("texas"), 2).unwrap();
    assert_eq!(values.total, 3);
    assert_eq!(values.values, vec!["Austin, TX", "Dallas, TX"]);

    let everything = snap.query(Facet::Locations, None, 100).unwrap();
    assert_eq!(everything.total, 4);
  }

  #[test]
  fn category_query_is_a_substring_match() {
    let snap = FilterSnapshot::from_sets(
      BTreeSet::new(),
      ["Data Science", "Software Engineering"].map(String::from).into(),
      BTreeSet::new(),
    );
    let values = snap.query(Facet::Categories, Some("DATA"), 10).unwrap();
    assert_eq!(values.values, vec!["Data Science"]);
  }
}

//! Paginated search and cross-source interleaving.
//!
//! With a pinned source the store's own page is returned untouched. Without
//! one, `limit` and `skip` are split between the sources, each source is
//! paginated independently, and the two pages are merged by recency.
//!
//! The merged page approximates global recency order; it is not a global
//! top-K. When one source runs dry the page comes back short and the other
//! source is not asked to make up the difference.

use std::cmp::Reverse;

use serde::Serialize;
use tracing::debug;

use crate::{
  Result,
  posting::{DocSchema, JobPosting, JobSummary, Source},
  query::{SearchFilters, build_selector},
  scan::{RetryPolicy, find_with_retry},
  store::{DocumentStore, FindRequest},
};

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
  /// Number of jobs in this page, not the size of the full result set.
  pub total_results: usize,
  pub jobs:          Vec<JobSummary>,
  pub limit:         usize,
  pub skip:          usize,
}

/// Split `n` between two sources; the first takes the larger half.
pub fn split(n: usize) -> (usize, usize) { (n.div_ceil(2), n / 2) }

/// Stable sort, newest first. Postings without a usable date sink to the end
/// and equal keys keep their concatenation order.
pub fn merge_by_recency(mut postings: Vec<JobPosting>) -> Vec<JobPosting> {
  postings.sort_by_key(|p| Reverse(p.posted_timestamp()));
  postings
}

/// Keys projected for summaries, covering both document shapes.
pub(crate) fn summary_fields() -> Vec<&'static str> {
  let mut fields = vec!["source", "external_id"];
  for schema in DocSchema::BOTH {
    for key in schema.summary_keys() {
      if !fields.contains(key) {
        fields.push(key);
      }
    }
  }
  fields
}

pub(crate) async fn fetch<S: DocumentStore>(
  store: &S,
  filters: &SearchFilters,
  limit: usize,
  skip: usize,
  policy: RetryPolicy,
) -> Result<Vec<JobPosting>> {
  if limit == 0 {
    return Ok(Vec::new());
  }
  let selector = build_selector(filters);
  debug!(selector = %selector.to_mango(), limit, skip, "search query");

  let request = FindRequest::new(selector, limit)
    .with_fields(summary_fields())
    .with_skip(skip);
  let page = find_with_retry(store, &request, policy).await?;
  page.docs.into_iter().map(JobPosting::from_value).collect()
}

/// Run a search and return postings in page order.
pub async fn search<S: DocumentStore>(
  store: &S,
  filters: &SearchFilters,
  limit: usize,
  skip: usize,
  policy: RetryPolicy,
) -> Result<Vec<JobPosting>> {
  if filters.source.is_some() {
    return fetch(store, filters, limit, skip, policy).await;
  }

  let [first, second] = Source::ALL;
  let (limit_a, limit_b) = split(limit);
  let (skip_a, skip_b) = split(skip);

  let mut merged =
    fetch(store, &filters.pinned(first), limit_a, skip_a, policy).await?;
  merged.extend(
    fetch(store, &filters.pinned(second), limit_b, skip_b, policy).await?,
  );
  Ok(merge_by_recency(merged))
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::testing::{MemoryStore, adzuna_doc, muse_doc, normalized_adzuna_doc};

  const POLICY: RetryPolicy =
    RetryPolicy { max_attempts: 5, backoff_base: Duration::from_millis(1) };

  fn ids(postings: &[JobPosting]) -> Vec<&str> {
    postings.iter().map(|p| p.id.as_str()).collect()
  }

  #[test]
  fn split_gives_first_source_the_ceiling() {
    assert_eq!(split(4), (2, 2));
    assert_eq!(split(5), (3, 2));
    assert_eq!(split(1), (1, 0));
    assert_eq!(split(0), (0, 0));
  }

  #[tokio::test]
  async fn interleaves_two_sources_by_recency() {
    let store = MemoryStore::new();
    store.insert(muse_doc("a1", "Dev", "2024-01-01T00:00:00Z"));
    store.insert(muse_doc("a2", "Dev", "2024-01-05T00:00:00Z"));
    store.insert(muse_doc("a3", "Dev", "2024-01-09T00:00:00Z"));
    store.insert(adzuna_doc("b1", "Dev", "2024-01-03T00:00:00Z"));
    store.insert(adzuna_doc("b2", "Dev", "2024-01-07T00:00:00Z"));

    let page = search(&store, &SearchFilters::default(), 4, 0, POLICY)
      .await
      .unwrap();

    // Two from each source in native (key) order, then merged newest first.
    assert_eq!(ids(&page), vec![
      "job_post:adzuna:b2",
      "job_post:themuse:a2",
      "job_post:adzuna:b1",
      "job_post:themuse:a1",
    ]);
  }

  #[tokio::test]
  async fn skip_is_split_between_sources() {
    let store = MemoryStore::new();
    for i in 0..4 {
      store.insert(muse_doc(&format!("a{i}"), "Dev", "2024-01-01"));
      store.insert(adzuna_doc(&format!("b{i}"), "Dev", "2024-01-01"));
    }
    let page = search(&store, &SearchFilters::default(), 2, 3, POLICY)
      .await
      .unwrap();
    // skip 3 → 2 from the first source, 1 from the second.
    assert_eq!(ids(&page), vec!["job_post:themuse:a2", "job_post:adzuna:b1"]);
  }

  #[tokio::test]
  async fn exhausted_source_yields_short_page() {
    let store = MemoryStore::new();
    store.insert(muse_doc("a1", "Dev", "2024-01-01"));
    for i in 0..5 {
      store.insert(adzuna_doc(&format!("b{i}"), "Dev", "2024-01-02"));
    }
    let page = search(&store, &SearchFilters::default(), 4, 0, POLICY)
      .await
      .unwrap();
    // No backfill from the richer source: 1 + 2, not 4.
    assert_eq!(page.len(), 3);
  }

  #[tokio::test]
  async fn missing_dates_sort_last_and_ties_keep_order() {
    let store = MemoryStore::new();
    store.insert(muse_doc("a1", "Dev", ""));
    store.insert(muse_doc("a2", "Dev", "2024-01-01"));
    store.insert(adzuna_doc("b1", "Dev", "2024-01-01"));
    store.insert(adzuna_doc("b2", "Dev", "not a date"));

    let page = search(&store, &SearchFilters::default(), 4, 0, POLICY)
      .await
      .unwrap();
    assert_eq!(ids(&page), vec![
      "job_post:themuse:a2",
      "job_post:adzuna:b1",
      "job_post:themuse:a1",
      "job_post:adzuna:b2",
    ]);
  }

  #[tokio::test]
  async fn pinned_source_keeps_store_order() {
    let store = MemoryStore::new();
    store.insert(muse_doc("a1", "Dev", "2024-01-01"));
    store.insert(muse_doc("a2", "Dev", "2024-06-01"));
    store.insert(muse_doc("a3", "Dev", "2024-03-01"));
    store.insert(adzuna_doc("b1", "Dev", "2025-01-01"));

    let filters = SearchFilters::default().pinned(Source::TheMuse);
    let page = search(&store, &filters, 2, 1, POLICY).await.unwrap();
    assert_eq!(ids(&page), vec!["job_post:themuse:a2", "job_post:themuse:a3"]);
    assert_eq!(store.find_calls(), 1);
  }

  #[tokio::test]
  async fn rewritten_adzuna_postings_are_searchable() {
    let store = MemoryStore::new();
    store.insert(normalized_adzuna_doc("77", "Python Engineer", "2024-02-01"));
    store.insert(adzuna_doc("78", "Python Developer", "2024-01-01"));
    store.insert(muse_doc("a1", "Java Developer", "2024-03-01"));

    let title = SearchFilters { title: Some("python".into()), ..Default::default() };
    let unpinned = search(&store, &title, 10, 0, POLICY).await.unwrap();
    assert_eq!(ids(&unpinned), vec!["job_post:adzuna:77", "job_post:adzuna:78"]);

    let pinned = search(&store, &title.pinned(Source::Adzuna), 10, 0, POLICY)
      .await
      .unwrap();
    assert_eq!(ids(&pinned), vec!["job_post:adzuna:77", "job_post:adzuna:78"]);

    let location = SearchFilters { location: Some("CA".into()), ..Default::default() };
    let page = search(&store, &location, 10, 0, POLICY).await.unwrap();
    assert_eq!(ids(&page), vec!["job_post:adzuna:77", "job_post:adzuna:78"]);
    assert_eq!(page[0].locations, vec!["San Jose, CA"]);
  }

  #[tokio::test]
  async fn title_filter_is_case_insensitive() {
    let store = MemoryStore::new();
    store.insert(muse_doc("a1", "PYTHON Developer", "2024-01-01"));
    store.insert(muse_doc("a2", "Java Developer", "2024-01-01"));
    let filters = SearchFilters { title: Some("python".into()), ..Default::default() };
    let page = search(&store, &filters, 10, 0, POLICY).await.unwrap();
    assert_eq!(ids(&page), vec!["job_post:themuse:a1"]);
    assert_eq!(page[0].title, "PYTHON Developer");
  }
}

//! Rate-limit-aware store access: single queries with retry, and capped
//! bookmark-paginated scans built on top of them.

use std::{future::Future, time::Duration};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  Error, QueryConfig, Result,
  selector::Selector,
  store::{DocumentStore, FindPage, FindRequest, StoreError},
};

/// Linear backoff reserved for rate-limit responses. Any other failure is
/// surfaced immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Total attempts, including the first.
  pub max_attempts: u32,
  /// Attempt `n` (1-based) waits `n * backoff_base` before attempt `n + 1`.
  pub backoff_base: Duration,
}

impl From<&QueryConfig> for RetryPolicy {
  fn from(cfg: &QueryConfig) -> Self {
    Self {
      max_attempts: cfg.max_attempts.max(1),
      backoff_base: cfg.backoff_base(),
    }
  }
}

/// Run one `find`, retrying only while the store reports rate limiting.
pub async fn find_with_retry<S: DocumentStore>(
  store: &S,
  request: &FindRequest,
  policy: RetryPolicy,
) -> Result<FindPage> {
  with_retry(policy, || store.find(request)).await
}

/// Point lookup under the same retry policy as [`find_with_retry`].
pub async fn get_with_retry<S: DocumentStore>(
  store: &S,
  id: &str,
  policy: RetryPolicy,
) -> Result<Option<Value>> {
  with_retry(policy, || store.get(id)).await
}

async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut call: F) -> Result<T>
where
  E: StoreError,
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let mut attempt = 1;
  loop {
    match call().await {
      Ok(value) => return Ok(value),
      Err(e) if e.is_rate_limited() && attempt < policy.max_attempts => {
        let delay = policy.backoff_base * attempt;
        warn!(attempt, ?delay, "store rate limited; backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(e) => return Err(Error::unavailable(e)),
    }
  }
}

/// A full paginated pass over every document matching a selector.
#[derive(Debug, Clone)]
pub struct Scan<'a> {
  pub selector:  Selector,
  pub fields:    &'a [&'a str],
  pub page_size: usize,
  /// Stop after this many documents; `None` scans to exhaustion.
  pub cap:       Option<usize>,
}

impl Scan<'_> {
  /// Feed every matching document to `visit` and return how many were seen.
  ///
  /// A page that still fails after retries aborts the whole scan; callers
  /// never see a silently truncated pass.
  pub async fn run<S, F>(
    &self,
    store: &S,
    policy: RetryPolicy,
    mut visit: F,
  ) -> Result<usize>
  where
    S: DocumentStore,
    F: FnMut(Value),
  {
    let page_size = self.page_size.max(1);
    let mut request = FindRequest::new(self.selector.clone(), page_size)
      .with_fields(self.fields.iter().copied());
    let mut seen = 0usize;

    loop {
      if let Some(cap) = self.cap {
        if seen >= cap {
          break;
        }
        request.limit = page_size.min(cap - seen);
      }

      let page = find_with_retry(store, &request, policy).await?;
      let fetched = page.docs.len();
      debug!(fetched, seen, "scan page");
      if fetched == 0 {
        break;
      }

      seen += fetched;
      page.docs.into_iter().for_each(&mut visit);

      match page.bookmark {
        Some(bookmark) if fetched == request.limit => request.bookmark = Some(bookmark),
        _ => break,
      }
    }

    Ok(seen)
  }
}

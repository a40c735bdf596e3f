//! Tunables for the query layer.

use std::time::Duration;

use serde::Deserialize;

/// Knobs shared by the filter cache, corpus scans and the skill matcher.
///
/// Deserialised from the `[query]` table of the server config; every field
/// has a default so the table may be omitted entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
  /// Age after which the filter snapshot is rebuilt on the next read.
  pub cache_ttl_secs:         u64,
  /// Documents requested per page during full scans.
  pub scan_page_size:         usize,
  /// Total attempts per page when the store reports rate limiting.
  pub max_attempts:           u32,
  /// Backoff unit; attempt `n` sleeps `n * backoff_base_ms`.
  pub backoff_base_ms:        u64,
  /// Per-source document cap for trending scans.
  pub trending_scan_cap:      usize,
  /// Candidates fetched per source for every requested match slot.
  pub skill_candidate_factor: usize,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      cache_ttl_secs:         3600,
      scan_page_size:         200,
      max_attempts:           5,
      backoff_base_ms:        1000,
      trending_scan_cap:      2000,
      skill_candidate_factor: 4,
    }
  }
}

impl QueryConfig {
  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }

  pub fn backoff_base(&self) -> Duration {
    Duration::from_millis(self.backoff_base_ms)
  }
}

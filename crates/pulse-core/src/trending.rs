//! Skill frequency across a filtered, capped corpus scan.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
  Result,
  posting::{JobPosting, Source},
  query::{SearchFilters, build_selector},
  scan::{RetryPolicy, Scan},
  skills::{SkillPattern, vocabulary},
  store::DocumentStore,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillTrend {
  pub skill:      String,
  pub count:      usize,
  /// Share of analysed postings mentioning the skill, one decimal place.
  pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingSkills {
  /// Scanned postings with a non-empty description.
  pub jobs_analyzed: usize,
  pub skills:        Vec<SkillTrend>,
}

/// Per-skill mention counts over a set of descriptions.
#[derive(Debug)]
struct Tally<'v> {
  vocabulary:    &'v [SkillPattern],
  counts:        Vec<usize>,
  jobs_analyzed: usize,
}

impl<'v> Tally<'v> {
  fn new(vocabulary: &'v [SkillPattern]) -> Self {
    Self { vocabulary, counts: vec![0; vocabulary.len()], jobs_analyzed: 0 }
  }

  fn add(&mut self, description: &str) {
    if description.trim().is_empty() {
      return;
    }
    self.jobs_analyzed += 1;
    for (count, skill) in self.counts.iter_mut().zip(self.vocabulary) {
      if skill.is_match(description) {
        *count += 1;
      }
    }
  }

  /// Top `limit` skills by count; ties keep vocabulary order.
  fn finish(self, limit: usize) -> TrendingSkills {
    let jobs = self.jobs_analyzed;
    let mut ranked: Vec<(usize, &SkillPattern)> =
      self.counts.into_iter().zip(self.vocabulary).collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.truncate(limit);

    let skills = ranked
      .into_iter()
      .map(|(count, skill)| SkillTrend {
        skill: skill.name().to_owned(),
        count,
        percentage: percentage(count, jobs),
      })
      .collect();
    TrendingSkills { jobs_analyzed: jobs, skills }
  }
}

fn percentage(count: usize, jobs: usize) -> f64 {
  if jobs == 0 {
    return 0.0;
  }
  // One decimal, ties to even.
  let percent = count as f64 / jobs as f64 * 100.0;
  (percent * 10.0).round_ties_even() / 10.0
}

/// Count vocabulary mentions over the postings matching `filters`.
///
/// Each active source is scanned up to `cap` documents. A scan that fails
/// part-way fails the whole call.
pub async fn trending<S: DocumentStore>(
  store: &S,
  filters: &SearchFilters,
  limit: usize,
  cap: usize,
  page_size: usize,
  policy: RetryPolicy,
) -> Result<TrendingSkills> {
  let started = Instant::now();
  let mut tally = Tally::new(vocabulary());
  let mut scanned = 0;

  for source in Source::active(filters.source) {
    let fields: Vec<&str> =
      source.schemas().iter().map(|s| s.description_field()).collect();
    let scan = Scan {
      selector: build_selector(&filters.pinned(source)),
      fields: &fields,
      page_size,
      cap: Some(cap),
    };
    scanned += scan
      .run(store, policy, |doc| match JobPosting::from_value(doc) {
        Ok(posting) => tally.add(&posting.description),
        Err(e) => warn!(error = %e, "skipping undecodable posting"),
      })
      .await?;
  }

  let result = tally.finish(limit);
  info!(
    scanned,
    jobs_analyzed = result.jobs_analyzed,
    elapsed_ms = started.elapsed().as_millis() as u64,
    "trending skills computed"
  );
  Ok(result)
}

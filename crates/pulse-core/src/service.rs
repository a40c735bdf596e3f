//! `JobService`: the job and salary query operations, with argument
//! validation.
//!
//! Every argument is checked before the store is touched, so an
//! `InvalidArgument` never costs a storage round trip.

use std::sync::Arc;

use tracing::instrument;

use crate::{
  Error, QueryConfig, Result,
  filters::{FilterCache, FilterValues},
  posting::{Facet, JOB_POST_TYPE, JobDetail, JobPosting, Source},
  query::SearchFilters,
  salaries::{self, Experience, SalaryResponse},
  scan::{RetryPolicy, get_with_retry},
  search::{self, SearchPage},
  skills::{self, SkillMatches},
  store::DocumentStore,
  trending::{self, TrendingSkills},
};

// ─── Bounds ──────────────────────────────────────────────────────────────────

pub const SEARCH_LIMIT: Bound = Bound { name: "limit", default: 25, max: 100 };
pub const MAX_SKIP: usize = 10_000;
pub const FILTER_LIMIT: Bound = Bound { name: "limit", default: 100, max: 1000 };
pub const MATCH_LIMIT: Bound = Bound { name: "limit", default: 10, max: 50 };
pub const MAX_SKILLS: usize = 25;
pub const TRENDING_LIMIT: Bound = Bound { name: "limit", default: 20, max: 100 };

/// An inclusive `1..=max` range with a default for omitted values.
#[derive(Debug, Clone, Copy)]
pub struct Bound {
  pub name:    &'static str,
  pub default: usize,
  pub max:     usize,
}

impl Bound {
  pub fn check(self, value: Option<usize>) -> Result<usize> {
    let value = value.unwrap_or(self.default);
    if (1..=self.max).contains(&value) {
      Ok(value)
    } else {
      Err(Error::InvalidArgument(format!(
        "{} must be between 1 and {}, got {value}",
        self.name, self.max
      )))
    }
  }
}

fn check_filters(filters: &SearchFilters) -> Result<()> {
  match filters.min_salary {
    Some(min) if !min.is_finite() || min < 0.0 => Err(Error::InvalidArgument(
      format!("min_salary must be a non-negative number, got {min}"),
    )),
    _ => Ok(()),
  }
}

fn check_job_title(job_title: &str) -> Result<&str> {
  let job_title = job_title.trim();
  if job_title.is_empty() {
    return Err(Error::InvalidArgument("job_title must not be empty".into()));
  }
  Ok(job_title)
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Query facade over a [`DocumentStore`]. Owns the filter cache.
pub struct JobService<S> {
  store:   Arc<S>,
  config:  QueryConfig,
  filters: FilterCache,
}

impl<S: DocumentStore> JobService<S> {
  pub fn new(store: Arc<S>, config: QueryConfig) -> Self {
    let filters = FilterCache::new(config.cache_ttl());
    Self { store, config, filters }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &QueryConfig { &self.config }

  fn policy(&self) -> RetryPolicy { RetryPolicy::from(&self.config) }

  /// One page of postings matching `filters`.
  #[instrument(skip(self))]
  pub async fn search(
    &self,
    filters: &SearchFilters,
    limit: Option<usize>,
    skip: Option<usize>,
  ) -> Result<SearchPage> {
    let limit = SEARCH_LIMIT.check(limit)?;
    let skip = skip.unwrap_or(0);
    if skip > MAX_SKIP {
      return Err(Error::InvalidArgument(format!(
        "skip must be at most {MAX_SKIP}, got {skip}"
      )));
    }
    check_filters(filters)?;

    let postings =
      search::search(&*self.store, filters, limit, skip, self.policy()).await?;
    let jobs: Vec<_> = postings.iter().map(JobPosting::summary).collect();
    Ok(SearchPage { total_results: jobs.len(), jobs, limit, skip })
  }

  /// Full posting by document key.
  #[instrument(skip(self))]
  pub async fn get_by_id(&self, key: &str) -> Result<JobDetail> {
    let key = key.trim();
    if key.is_empty() {
      return Err(Error::InvalidArgument("job id must not be empty".into()));
    }

    let doc = get_with_retry(&*self.store, key, self.policy())
      .await?
      .filter(|doc| doc.get("type").and_then(|t| t.as_str()) == Some(JOB_POST_TYPE))
      .ok_or_else(|| Error::NotFound(format!("job {key}")))?;
    Ok(JobPosting::from_value(doc)?.into_detail())
  }

  /// Distinct values of one facet, optionally narrowed by `q`.
  #[instrument(skip(self))]
  pub async fn filter_values(
    &self,
    field: &str,
    q: Option<&str>,
    limit: Option<usize>,
  ) -> Result<FilterValues> {
    let facet: Facet = field.parse().map_err(|_| {
      Error::InvalidArgument(format!(
        "unknown filter field {field:?}; expected locations, categories or levels"
      ))
    })?;
    let limit = FILTER_LIMIT.check(limit)?;

    let snapshot = self
      .filters
      .snapshot(&*self.store, self.config.scan_page_size, self.policy())
      .await?;
    snapshot.query(facet, q, limit)
  }

  /// Postings ranked by how many of `skills` they mention.
  #[instrument(skip(self))]
  pub async fn match_skills<T: AsRef<str> + std::fmt::Debug>(
    &self,
    skills: &[T],
    source: Option<Source>,
    limit: Option<usize>,
  ) -> Result<SkillMatches> {
    let skills = skills::normalize_skills(skills);
    if skills.len() > MAX_SKILLS {
      return Err(Error::InvalidArgument(format!(
        "at most {MAX_SKILLS} skills may be requested, got {}",
        skills.len()
      )));
    }
    let limit = MATCH_LIMIT.check(limit)?;

    skills::match_skills(
      &*self.store,
      skills,
      source,
      limit,
      self.config.skill_candidate_factor,
      self.policy(),
    )
    .await
  }

  /// Most frequently mentioned vocabulary skills among postings matching
  /// `filters`.
  #[instrument(skip(self))]
  pub async fn trending(
    &self,
    filters: &SearchFilters,
    limit: Option<usize>,
  ) -> Result<TrendingSkills> {
    let limit = TRENDING_LIMIT.check(limit)?;
    check_filters(filters)?;

    trending::trending(
      &*self.store,
      filters,
      limit,
      self.config.trending_scan_cap,
      self.config.scan_page_size,
      self.policy(),
    )
    .await
  }

  // ─── Salaries ─────────────────────────────────────────────────────────────

  /// Salary benchmarks for a role across cities.
  #[instrument(skip(self))]
  pub async fn salaries_by_location(
    &self,
    job_title: &str,
    location: Option<&str>,
  ) -> Result<SalaryResponse> {
    let selector = salaries::by_location(check_job_title(job_title)?, location);
    salaries::lookup(&*self.store, selector, self.policy()).await
  }

  /// Salary benchmarks for a role by experience bracket.
  #[instrument(skip(self))]
  pub async fn salaries_by_experience(
    &self,
    job_title: &str,
    years_of_experience: Option<&str>,
    location: Option<&str>,
  ) -> Result<SalaryResponse> {
    let job_title = check_job_title(job_title)?;
    let experience = years_of_experience
      .map(str::trim)
      .filter(|e| !e.is_empty())
      .map(|e| {
        e.parse::<Experience>().map_err(|_| {
          Error::InvalidArgument(format!(
            "unknown experience bracket {e:?}; expected LESS_THAN_ONE, \
             ONE_TO_THREE, FOUR_TO_SIX, SEVEN_TO_NINE or TEN_PLUS"
          ))
        })
      })
      .transpose()?;
    let selector = salaries::by_experience(job_title, experience, location);
    salaries::lookup(&*self.store, selector, self.policy()).await
  }

  /// Company-specific salary benchmarks for a role.
  #[instrument(skip(self))]
  pub async fn salaries_by_company(
    &self,
    job_title: &str,
    company: Option<&str>,
  ) -> Result<SalaryResponse> {
    let selector = salaries::by_company(check_job_title(job_title)?, company);
    salaries::lookup(&*self.store, selector, self.policy()).await
  }

  /// Side-by-side benchmarks for named locations and companies. At least one
  /// of the two lists must be non-empty.
  #[instrument(skip(self))]
  pub async fn compare_salaries<T: AsRef<str> + std::fmt::Debug>(
    &self,
    job_title: &str,
    locations: &[T],
    companies: &[T],
  ) -> Result<SalaryResponse> {
    let job_title = check_job_title(job_title)?;
    if locations.is_empty() && companies.is_empty() {
      return Err(Error::InvalidArgument(
        "provide at least one of locations or companies".into(),
      ));
    }
    let selector = salaries::compare(job_title, locations, companies);
    salaries::lookup(&*self.store, selector, self.policy()).await
  }
}

//! Salary benchmarks: lookups over the `salary_by_*` documents written by the
//! salary ingestion job.
//!
//! Each document is one data point for a job title, keyed by a location, an
//! experience bracket or a company, with the provider's figures nested under
//! `api_response`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
  Result,
  scan::{RetryPolicy, find_with_retry},
  selector::{Pattern, Selector},
  store::{DocumentStore, FindRequest},
};

/// Upper bound on records returned by any salary lookup.
pub const SALARY_LIMIT: usize = 200;

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The dimension a salary document is broken down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum SalaryKind {
  #[strum(serialize = "salary_by_location")]
  ByLocation,
  #[strum(serialize = "salary_by_experience")]
  ByExperience,
  #[strum(serialize = "salary_by_company")]
  ByCompany,
}

impl SalaryKind {
  pub fn doc_type(self) -> &'static str { self.into() }
}

/// Years-of-experience brackets used by the salary provider.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Experience {
  LessThanOne,
  OneToThree,
  FourToSix,
  SevenToNine,
  TenPlus,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// The provider's figures for one data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryInfo {
  #[serde(default)]
  pub median_salary:      Option<f64>,
  #[serde(default)]
  pub min_salary:         Option<f64>,
  #[serde(default)]
  pub max_salary:         Option<f64>,
  /// Median excluding bonuses and equity.
  #[serde(default)]
  pub median_base_salary: Option<f64>,
  #[serde(default = "default_currency")]
  pub salary_currency:    String,
  #[serde(default = "default_period")]
  pub salary_period:      String,
  #[serde(default)]
  pub publisher_name:     String,
  #[serde(default)]
  pub confidence:         String,
}

impl Default for SalaryInfo {
  fn default() -> Self {
    Self {
      median_salary:      None,
      min_salary:         None,
      max_salary:         None,
      median_base_salary: None,
      salary_currency:    default_currency(),
      salary_period:      default_period(),
      publisher_name:     String::new(),
      confidence:         String::new(),
    }
  }
}

fn default_currency() -> String { "USD".into() }

fn default_period() -> String { "YEAR".into() }

/// One salary data point with the context it was collected for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryRecord {
  pub job_title:           String,
  pub location:            Option<String>,
  /// Experience bracket as stored, e.g. `ONE_TO_THREE`.
  pub years_of_experience: Option<String>,
  pub company:             Option<String>,
  pub salary:              SalaryInfo,
}

#[derive(Deserialize)]
struct StoredSalary {
  #[serde(default)]
  job_title:           String,
  #[serde(default)]
  location:            Option<String>,
  #[serde(default)]
  years_of_experience: Option<String>,
  #[serde(default)]
  company:             Option<String>,
  #[serde(default)]
  api_response:        Option<SalaryInfo>,
}

impl SalaryRecord {
  pub fn from_value(doc: Value) -> Result<Self> {
    let doc: StoredSalary = serde_json::from_value(doc)?;
    Ok(Self {
      job_title:           doc.job_title,
      location:            doc.location,
      years_of_experience: doc.years_of_experience,
      company:             doc.company,
      salary:              doc.api_response.unwrap_or_default(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryResponse {
  pub count: usize,
  pub data:  Vec<SalaryRecord>,
}

// ─── Selectors ───────────────────────────────────────────────────────────────

/// Case-insensitive substring filter on a text field, skipped when blank.
fn contains(field: &str, text: Option<&str>) -> Selector {
  match text.map(str::trim).filter(|t| !t.is_empty()) {
    Some(text) => Selector::regex(field, Pattern::substring(text)),
    None => Selector::All,
  }
}

fn of_kind(kind: SalaryKind, job_title: &str) -> Vec<Selector> {
  vec![
    Selector::eq("type", kind.doc_type()),
    contains("job_title", Some(job_title)),
  ]
}

pub fn by_location(job_title: &str, location: Option<&str>) -> Selector {
  let mut parts = of_kind(SalaryKind::ByLocation, job_title);
  parts.push(contains("location", location));
  Selector::and(parts)
}

pub fn by_experience(
  job_title: &str,
  experience: Option<Experience>,
  location: Option<&str>,
) -> Selector {
  let mut parts = of_kind(SalaryKind::ByExperience, job_title);
  if let Some(experience) = experience {
    parts.push(Selector::eq("years_of_experience", experience.to_string()));
  }
  parts.push(contains("location", location));
  Selector::and(parts)
}

pub fn by_company(job_title: &str, company: Option<&str>) -> Selector {
  let mut parts = of_kind(SalaryKind::ByCompany, job_title);
  parts.push(contains("company", company));
  Selector::and(parts)
}

/// Location data points in `locations` or company data points in
/// `companies`. Names must match exactly. An empty list contributes nothing.
pub fn compare<T: AsRef<str>>(
  job_title: &str,
  locations: &[T],
  companies: &[T],
) -> Selector {
  let branch = |kind, field, names: &[T]| {
    (!names.is_empty()).then(|| {
      let mut parts = of_kind(kind, job_title);
      parts.push(Selector::one_of(field, names.iter().map(|n| n.as_ref())));
      Selector::and(parts)
    })
  };
  Selector::or(
    [
      branch(SalaryKind::ByLocation, "location", locations),
      branch(SalaryKind::ByCompany, "company", companies),
    ]
    .into_iter()
    .flatten(),
  )
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Run one salary selector; a single page of at most [`SALARY_LIMIT`].
pub async fn lookup<S: DocumentStore>(
  store: &S,
  selector: Selector,
  policy: RetryPolicy,
) -> Result<SalaryResponse> {
  let request = FindRequest::new(selector, SALARY_LIMIT);
  let page = find_with_retry(store, &request, policy).await?;
  let data = page
    .docs
    .into_iter()
    .map(SalaryRecord::from_value)
    .collect::<Result<Vec<_>>>()?;
  debug!(count = data.len(), "salary lookup");
  Ok(SalaryResponse { count: data.len(), data })
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use serde_json::json;

  use super::*;
  use crate::testing::{MemoryStore, salary_doc};

  const POLICY: RetryPolicy =
    RetryPolicy { max_attempts: 3, backoff_base: Duration::from_millis(1) };

  fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    for doc in [
      salary_doc("location", "Software Engineer", json!({ "location": "New York" })),
      salary_doc("location", "Software Engineer", json!({ "location": "San Francisco" })),
      salary_doc("location", "Data Scientist", json!({ "location": "New York" })),
      salary_doc(
        "experience",
        "Software Engineer",
        json!({ "location": "Austin", "years_of_experience": "TEN_PLUS" }),
      ),
      salary_doc(
        "experience",
        "Software Engineer",
        json!({ "location": "Austin", "years_of_experience": "ONE_TO_THREE" }),
      ),
      salary_doc("company", "Software Engineer", json!({ "company": "Google" })),
      salary_doc("company", "Software Engineer", json!({ "company": "Amazon" })),
    ] {
      store.insert(doc);
    }
    store
  }

  async fn run(store: &MemoryStore, selector: Selector) -> SalaryResponse {
    lookup(store, selector, POLICY).await.unwrap()
  }

  #[test]
  fn kinds_name_their_document_type() {
    assert_eq!(SalaryKind::ByLocation.doc_type(), "salary_by_location");
    assert_eq!(SalaryKind::ByCompany.to_string(), "salary_by_company");
  }

  #[test]
  fn experience_brackets_parse_case_insensitively() {
    assert_eq!("ten_plus".parse::<Experience>().unwrap(), Experience::TenPlus);
    assert_eq!(Experience::LessThanOne.to_string(), "LESS_THAN_ONE");
    assert!("FIVE".parse::<Experience>().is_err());
  }

  #[test]
  fn missing_figures_fall_back_to_defaults() {
    let record = SalaryRecord::from_value(json!({
      "type": "salary_by_company",
      "job_title": "SRE",
      "company": "Initech",
    }))
    .unwrap();
    assert_eq!(record.salary, SalaryInfo::default());
    assert_eq!(record.salary.salary_currency, "USD");
    assert_eq!(record.salary.salary_period, "YEAR");
    assert_eq!(record.location, None);

    let partial = SalaryRecord::from_value(json!({
      "job_title": "SRE",
      "api_response": { "median_salary": 180000, "salary_currency": "EUR" },
    }))
    .unwrap();
    assert_eq!(partial.salary.median_salary, Some(180000.0));
    assert_eq!(partial.salary.salary_currency, "EUR");
    assert_eq!(partial.salary.salary_period, "YEAR");
  }

  #[tokio::test]
  async fn by_location_narrows_case_insensitively() {
    let store = seeded();
    let all = run(&store, by_location("software", None)).await;
    assert_eq!(all.count, 2);
    let ny = run(&store, by_location("SOFTWARE ENGINEER", Some("new york"))).await;
    assert_eq!(ny.count, 1);
    assert_eq!(ny.data[0].location.as_deref(), Some("New York"));
    assert_eq!(ny.data[0].salary.median_salary, Some(150000.0));
  }

  #[tokio::test]
  async fn by_experience_matches_the_bracket_exactly() {
    let store = seeded();
    let senior = run(
      &store,
      by_experience("engineer", Some(Experience::TenPlus), Some("austin")),
    )
    .await;
    assert_eq!(senior.count, 1);
    assert_eq!(senior.data[0].years_of_experience.as_deref(), Some("TEN_PLUS"));
    assert_eq!(run(&store, by_experience("engineer", None, None)).await.count, 2);
  }

  #[tokio::test]
  async fn by_company_ignores_other_kinds() {
    let store = seeded();
    let out = run(&store, by_company("engineer", Some("goog"))).await;
    assert_eq!(out.count, 1);
    assert_eq!(out.data[0].company.as_deref(), Some("Google"));
    assert_eq!(run(&store, by_company("scientist", None)).await.count, 0);
  }

  #[tokio::test]
  async fn compare_unions_locations_and_companies() {
    let store = seeded();
    let both = run(
      &store,
      compare("software engineer", &["New York", "Austin"], &["Amazon"]),
    )
    .await;
    let mut labels: Vec<_> = both
      .data
      .iter()
      .filter_map(|r| r.location.as_deref().or(r.company.as_deref()))
      .collect();
    labels.sort();
    // Austin only has experience data points.
    assert_eq!(labels, vec!["Amazon", "New York"]);

    // Names are exact, not substrings.
    let none = run(&store, compare::<&str>("engineer", &["new york"], &[])).await;
    assert_eq!(none.count, 0);
  }

  #[test]
  fn compare_renders_in_and_or() {
    let sel = compare("rust", &["Austin"], &["Google"]);
    assert_eq!(
      sel.to_mango(),
      json!({ "$or": [
        { "$and": [
          { "type": "salary_by_location" },
          { "job_title": { "$regex": "(?i)rust" } },
          { "location": { "$in": ["Austin"] } },
        ]},
        { "$and": [
          { "type": "salary_by_company" },
          { "job_title": { "$regex": "(?i)rust" } },
          { "company": { "$in": ["Google"] } },
        ]},
      ]})
    );
    // One side only: no disjunction.
    let sel = compare::<&str>("rust", &[], &["Google"]);
    assert!(matches!(sel, Selector::And(_)));
  }

  #[tokio::test]
  async fn rate_limits_are_retried() {
    let store = seeded();
    store.rate_limit_next(2);
    assert_eq!(run(&store, by_company("engineer", None)).await.count, 2);
  }
}

//! Job postings and the schema adapters that read them.
//!
//! Postings arrive in two document shapes. Sources ingested through the
//! canonical pipeline use the *normalized* field names (`title_raw`,
//! `company_name`, `locations[]`, ...). Older Adzuna documents keep the raw
//! API shape (`title`, `company.display_name`, `location.display_name`, ...).
//! [`RawPosting`] names the shape explicitly and each variant has exactly one
//! adapter into the canonical [`JobPosting`]; nothing downstream ever looks
//! for alternative field names.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Value of the `type` field on every posting document.
pub const JOB_POST_TYPE: &str = "job_post";

// ─── Source ──────────────────────────────────────────────────────────────────

/// The external system a posting was ingested from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Source {
  TheMuse,
  Adzuna,
}

impl Source {
  /// Every source, in interleave order: the first gets the larger half of an
  /// odd split.
  pub const ALL: [Source; 2] = [Source::TheMuse, Source::Adzuna];

  /// The document shapes this source's postings may be stored in.
  ///
  /// Adzuna postings start in the raw API shape and are rewritten into the
  /// normalized one by a later pass, so both coexist.
  pub fn schemas(self) -> &'static [DocSchema] {
    match self {
      Self::TheMuse => &[DocSchema::Normalized],
      Self::Adzuna => &[DocSchema::Legacy, DocSchema::Normalized],
    }
  }

  /// The sources a request touches: the pinned one, or all of them.
  pub fn active(pinned: Option<Source>) -> Vec<Source> {
    pinned.map_or_else(|| Self::ALL.to_vec(), |s| vec![s])
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Deterministic document key: `job_post:{source}:{external_id}`.
///
/// Re-ingesting the same `(source, external_id)` writes to the same key, so
/// the second write replaces the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostingKey(String);

impl PostingKey {
  pub fn new(source: Source, external_id: &str) -> Self {
    Self(format!("{JOB_POST_TYPE}:{source}:{}", external_id.trim()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PostingKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Facets ──────────────────────────────────────────────────────────────────

/// The multi-valued attributes exposed for filter discovery.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Facet {
  Locations,
  Categories,
  Levels,
}

/// Where a facet lives in a given schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetField {
  pub path: &'static str,
  /// `true` for array fields, `false` for a single string.
  pub list: bool,
}

// ─── Schemas ─────────────────────────────────────────────────────────────────

/// The two document shapes postings are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocSchema {
  Normalized,
  Legacy,
}

/// Keys only ever written by the canonical pipeline.
const NORMALIZED_KEYS: [&str; 7] = [
  "title_raw",
  "company_name",
  "description_raw",
  "posted_at",
  "locations",
  "categories",
  "levels",
];

impl DocSchema {
  pub const BOTH: [DocSchema; 2] = [DocSchema::Normalized, DocSchema::Legacy];

  /// Classify a (possibly projected) document.
  pub fn detect(doc: &Value) -> Self {
    let normalized = doc
      .as_object()
      .is_some_and(|o| NORMALIZED_KEYS.iter().any(|k| o.contains_key(*k)));
    if normalized { Self::Normalized } else { Self::Legacy }
  }

  pub fn title_field(self) -> &'static str {
    match self {
      Self::Normalized => "title_raw",
      Self::Legacy => "title",
    }
  }

  pub fn company_field(self) -> &'static str {
    match self {
      Self::Normalized => "company_name",
      Self::Legacy => "company.display_name",
    }
  }

  pub fn description_field(self) -> &'static str {
    match self {
      Self::Normalized => "description_raw",
      Self::Legacy => "description",
    }
  }

  /// `None` when the schema has no such attribute (legacy levels).
  pub fn facet_field(self, facet: Facet) -> Option<FacetField> {
    let (path, list) = match (self, facet) {
      (Self::Normalized, Facet::Locations) => ("locations", true),
      (Self::Normalized, Facet::Categories) => ("categories", true),
      (Self::Normalized, Facet::Levels) => ("levels", true),
      (Self::Legacy, Facet::Locations) => ("location.display_name", false),
      (Self::Legacy, Facet::Categories) => ("category.label", false),
      (Self::Legacy, Facet::Levels) => return None,
    };
    Some(FacetField { path, list })
  }

  /// Top-level keys a projection must keep to read facets in this schema.
  pub fn facet_keys(self) -> &'static [&'static str] {
    match self {
      Self::Normalized => &["locations", "categories", "levels"],
      Self::Legacy => &["location", "category"],
    }
  }

  /// Top-level keys needed for a [`JobSummary`].
  pub fn summary_keys(self) -> &'static [&'static str] {
    match self {
      Self::Normalized => &[
        "title_raw",
        "company_name",
        "locations",
        "categories",
        "levels",
        "posted_at",
        "url",
      ],
      Self::Legacy => &["title", "company", "location", "category", "created", "url"],
    }
  }
}

// ─── Raw documents ───────────────────────────────────────────────────────────

/// A company, location or category that may be a bare string or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Labelled {
  Text(String),
  Display { display_name: String },
  Label { label: String },
  Other(Value),
}

impl Labelled {
  fn into_text(self) -> String {
    match self {
      Self::Text(s) | Self::Display { display_name: s } | Self::Label { label: s } => {
        s
      }
      Self::Other(_) => String::new(),
    }
  }
}

/// A document in the canonical pipeline's shape.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NormalizedDoc {
  #[serde(rename = "_id")]
  id:              String,
  source:          Option<String>,
  external_id:     Option<Value>,
  title_raw:       Option<String>,
  company_name:    Option<String>,
  locations:       Option<Vec<String>>,
  categories:      Option<Vec<String>>,
  levels:          Option<Vec<String>>,
  posted_at:       Option<String>,
  url:             Option<String>,
  description_raw: Option<String>,
  salary_min:      Option<f64>,
  salary_max:      Option<f64>,
  role_id:         Option<String>,
  company_id:      Option<String>,
}

/// A document in the raw Adzuna shape.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacyDoc {
  #[serde(rename = "_id")]
  id:          String,
  source:      Option<String>,
  external_id: Option<Value>,
  title:       Option<String>,
  company:     Option<Labelled>,
  location:    Option<Labelled>,
  category:    Option<Labelled>,
  created:     Option<String>,
  url:         Option<String>,
  description: Option<String>,
  salary_min:  Option<f64>,
  salary_max:  Option<f64>,
  role_id:     Option<String>,
  company_id:  Option<String>,
}

/// A stored posting tagged with its document shape.
#[derive(Debug)]
pub enum RawPosting {
  Normalized(NormalizedDoc),
  Legacy(LegacyDoc),
}

impl RawPosting {
  pub fn from_value(doc: Value) -> Result<Self> {
    Ok(match DocSchema::detect(&doc) {
      DocSchema::Normalized => Self::Normalized(serde_json::from_value(doc)?),
      DocSchema::Legacy => Self::Legacy(serde_json::from_value(doc)?),
    })
  }

  pub fn into_posting(self) -> JobPosting {
    match self {
      Self::Normalized(doc) => from_normalized(doc),
      Self::Legacy(doc) => from_legacy(doc),
    }
  }
}

fn external_id_text(id: Option<Value>) -> String {
  match id {
    Some(Value::String(s)) => s,
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  }
}

fn non_empty(s: String) -> Vec<String> {
  if s.is_empty() { Vec::new() } else { vec![s] }
}

fn from_normalized(doc: NormalizedDoc) -> JobPosting {
  JobPosting {
    id:           doc.id,
    source:       doc.source.and_then(|s| s.parse().ok()),
    external_id:  external_id_text(doc.external_id),
    title:        doc.title_raw.unwrap_or_default(),
    company_name: doc.company_name.unwrap_or_default(),
    locations:    doc.locations.unwrap_or_default(),
    categories:   doc.categories.unwrap_or_default(),
    levels:       doc.levels.unwrap_or_default(),
    posted_at:    doc.posted_at.unwrap_or_default(),
    url:          doc.url.unwrap_or_default(),
    description:  doc.description_raw.unwrap_or_default(),
    salary_min:   doc.salary_min,
    salary_max:   doc.salary_max,
    role_id:      doc.role_id,
    company_id:   doc.company_id,
  }
}

fn from_legacy(doc: LegacyDoc) -> JobPosting {
  JobPosting {
    id:           doc.id,
    source:       doc.source.and_then(|s| s.parse().ok()),
    external_id:  external_id_text(doc.external_id),
    title:        doc.title.unwrap_or_default(),
    company_name: doc.company.map(Labelled::into_text).unwrap_or_default(),
    locations:    non_empty(
      doc.location.map(Labelled::into_text).unwrap_or_default(),
    ),
    categories:   non_empty(
      doc.category.map(Labelled::into_text).unwrap_or_default(),
    ),
    levels:       Vec::new(),
    posted_at:    doc.created.unwrap_or_default(),
    url:          doc.url.unwrap_or_default(),
    description:  doc.description.unwrap_or_default(),
    salary_min:   doc.salary_min,
    salary_max:   doc.salary_max,
    role_id:      doc.role_id,
    company_id:   doc.company_id,
  }
}

// ─── JobPosting ──────────────────────────────────────────────────────────────

/// The canonical in-memory posting, independent of storage shape.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
  pub id:           String,
  /// `None` for sources this build does not know about.
  pub source:       Option<Source>,
  pub external_id:  String,
  pub title:        String,
  pub company_name: String,
  pub locations:    Vec<String>,
  pub categories:   Vec<String>,
  pub levels:       Vec<String>,
  /// ISO 8601; empty when the source did not supply one.
  pub posted_at:    String,
  pub url:          String,
  /// Plain text; HTML is stripped at ingestion.
  pub description:  String,
  pub salary_min:   Option<f64>,
  pub salary_max:   Option<f64>,
  pub role_id:      Option<String>,
  pub company_id:   Option<String>,
}

impl JobPosting {
  pub fn from_value(doc: Value) -> Result<Self> {
    Ok(RawPosting::from_value(doc)?.into_posting())
  }

  /// The recency key used for interleaving. Missing or unparseable dates are
  /// `None`, which orders below every real timestamp.
  pub fn posted_timestamp(&self) -> Option<DateTime<Utc>> {
    parse_timestamp(&self.posted_at)
  }

  pub fn summary(&self) -> JobSummary {
    JobSummary {
      id:               self.id.clone(),
      title:            self.title.clone(),
      company:          self.company_name.clone(),
      locations:        self.locations.clone(),
      categories:       self.categories.clone(),
      levels:           self.levels.clone(),
      publication_date: self.posted_at.clone(),
      landing_page_url: self.url.clone(),
      source:           self.source,
    }
  }

  pub fn into_detail(self) -> JobDetail {
    let summary = self.summary();
    JobDetail {
      summary,
      description: self.description,
      external_id: self.external_id,
      salary_min:  self.salary_min,
      salary_max:  self.salary_max,
      role_id:     self.role_id,
      company_id:  self.company_id,
    }
  }
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
    return Some(naive.and_utc());
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// Compact posting returned by search and skill matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
  pub id:               String,
  pub title:            String,
  pub company:          String,
  pub locations:        Vec<String>,
  pub categories:       Vec<String>,
  pub levels:           Vec<String>,
  pub publication_date: String,
  pub landing_page_url: String,
  pub source:           Option<Source>,
}

/// Full posting returned by point lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
  #[serde(flatten)]
  pub summary:     JobSummary,
  pub description: String,
  pub external_id: String,
  pub salary_min:  Option<f64>,
  pub salary_max:  Option<f64>,
  pub role_id:     Option<String>,
  pub company_id:  Option<String>,
}

//! Query-string parameters shared by several handlers.

use pulse_core::{posting::Source, query::SearchFilters};
use serde::Deserialize;

use crate::error::ApiError;

/// Search filters as they arrive on the query string.
///
/// Every field is kept as text so the struct can be `#[serde(flatten)]`ed
/// into handler parameters; `source` and `min_salary` are parsed by hand and
/// bad values get the same JSON error body as every other bad argument.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
  pub title:      Option<String>,
  pub company:    Option<String>,
  pub location:   Option<String>,
  pub category:   Option<String>,
  pub level:      Option<String>,
  pub source:     Option<String>,
  pub min_salary: Option<String>,
}

impl FilterParams {
  pub fn into_filters(self) -> Result<SearchFilters, ApiError> {
    Ok(SearchFilters {
      source:     parse_source(self.source.as_deref())?,
      title:      self.title,
      company:    self.company,
      location:   self.location,
      category:   self.category,
      level:      self.level,
      min_salary: parse_salary(self.min_salary.as_deref())?,
    })
  }
}

fn parse_salary(raw: Option<&str>) -> Result<Option<f64>, ApiError> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => s.parse().map(Some).map_err(|_| {
      ApiError::BadRequest(format!("min_salary must be a number, got {s:?}"))
    }),
  }
}

/// Blank means "every source".
pub fn parse_source(raw: Option<&str>) -> Result<Option<Source>, ApiError> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => s.parse().map(Some).map_err(|_| {
      ApiError::BadRequest(format!(
        "unknown source {s:?}; expected themuse or adzuna"
      ))
    }),
  }
}

/// Split a comma-separated list. Blank items are kept for the service to
/// discard.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
  raw
    .map(|s| s.split(',').map(|t| t.trim().to_owned()).collect())
    .unwrap_or_default()
}

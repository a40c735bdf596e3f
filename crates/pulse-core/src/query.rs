//! Search filters and the schema-aware selector builder.

use serde::Deserialize;

use crate::{
  alias,
  posting::{DocSchema, Facet, JOB_POST_TYPE, Source},
  selector::{Pattern, Selector},
};

/// Optional, conjunctive search filters. Text filters are case-insensitive
/// unanchored substring matches; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchFilters {
  pub title:      Option<String>,
  pub company:    Option<String>,
  /// State names and abbreviations are alias-expanded.
  pub location:   Option<String>,
  pub category:   Option<String>,
  pub level:      Option<String>,
  pub source:     Option<Source>,
  /// Keep postings whose advertised maximum salary reaches this value.
  pub min_salary: Option<f64>,
}

impl SearchFilters {
  /// The same filters pinned to one source.
  pub fn pinned(&self, source: Source) -> Self {
    Self { source: Some(source), ..self.clone() }
  }
}

fn text(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Build the storage selector for `filters`.
///
/// Text and facet filters are rendered once per document shape the query
/// can meet, and a posting matches when every filter holds in one of those
/// shapes. A pinned source narrows the shapes to the ones it is stored in.
pub fn build_selector(filters: &SearchFilters) -> Selector {
  let schemas: &[DocSchema] = match filters.source {
    Some(source) => source.schemas(),
    None => &DocSchema::BOTH,
  };
  let scope = filters.source.map(|s| Selector::eq("source", s.to_string()));

  let mut parts = vec![Selector::eq("type", JOB_POST_TYPE)];
  parts.extend(scope);
  parts.push(any_schema(schemas, |schema| schema_terms(schema, filters)));
  // Same field name in both shapes.
  if let Some(min) = filters.min_salary {
    parts.push(Selector::gte("salary_max", min));
  }

  Selector::and(parts)
}

/// Coarse description filter over every shape `source` is stored in.
pub fn description_matches(source: Source, pattern: &Pattern) -> Selector {
  any_schema(source.schemas(), |schema| {
    Some(Selector::regex(schema.description_field(), pattern.clone()))
  })
}

/// One branch per schema, joined by `$or`. Branches that cannot match are
/// dropped; with none left the empty disjunction matches nothing.
fn any_schema(
  schemas: &[DocSchema],
  branch: impl Fn(DocSchema) -> Option<Selector>,
) -> Selector {
  let branches: Vec<_> = schemas.iter().filter_map(|s| branch(*s)).collect();
  if branches.contains(&Selector::All) {
    Selector::All
  } else {
    Selector::or(branches)
  }
}

/// The text and facet filters in `schema`'s field names, or `None` when a
/// filter names a facet the schema does not have.
fn schema_terms(schema: DocSchema, filters: &SearchFilters) -> Option<Selector> {
  let mut terms = Vec::new();
  if let Some(title) = text(&filters.title) {
    terms.push(Selector::regex(schema.title_field(), Pattern::substring(title)));
  }
  if let Some(company) = text(&filters.company) {
    terms.push(Selector::regex(
      schema.company_field(),
      Pattern::substring(company),
    ));
  }
  if let Some(location) = text(&filters.location) {
    terms.push(facet(schema, Facet::Locations, alias::expand(location))?);
  }
  if let Some(category) = text(&filters.category) {
    terms.push(facet(schema, Facet::Categories, Pattern::substring(category))?);
  }
  if let Some(level) = text(&filters.level) {
    terms.push(facet(schema, Facet::Levels, Pattern::substring(level))?);
  }
  Some(Selector::and(terms))
}

fn facet(schema: DocSchema, facet: Facet, pattern: Pattern) -> Option<Selector> {
  let field = schema.facet_field(facet)?;
  Some(if field.list {
    Selector::elem_match(field.path, pattern)
  } else {
    Selector::regex(field.path, pattern)
  })
}

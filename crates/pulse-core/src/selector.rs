//! Storage selectors: the structured predicates understood by a
//! [`DocumentStore`](crate::store::DocumentStore).
//!
//! A [`Selector`] is a small boolean AST over dotted field paths in a JSON
//! document. Backends translate it into their native query language; the
//! in-process evaluator [`Selector::matches`] defines the reference semantics
//! and is what the test fakes use.

use regex::Regex;
use serde_json::{Map, Value, json};

// ─── Pattern ─────────────────────────────────────────────────────────────────

/// A case-insensitive, unanchored regular expression in `regex` crate syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
  /// Literal substring match; all metacharacters in `text` are escaped.
  pub fn substring(text: &str) -> Self {
    Self(format!("(?i){}", regex::escape(text)))
  }

  /// Wrap an already-escaped expression body.
  pub(crate) fn from_body(body: &str) -> Self { Self(format!("(?i){body}")) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn compile(&self) -> Result<Regex, regex::Error> { Regex::new(&self.0) }
}

// ─── Selector ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
  /// Matches every document.
  All,
  /// Field equals a JSON value.
  Eq { field: String, value: Value },
  /// Field equals one of the listed values. An empty list matches nothing.
  In { field: String, values: Vec<Value> },
  /// String field matches the pattern.
  Regex { field: String, pattern: Pattern },
  /// Array field has at least one string element matching the pattern.
  ElemMatch { field: String, pattern: Pattern },
  /// Numeric field is greater than or equal to `value`.
  Gte { field: String, value: f64 },
  And(Vec<Selector>),
  Or(Vec<Selector>),
}

impl Selector {
  pub fn eq(field: &str, value: impl Into<Value>) -> Self {
    Self::Eq { field: field.to_owned(), value: value.into() }
  }

  pub fn one_of<V: Into<Value>>(
    field: &str,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    Self::In {
      field:  field.to_owned(),
      values: values.into_iter().map(Into::into).collect(),
    }
  }

  pub fn regex(field: &str, pattern: Pattern) -> Self {
    Self::Regex { field: field.to_owned(), pattern }
  }

  pub fn elem_match(field: &str, pattern: Pattern) -> Self {
    Self::ElemMatch { field: field.to_owned(), pattern }
  }

  pub fn gte(field: &str, value: f64) -> Self {
    Self::Gte { field: field.to_owned(), value }
  }

  /// Conjunction that drops `All` operands and collapses trivial cases.
  pub fn and(parts: impl IntoIterator<Item = Selector>) -> Self {
    let mut parts: Vec<_> =
      parts.into_iter().filter(|p| *p != Self::All).collect();
    match parts.len() {
      0 => Self::All,
      1 => parts.remove(0),
      _ => Self::And(parts),
    }
  }

  /// Disjunction that collapses a single operand. An empty disjunction
  /// matches nothing.
  pub fn or(parts: impl IntoIterator<Item = Selector>) -> Self {
    let mut parts: Vec<_> = parts.into_iter().collect();
    if parts.len() == 1 {
      parts.remove(0)
    } else {
      Self::Or(parts)
    }
  }

  /// Evaluate the selector against a document.
  ///
  /// Invalid patterns never match.
  pub fn matches(&self, doc: &Value) -> bool {
    match self {
      Self::All => true,
      Self::Eq { field, value } => lookup(doc, field) == Some(value),
      Self::In { field, values } => {
        lookup(doc, field).is_some_and(|found| values.contains(found))
      }
      Self::Regex { field, pattern } => {
        let Some(text) = lookup(doc, field).and_then(Value::as_str) else {
          return false;
        };
        pattern.compile().is_ok_and(|re| re.is_match(text))
      }
      Self::ElemMatch { field, pattern } => {
        let Some(items) = lookup(doc, field).and_then(Value::as_array) else {
          return false;
        };
        let Ok(re) = pattern.compile() else { return false };
        items.iter().filter_map(Value::as_str).any(|s| re.is_match(s))
      }
      Self::Gte { field, value } => lookup(doc, field)
        .and_then(Value::as_f64)
        .is_some_and(|v| v >= *value),
      Self::And(parts) => parts.iter().all(|p| p.matches(doc)),
      Self::Or(parts) => parts.iter().any(|p| p.matches(doc)),
    }
  }

  /// Render as a Mango (CouchDB / Cloudant) selector object.
  pub fn to_mango(&self) -> Value {
    match self {
      Self::All => json!({}),
      Self::Eq { field, value } => single(field, value.clone()),
      Self::In { field, values } => single(field, json!({ "$in": values })),
      Self::Regex { field, pattern } => {
        single(field, json!({ "$regex": pattern.as_str() }))
      }
      Self::ElemMatch { field, pattern } => single(
        field,
        json!({ "$elemMatch": { "$regex": pattern.as_str() } }),
      ),
      Self::Gte { field, value } => single(field, json!({ "$gte": value })),
      Self::And(parts) => {
        json!({ "$and": parts.iter().map(Self::to_mango).collect::<Vec<_>>() })
      }
      Self::Or(parts) => {
        json!({ "$or": parts.iter().map(Self::to_mango).collect::<Vec<_>>() })
      }
    }
  }
}

fn single(field: &str, value: Value) -> Value {
  let mut map = Map::new();
  map.insert(field.to_owned(), value);
  Value::Object(map)
}

/// Resolve a dotted path such as `company.display_name`.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
  path.split('.').try_fold(doc, |node, key| node.get(key))
}

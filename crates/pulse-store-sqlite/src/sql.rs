//! Translation of [`Selector`]s into SQL over the `documents.body` column.
//!
//! Every predicate checks the JSON type of its field first, so the SQL
//! agrees with [`Selector::matches`]: regexes only see strings, element
//! matches only see arrays and numeric comparisons only see numbers.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use pulse_core::selector::Selector;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::{Error, Result};

/// A `WHERE` fragment and its positional parameters, in order.
#[derive(Debug, Default)]
pub struct Clause {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

pub fn translate(selector: &Selector) -> Clause {
  let mut clause = Clause::default();
  clause.sql = write(selector, &mut clause.params);
  clause
}

fn write(selector: &Selector, params: &mut Vec<SqlValue>) -> String {
  match selector {
    Selector::All => "1".into(),
    Selector::Eq { field, value } => eq(field, value, params),
    Selector::In { field, values } => {
      if values.is_empty() {
        return "0".into();
      }
      let sql: Vec<String> =
        values.iter().map(|v| eq(field, v, params)).collect();
      format!("({})", sql.join(" OR "))
    }
    Selector::Regex { field, pattern } => {
      params.push(path(field));
      params.push(SqlValue::Text(pattern.as_str().to_owned()));
      params.push(path(field));
      "(json_type(body, ?) = 'text' AND regexp(?, json_extract(body, ?)))".into()
    }
    Selector::ElemMatch { field, pattern } => {
      params.push(path(field));
      params.push(path(field));
      params.push(SqlValue::Text(pattern.as_str().to_owned()));
      "(json_type(body, ?) = 'array' AND EXISTS (
          SELECT 1 FROM json_each(body, ?) AS e
          WHERE e.type = 'text' AND regexp(?, e.value)))"
        .into()
    }
    Selector::Gte { field, value } => {
      params.push(path(field));
      params.push(path(field));
      params.push(SqlValue::Real(*value));
      "(json_type(body, ?) IN ('integer', 'real') AND json_extract(body, ?) >= ?)"
        .into()
    }
    Selector::And(parts) => join(parts, " AND ", "1", params),
    Selector::Or(parts) => join(parts, " OR ", "0", params),
  }
}

fn join(
  parts: &[Selector],
  op: &str,
  empty: &str,
  params: &mut Vec<SqlValue>,
) -> String {
  if parts.is_empty() {
    return empty.into();
  }
  let sql: Vec<String> = parts.iter().map(|p| write(p, params)).collect();
  format!("({})", sql.join(op))
}

fn eq(field: &str, value: &Value, params: &mut Vec<SqlValue>) -> String {
  params.push(path(field));
  let (json_types, param) = match value {
    Value::Null => return "json_type(body, ?) = 'null'".into(),
    Value::Bool(true) => ("('true')", SqlValue::Integer(1)),
    Value::Bool(false) => ("('false')", SqlValue::Integer(0)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => ("('integer', 'real')", SqlValue::Integer(i)),
      None => ("('integer', 'real')", SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))),
    },
    Value::String(s) => ("('text')", SqlValue::Text(s.clone())),
    // Compared in SQLite's minified JSON text form.
    Value::Array(_) => ("('array')", SqlValue::Text(value.to_string())),
    Value::Object(_) => ("('object')", SqlValue::Text(value.to_string())),
  };
  params.push(path(field));
  params.push(param);
  format!("(json_type(body, ?) IN {json_types} AND json_extract(body, ?) = ?)")
}

/// A dotted field name as a JSON path with every key quoted.
fn path(field: &str) -> SqlValue {
  let mut path = String::from("$");
  for key in field.split('.') {
    path.push_str(".\"");
    path.push_str(&key.replace('"', "\\\""));
    path.push('"');
  }
  SqlValue::Text(path)
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

/// Bookmarks are the last returned document id, base64url-encoded.
pub fn encode_bookmark(doc_id: &str) -> String { URL_SAFE_NO_PAD.encode(doc_id) }

pub fn decode_bookmark(bookmark: &str) -> Result<String> {
  let bytes = URL_SAFE_NO_PAD
    .decode(bookmark)
    .map_err(|e| Error::InvalidBookmark(e.to_string()))?;
  String::from_utf8(bytes).map_err(|e| Error::InvalidBookmark(e.to_string()))
}

//! Scalar functions registered on every connection.

use std::sync::Arc;

use regex::Regex;
use rusqlite::{Connection, functions::FunctionFlags};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// `regexp(pattern, text)`: `true` when `text` is a string matching
/// `pattern`. Non-text values never match. The compiled pattern is cached
/// per call site for the life of the statement.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "regexp",
    2,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let re: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
        Ok(Regex::new(vr.as_str()?)?)
      })?;
      Ok(ctx.get_raw(1).as_str().is_ok_and(|text| re.is_match(text)))
    },
  )
}

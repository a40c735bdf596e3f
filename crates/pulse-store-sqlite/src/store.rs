//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::{path::Path, time::Duration};

use rusqlite::OptionalExtension as _;
use serde_json::{Map, Value};
use tracing::debug;

use pulse_core::store::{DocumentStore, DocumentWriter, FindPage, FindRequest};

use crate::{
  Error, Result, functions,
  schema::SCHEMA,
  sql::{Clause, decode_bookmark, encode_bookmark, translate},
};

/// How long a statement waits on a locked database before reporting busy.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        functions::register(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored documents of any type.
  pub async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?)
      })
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }
}

/// Keep `_id` and the requested top-level keys.
fn project(doc: Value, fields: Option<&[String]>) -> Value {
  match (fields, doc) {
    (Some(fields), Value::Object(mut map)) => {
      let mut out = Map::new();
      if let Some(id) = map.remove("_id") {
        out.insert("_id".into(), id);
      }
      for field in fields {
        if let Some(v) = map.remove(field) {
          out.insert(field.clone(), v);
        }
      }
      Value::Object(out)
    }
    (_, doc) => doc,
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn find(&self, request: &FindRequest) -> Result<FindPage> {
    if request.limit == 0 {
      return Ok(FindPage::default());
    }

    let Clause { sql: mut where_sql, mut params } = translate(&request.selector);
    if let Some(bookmark) = &request.bookmark {
      where_sql = format!("({where_sql}) AND doc_id > ?");
      params.push(decode_bookmark(bookmark)?.into());
    }
    params.push(i64::try_from(request.limit).unwrap_or(i64::MAX).into());
    params.push(i64::try_from(request.skip).unwrap_or(i64::MAX).into());

    let sql = format!(
      "SELECT doc_id, body FROM documents
       WHERE {where_sql}
       ORDER BY doc_id
       LIMIT ? OFFSET ?"
    );
    debug!(%sql, "find");

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let bookmark = match rows.last() {
      Some((id, _)) if rows.len() == request.limit => Some(encode_bookmark(id)),
      _ => None,
    };
    let docs = rows
      .into_iter()
      .map(|(_, body)| {
        let doc: Value = serde_json::from_str(&body)?;
        Ok(project(doc, request.fields.as_deref()))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(FindPage { docs, bookmark })
  }

  async fn get(&self, id: &str) -> Result<Option<Value>> {
    let id = id.to_owned();
    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body FROM documents WHERE doc_id = ?1",
              rusqlite::params![id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
  }
}

impl DocumentWriter for SqliteStore {
  /// The stored body always carries `_id` equal to the key.
  async fn put(&self, id: &str, doc: Value) -> Result<()> {
    let Value::Object(mut map) = doc else {
      return Err(Error::NotAnObject(id.to_owned()));
    };
    map.insert("_id".into(), Value::String(id.to_owned()));
    let body = Value::Object(map).to_string();
    let id = id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (doc_id, body) VALUES (?1, ?2)
           ON CONFLICT(doc_id) DO UPDATE SET body = excluded.body",
          rusqlite::params![id, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

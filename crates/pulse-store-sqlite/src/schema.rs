//! SQL schema for the Market Pulse SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. Writes replace the whole body.
CREATE TABLE IF NOT EXISTS documents (
    doc_id  TEXT PRIMARY KEY,
    body    TEXT NOT NULL CHECK (json_valid(body))
);

CREATE INDEX IF NOT EXISTS documents_type_idx
    ON documents(json_extract(body, '$.type'));

PRAGMA user_version = 1;
";

//! JSON Lines import and role seeding.
//!
//! Each input line is one posting document in a shape its source is stored
//! in (normalized for The Muse; raw or normalized for Adzuna). The importer stamps
//! identity, role and company references onto it and writes it under its
//! [`PostingKey`], replacing any earlier copy.

use std::{collections::HashSet, path::Path, time::Instant};

use anyhow::{Context as _, anyhow, bail};
use pulse_core::{
  company::{company_doc_id, company_slug},
  posting::{DocSchema, JOB_POST_TYPE, JobPosting, PostingKey, Source},
  role::{DEFAULT_ROLES, classify},
  store::DocumentWriter,
};
use serde_json::{Map, Value, json};
use tokio::{
  fs::File,
  io::{AsyncBufRead, AsyncBufReadExt as _, BufReader},
};
use tracing::{info, warn};

/// Outcome of one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
  pub postings:  usize,
  pub companies: usize,
  pub skipped:   usize,
}

/// A validated record, ready to write.
struct Prepared {
  key:          PostingKey,
  company_id:   String,
  company_name: String,
  doc:          Value,
}

pub async fn import_file<W: DocumentWriter>(
  store: &W,
  path: &Path,
) -> anyhow::Result<ImportReport> {
  let file = File::open(path)
    .await
    .with_context(|| format!("failed to open {}", path.display()))?;
  import_lines(store, BufReader::new(file)).await
}

/// Import every record in `reader`. Malformed records are logged and
/// skipped; a failed write aborts the run.
pub async fn import_lines<W, R>(store: &W, reader: R) -> anyhow::Result<ImportReport>
where
  W: DocumentWriter,
  R: AsyncBufRead + Unpin,
{
  let started = Instant::now();
  let mut report = ImportReport::default();
  let mut written_companies = HashSet::new();
  let mut lines = reader.lines();
  let mut line_no = 0usize;

  while let Some(line) = lines.next_line().await.context("failed to read input")? {
    line_no += 1;
    if line.trim().is_empty() {
      continue;
    }
    let record = match prepare(&line) {
      Ok(record) => record,
      Err(e) => {
        warn!(line = line_no, error = %format!("{e:#}"), "skipping record");
        report.skipped += 1;
        continue;
      }
    };

    if written_companies.insert(record.company_id.clone()) {
      store
        .put(&record.company_id, company_doc(&record.company_name))
        .await
        .with_context(|| format!("failed to write {}", record.company_id))?;
      report.companies += 1;
    }
    store
      .put(record.key.as_str(), record.doc)
      .await
      .with_context(|| format!("failed to write {}", record.key))?;
    report.postings += 1;
  }

  info!(
    postings = report.postings,
    companies = report.companies,
    skipped = report.skipped,
    elapsed_ms = started.elapsed().as_millis() as u64,
    "import finished"
  );
  Ok(report)
}

fn prepare(line: &str) -> anyhow::Result<Prepared> {
  let doc: Value = serde_json::from_str(line).context("invalid JSON")?;
  let Value::Object(mut map) = doc else {
    bail!("record is not a JSON object");
  };

  let source: Source = match map.get("source") {
    Some(Value::String(s)) => s.parse().map_err(|_| anyhow!("unknown source {s:?}"))?,
    _ => bail!("missing source"),
  };
  let external_id = match map.get("external_id") {
    Some(Value::String(s)) => s.trim().to_owned(),
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  };
  if external_id.is_empty() {
    bail!("missing external_id");
  }

  let schema = DocSchema::detect(&Value::Object(map.clone()));
  if !source.schemas().contains(&schema) {
    bail!("{source} records cannot use the {schema:?} document shape");
  }

  // Type-checks every field the query layer reads.
  let posting =
    JobPosting::from_value(Value::Object(map.clone())).context("unreadable posting")?;
  let company_id = company_doc_id(&posting.company_name);

  map.insert("type".into(), JOB_POST_TYPE.into());
  map.insert("source".into(), source.to_string().into());
  map.insert("external_id".into(), external_id.clone().into());
  map.insert("role_id".into(), classify(&posting.title, DEFAULT_ROLES).into());
  map.insert("company_id".into(), company_id.clone().into());

  Ok(Prepared {
    key: PostingKey::new(source, &external_id),
    company_id,
    company_name: posting.company_name,
    doc: Value::Object(map),
  })
}

fn company_doc(name: &str) -> Value {
  let name = name.trim();
  json!({
    "type": "company",
    "name": if name.is_empty() { "Unknown" } else { name },
    "normalized_name": company_slug(name).replace('-', " "),
    "created_at": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
  })
}

/// Upsert the default role documents. Safe to run repeatedly.
pub async fn ensure_roles<W: DocumentWriter>(store: &W) -> anyhow::Result<usize> {
  for role in DEFAULT_ROLES {
    let mut doc = Map::new();
    doc.insert("type".into(), "role".into());
    doc.insert("name".into(), role.name.into());
    doc.insert("keywords".into(), json!(role.keywords));
    store
      .put(&role.doc_id(), Value::Object(doc))
      .await
      .with_context(|| format!("failed to write {}", role.doc_id()))?;
  }
  info!(roles = DEFAULT_ROLES.len(), "roles ensured");
  Ok(DEFAULT_ROLES.len())
}

#[cfg(test)]
mod tests {
  use pulse_core::store::DocumentStore as _;
  use pulse_store_sqlite::SqliteStore;

  use super::*;

  const INPUT: &str = r#"
{"source": "themuse", "external_id": 101, "title_raw": "Senior Python Developer", "company_name": "Acme Corp.", "locations": ["New York, NY"], "description_raw": "Python"}
{"source": "adzuna", "external_id": "a-7", "title": "SRE", "company": {"display_name": "ACME corp"}, "location": {"display_name": "Austin, Texas"}}

not json
{"source": "linkedin", "external_id": "1", "title_raw": "Dev"}
{"source": "themuse", "external_id": "5", "title": "Dev", "company": {"display_name": "Hooli"}}
{"source": "adzuna", "external_id": "a-8", "title_raw": "Data Scientist", "company_name": "Acme Corp", "locations": ["Reno, NV"], "description_raw": "Python"}
{"source": "themuse", "title_raw": "Dev"}
{"source": "themuse", "external_id": 101, "title_raw": "Barista", "company_name": "Acme Corp.", "locations": ["Boston, MA"]}
"#;

  async fn imported() -> (SqliteStore, ImportReport) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let report = import_lines(&store, INPUT.as_bytes()).await.unwrap();
    (store, report)
  }

  #[tokio::test]
  async fn import_counts_written_and_skipped_records() {
    let (_, report) = imported().await;
    assert_eq!(report, ImportReport { postings: 4, companies: 1, skipped: 4 });
  }

  #[tokio::test]
  async fn reimport_overwrites_by_identity() {
    let (store, _) = imported().await;
    // Three postings plus one company.
    assert_eq!(store.count().await.unwrap(), 4);
    let doc = store.get("job_post:themuse:101").await.unwrap().unwrap();
    assert_eq!(doc["title_raw"], "Barista");
    assert_eq!(doc["locations"], json!(["Boston, MA"]));
    assert!(doc.get("description_raw").is_none());
  }

  #[tokio::test]
  async fn postings_carry_type_role_and_company() {
    let (store, _) = imported().await;
    let doc = store.get("job_post:adzuna:a-7").await.unwrap().unwrap();
    assert_eq!(doc["type"], "job_post");
    assert_eq!(doc["external_id"], "a-7");
    assert_eq!(doc["role_id"], "role:devops");
    assert_eq!(doc["company_id"], "company:acme-corp");

    let muse = store.get("job_post:themuse:101").await.unwrap().unwrap();
    assert_eq!(muse["external_id"], "101");
    assert_eq!(muse["role_id"], "role:other");
  }

  #[tokio::test]
  async fn adzuna_accepts_both_shapes_and_muse_only_normalized() {
    let (store, _) = imported().await;
    let rewritten = store.get("job_post:adzuna:a-8").await.unwrap().unwrap();
    assert_eq!(rewritten["title_raw"], "Data Scientist");
    assert_eq!(rewritten["role_id"], "role:data-scientist");
    assert_eq!(rewritten["company_id"], "company:acme-corp");
    assert!(store.get("job_post:themuse:5").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn spelling_variants_share_one_company() {
    let (store, _) = imported().await;
    let company = store.get("company:acme-corp").await.unwrap().unwrap();
    assert_eq!(company["type"], "company");
    assert_eq!(company["name"], "Acme Corp.");
    assert_eq!(company["normalized_name"], "acme corp");
  }

  #[tokio::test]
  async fn ensure_roles_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert_eq!(ensure_roles(&store).await.unwrap(), DEFAULT_ROLES.len());
    ensure_roles(&store).await.unwrap();
    assert_eq!(store.count().await.unwrap(), DEFAULT_ROLES.len());

    let devops = store.get("role:devops").await.unwrap().unwrap();
    assert_eq!(devops["name"], "DevOps / SRE");
    assert_eq!(devops["type"], "role");
  }
}

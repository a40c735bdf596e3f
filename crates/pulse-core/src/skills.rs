//! Skill vocabulary, word-boundary skill patterns and the skill matcher.
//!
//! Matching runs in two passes. The store is asked for candidates whose
//! description contains any requested skill as a plain substring; that
//! superset is then re-scored here with one word-boundary pattern per skill.
//! Only the second pass decides ranking.

use std::{cmp::Reverse, collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{
  Error, Result,
  posting::{JobPosting, JobSummary, Source},
  query::{SearchFilters, build_selector, description_matches},
  scan::{RetryPolicy, find_with_retry},
  search::summary_fields,
  selector::{Pattern, Selector},
  store::{DocumentStore, FindRequest},
};

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// Recognised skills, grouped by kind. Declaration order breaks trending ties.
pub const VOCABULARY: &[&str] = &[
  // Languages
  "Python", "Java", "JavaScript", "TypeScript", "C++", "C#", "Go", "Rust",
  "Ruby", "Scala", "Kotlin", "Swift", "PHP", "R", "MATLAB", "Perl", "Shell",
  "Bash", "SQL", "HTML", "CSS",
  // Frameworks and libraries
  "React", "Angular", "Vue", "Node.js", "Django", "Flask", "FastAPI", "Spring",
  ".NET", "Express", "Next.js", "Rails", "Laravel", "TensorFlow", "PyTorch",
  "Keras", "Pandas", "NumPy", "Scikit-learn", "Spark", "Hadoop",
  // Cloud and infrastructure
  "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Terraform", "Ansible",
  "Jenkins", "CI/CD", "Linux", "Git", "GitHub", "GitLab", "Nginx",
  // Data
  "NoSQL", "PostgreSQL", "MySQL", "MongoDB", "Redis", "Elasticsearch",
  "Cassandra", "Snowflake", "BigQuery", "Redshift", "Kafka", "Airflow", "dbt",
  "ETL",
  // AI and ML
  "Machine Learning", "Deep Learning", "NLP", "Computer Vision", "LLM", "GPT",
  "Generative AI", "Data Science", "Neural Network", "Reinforcement Learning",
  // Practices
  "Agile", "Scrum", "DevOps", "Microservices", "REST", "GraphQL", "API",
  "Cybersecurity", "Blockchain", "Cloud Computing",
];

static COMPILED_VOCABULARY: LazyLock<Vec<SkillPattern>> = LazyLock::new(|| {
  VOCABULARY
    .iter()
    .filter_map(|skill| SkillPattern::new(skill).ok())
    .collect()
});

/// The vocabulary, compiled once per process.
pub fn vocabulary() -> &'static [SkillPattern] { &COMPILED_VOCABULARY }

// ─── Patterns ────────────────────────────────────────────────────────────────

/// A case-insensitive, whole-word matcher for one skill name.
///
/// A `\b` anchor is placed only on an end that is a word character, so
/// names like `C++`, `C#` and `.NET` still match where they appear.
#[derive(Debug, Clone)]
pub struct SkillPattern {
  name: String,
  re:   Regex,
}

impl SkillPattern {
  pub fn new(name: &str) -> Result<Self, regex::Error> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if name.starts_with(is_word) { r"\b" } else { "" };
    let trail = if name.ends_with(is_word) { r"\b" } else { "" };
    let re = Regex::new(&format!("(?i){lead}{}{trail}", regex::escape(name)))?;
    Ok(Self { name: name.to_owned(), re })
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn is_match(&self, text: &str) -> bool { self.re.is_match(text) }
}

/// Trim, drop blanks and remove case-insensitive duplicates, keeping the
/// first spelling.
pub fn normalize_skills<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
  let mut seen = HashSet::new();
  raw
    .iter()
    .map(|s| s.as_ref().trim())
    .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
    .map(str::to_owned)
    .collect()
}

/// Storage prefilter: the description contains any of `skills` as a
/// substring. Always a superset of what [`score`] accepts.
pub fn coarse_pattern(skills: &[String]) -> Pattern {
  let body = skills
    .iter()
    .map(|s| regex::escape(s))
    .collect::<Vec<_>>()
    .join("|");
  Pattern::from_body(&format!("(?:{body})"))
}

/// Names of the distinct skills mentioned in `text`, in `skills` order.
pub fn score(text: &str, skills: &[SkillPattern]) -> Vec<String> {
  skills
    .iter()
    .filter(|s| s.is_match(text))
    .map(|s| s.name.clone())
    .collect()
}

// ─── Matching ────────────────────────────────────────────────────────────────

/// One ranked posting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatch {
  pub job:            JobSummary,
  /// Number of distinct requested skills found.
  pub score:          usize,
  pub matched_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatches {
  pub skills:  Vec<String>,
  pub results: Vec<SkillMatch>,
}

/// Rank postings by how many of `skills` their description mentions.
///
/// `skills` is expected to be normalised already. Each active source is
/// asked for `factor * limit` prefiltered candidates; postings that score
/// zero are dropped and ties keep their fetch order.
pub async fn match_skills<S: DocumentStore>(
  store: &S,
  skills: Vec<String>,
  source: Option<Source>,
  limit: usize,
  factor: usize,
  policy: RetryPolicy,
) -> Result<SkillMatches> {
  if skills.is_empty() || limit == 0 {
    return Ok(SkillMatches { skills, results: Vec::new() });
  }

  let patterns = skills
    .iter()
    .map(|s| SkillPattern::new(s))
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| Error::InvalidArgument(format!("skill pattern: {e}")))?;
  let coarse = coarse_pattern(&skills);
  let candidates = limit.saturating_mul(factor.max(1));

  let mut results = Vec::new();
  for source in Source::active(source) {
    let selector = Selector::and([
      build_selector(&SearchFilters::default().pinned(source)),
      description_matches(source, &coarse),
    ]);
    let mut fields = summary_fields();
    fields.extend(source.schemas().iter().map(|s| s.description_field()));

    let request = FindRequest::new(selector, candidates).with_fields(fields);
    let page = find_with_retry(store, &request, policy).await?;
    debug!(%source, candidates = page.docs.len(), "skill candidates");

    for doc in page.docs {
      let posting = JobPosting::from_value(doc)?;
      let matched_skills = score(&posting.description, &patterns);
      if matched_skills.is_empty() {
        continue;
      }
      results.push(SkillMatch {
        job: posting.summary(),
        score: matched_skills.len(),
        matched_skills,
      });
    }
  }

  results.sort_by_key(|m| Reverse(m.score));
  results.truncate(limit);
  Ok(SkillMatches { skills, results })
}

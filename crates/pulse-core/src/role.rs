//! Canonical role taxonomy and title classification.

use serde::Serialize;

/// A canonical role. Keywords are lower-case substrings matched against raw
/// titles, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Role {
  pub id:       &'static str,
  pub name:     &'static str,
  pub keywords: &'static [&'static str],
}

impl Role {
  /// Document key: `role:{id}`.
  pub fn doc_id(&self) -> String { role_doc_id(self.id) }
}

pub const OTHER_ROLE_ID: &str = "other";

/// First matching role wins, so more specific roles come first.
pub const DEFAULT_ROLES: &[Role] = &[
  Role {
    id:       "software-engineer",
    name:     "Software Engineer",
    keywords: &[
      "software engineer",
      "backend engineer",
      "frontend engineer",
      "full stack",
      "fullstack",
      "python developer",
      "python architect",
      "java developer",
      "developer",
      "engineer",
      "architect",
      "programmer",
      "software development",
      "application developer",
    ],
  },
  Role {
    id:       "data-scientist",
    name:     "Data Scientist",
    keywords: &[
      "data scientist",
      "data engineer",
      "data analyst",
      "analytics",
      "machine learning",
      "ml engineer",
      "ai engineer",
      "research scientist",
    ],
  },
  Role {
    id:       "devops",
    name:     "DevOps / SRE",
    keywords: &[
      "devops",
      "sre",
      "site reliability",
      "platform engineer",
      "cloud engineer",
      "infrastructure",
    ],
  },
  Role {
    id:       "product-manager",
    name:     "Product Manager",
    keywords: &["product manager", "product owner", "technical product"],
  },
  Role { id: OTHER_ROLE_ID, name: "Other", keywords: &[] },
];

pub fn role_doc_id(id: &str) -> String { format!("role:{id}") }

/// Map a raw job title to a role document key. Blank or unmatched titles
/// classify as `role:other`.
pub fn classify(title: &str, roles: &[Role]) -> String {
  let normalized = title.trim().to_lowercase();
  if normalized.is_empty() {
    return role_doc_id(OTHER_ROLE_ID);
  }

  roles
    .iter()
    .filter(|role| role.id != OTHER_ROLE_ID)
    .find(|role| {
      role
        .keywords
        .iter()
        .any(|kw| !kw.is_empty() && normalized.contains(&kw.to_lowercase()))
    })
    .map_or_else(|| role_doc_id(OTHER_ROLE_ID), Role::doc_id)
}

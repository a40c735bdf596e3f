//! Company slugs: one canonical key per employer across spelling variants.

/// Lower-case, collapse every run of non-alphanumerics into one hyphen and
/// trim hyphens from both ends. Empty input yields `unknown`.
pub fn company_slug(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  for ch in name.trim().chars().flat_map(char::to_lowercase) {
    if ch.is_ascii_alphanumeric() {
      slug.push(ch);
    } else if !slug.is_empty() && !slug.ends_with('-') {
      slug.push('-');
    }
  }
  let slug = slug.trim_end_matches('-');
  if slug.is_empty() { "unknown".to_owned() } else { slug.to_owned() }
}

/// Document key: `company:{slug}`.
pub fn company_doc_id(name: &str) -> String {
  format!("company:{}", company_slug(name))
}

//! Location alias expansion: US state full names ↔ postal abbreviations.
//!
//! Location strings in postings follow the `"<city>, <ST>"` convention, so a
//! query for a state has to match either spelling.

use crate::selector::Pattern;

/// `(full name, abbreviation)`, lower-cased.
const US_STATES: [(&str, &str); 50] = [
  ("alabama", "al"),
  ("alaska", "ak"),
  ("arizona", "az"),
  ("arkansas", "ar"),
  ("california", "ca"),
  ("colorado", "co"),
  ("connecticut", "ct"),
  ("delaware", "de"),
  ("florida", "fl"),
  ("georgia", "ga"),
  ("hawaii", "hi"),
  ("idaho", "id"),
  ("illinois", "il"),
  ("indiana", "in"),
  ("iowa", "ia"),
  ("kansas", "ks"),
  ("kentucky", "ky"),
  ("louisiana", "la"),
  ("maine", "me"),
  ("maryland", "md"),
  ("massachusetts", "ma"),
  ("michigan", "mi"),
  ("minnesota", "mn"),
  ("mississippi", "ms"),
  ("missouri", "mo"),
  ("montana", "mt"),
  ("nebraska", "ne"),
  ("nevada", "nv"),
  ("new hampshire", "nh"),
  ("new jersey", "nj"),
  ("new mexico", "nm"),
  ("new york", "ny"),
  ("north carolina", "nc"),
  ("north dakota", "nd"),
  ("ohio", "oh"),
  ("oklahoma", "ok"),
  ("oregon", "or"),
  ("pennsylvania", "pa"),
  ("rhode island", "ri"),
  ("south carolina", "sc"),
  ("south dakota", "sd"),
  ("tennessee", "tn"),
  ("texas", "tx"),
  ("utah", "ut"),
  ("vermont", "vt"),
  ("virginia", "va"),
  ("washington", "wa"),
  ("west virginia", "wv"),
  ("wisconsin", "wi"),
  ("wyoming", "wy"),
];

fn abbreviation_of(full_name: &str) -> Option<&'static str> {
  US_STATES
    .iter()
    .find(|(name, _)| *name == full_name)
    .map(|(_, abbr)| *abbr)
}

fn full_name_of(abbreviation: &str) -> Option<&'static str> {
  US_STATES
    .iter()
    .find(|(_, abbr)| *abbr == abbreviation)
    .map(|(name, _)| *name)
}

/// Expand a location query into a case-insensitive match pattern.
///
/// - Full state name: the literal text, or `", <ST>"` as a whole word.
/// - State abbreviation: the abbreviation as a whole word, or the full name.
/// - Anything else: a plain substring match.
pub fn expand(location: &str) -> Pattern {
  let literal = location.trim();
  let key = literal.to_lowercase();

  if let Some(abbr) = abbreviation_of(&key) {
    return Pattern::from_body(&format!(
      r"(?:{}|, {abbr}\b)",
      regex::escape(literal)
    ));
  }

  if let Some(name) = full_name_of(&key) {
    // Bare two-letter codes collide with fragments of city names ("Arcata").
    return Pattern::from_body(&format!(r"(?:\b{key}\b|{name})"));
  }

  Pattern::substring(literal)
}

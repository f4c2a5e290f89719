//! Parsing of calendar titles such as `(indie-rock) 8pm» Neon Trees w/ Fictionist, Echo & Shake`.

use once_cell::sync::Lazy;
use regex::Regex;

static GENRE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\([^)]+\)\s*").unwrap());
static TIME_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\d{1,2}(:\d{2})?\s*(am|pm)[»\s]*").unwrap());
static NOT_A_LINEUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\d+|mon|tue|wed|thu|fri|sat|sun)$").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),\s*|\s+and\s+|\s+&\s+").unwrap());
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const HEADLINER_SEPARATOR: &str = " w/ ";

/// Drops the genre and start-time prefixes and surrounding quotes.
pub fn strip_prefixes(title: &str) -> String {
  let title = GENRE_PREFIX.replace(title.trim(), "");
  let title = TIME_PREFIX.replace(&title, "");
  title.trim().trim_matches('"').trim().to_string()
}

/// Splits a comma/`and`/`&` separated list.
pub fn split_names(list: &str) -> Vec<String> {
  SEPARATORS.split(list).map(str::trim).filter(|p| !p.is_empty()).map(String::from).collect()
}

/// Raw names of a lineup title, before cleaning. Titles without a `w/`
/// headliner marker or a comma are not lineups.
pub fn split_lineup(title: &str) -> Vec<String> {
  let text = strip_prefixes(title);
  if NOT_A_LINEUP.is_match(&text) {
    return Vec::new();
  }

  match text.split_once(HEADLINER_SEPARATOR) {
    Some((headliner, openers)) => {
      let mut names = vec![headliner.trim().to_string()];
      names.extend(split_names(openers));
      names
    }
    None if text.contains(',') => split_names(&text),
    None => Vec::new(),
  }
}

/// Cleans one raw name; `None` when what is left is not an artist.
pub fn clean_name(raw: &str, generic_terms: &[String]) -> Option<String> {
  let name = PARENTHETICAL.replace_all(raw.trim(), "");
  let name = name.trim().trim_matches('"').trim_matches('\'').trim();
  let name = name.trim_end_matches(['.', ',', ';', ':']);
  let name = WHITESPACE.replace_all(name, " ").trim().to_string();

  if name.chars().count() < 2 {
    return None;
  }
  let lower = name.to_lowercase();
  let generic = lower
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .any(|word| generic_terms.iter().any(|t| t == word));
  if generic || matches!(lower.as_str(), "none" | "null" | "art" | "poetry" | "music") {
    return None;
  }
  Some(name)
}

/// Cleaned lineup names, without repeats.
pub fn parse_lineup(title: &str, generic_terms: &[String]) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for raw in split_lineup(title) {
    if let Some(name) = clean_name(&raw, generic_terms) {
      if !out.iter().any(|n| n.to_lowercase() == name.to_lowercase()) {
        out.push(name);
      }
    }
  }
  out
}

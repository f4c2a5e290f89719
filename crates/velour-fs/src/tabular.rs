use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use velour_core::domain::{AggregateStats, Artist, ArtistKey, Show, ShowId};

use crate::FsError;
use crate::io::atomic_write;

pub const ARTIST_COLUMNS: [&str; 8] = [
  "artist_name",
  "normalized_name",
  "total_shows",
  "connection_count",
  "years_active",
  "first_year",
  "last_year",
  "years_span",
];

pub const SHOW_COLUMNS: [&str; 6] = ["date", "year", "title", "description", "genre", "artists"];

/// Date layouts found in the scraped calendar, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"];

static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());

/// Rows read from a table, plus one message per row that had to be dropped
/// or repaired.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
  pub rows: Vec<T>,
  pub warnings: Vec<String>,
}

impl<T> Default for Parsed<T> {
  fn default() -> Self {
    Self { rows: Vec::new(), warnings: Vec::new() }
  }
}

impl<T> Parsed<T> {
  fn warn(&mut self, msg: String) {
    tracing::warn!("{msg}");
    self.warnings.push(msg);
  }
}

/// Column lookup by header name, so column order in the file does not matter.
struct Columns {
  idx: Vec<Option<usize>>,
}

impl Columns {
  fn new(headers: &csv::StringRecord, wanted: &[&str]) -> Self {
    let idx = wanted.iter().map(|w| headers.iter().position(|h| h.trim() == *w)).collect();
    Self { idx }
  }

  fn get<'r>(&self, record: &'r csv::StringRecord, col: usize) -> &'r str {
    self.idx[col].and_then(|i| record.get(i)).unwrap_or("").trim()
  }
}

fn unquote(value: &str) -> &str {
  value.trim().trim_matches('"').trim_matches('\'').trim()
}

fn parse_int(value: &str) -> Option<i64> {
  let cleaned = unquote(value).trim_end_matches([']', '[']);
  cleaned.parse().ok()
}

/// Parses `[2006, 2007]`. Malformed text falls back to every four-digit
/// number it contains, and the flag comes back `false`.
pub fn parse_years(value: &str) -> (BTreeSet<i32>, bool) {
  let value = unquote(value);
  if value.is_empty() {
    return (BTreeSet::new(), true);
  }
  if let Ok(years) = serde_json::from_str::<Vec<i32>>(value) {
    return (years.into_iter().collect(), true);
  }
  let years = FOUR_DIGITS.find_iter(value).filter_map(|m| m.as_str().parse().ok()).collect();
  (years, false)
}

pub fn format_years(years: &BTreeSet<i32>) -> String {
  let inner: Vec<String> = years.iter().map(|y| y.to_string()).collect();
  format!("[{}]", inner.join(", "))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
  let value = value.trim();
  DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn read_artists<R: Read>(reader: R) -> Result<Parsed<Artist>, FsError> {
  let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
  let cols = Columns::new(reader.headers()?, &ARTIST_COLUMNS);
  let mut parsed = Parsed::default();

  for (idx, result) in reader.records().enumerate() {
    let row = idx + 2;
    let record = match result {
      Ok(r) => r,
      Err(e) => {
        parsed.warn(format!("artists row {row}: {e}"));
        continue;
      }
    };

    let name = unquote(cols.get(&record, 0));
    if name.is_empty() {
      parsed.warn(format!("artists row {row}: empty artist name, dropped"));
      continue;
    }
    let mut artist = Artist::new(name);

    let stored_key = unquote(cols.get(&record, 1));
    if !stored_key.is_empty() && ArtistKey::from_name(stored_key) != artist.key {
      parsed.warn(format!("artists row {row}: normalized_name '{stored_key}' does not match '{name}', using '{}'", artist.key));
    }

    let (years_active, clean) = parse_years(cols.get(&record, 4));
    if !clean {
      parsed.warn(format!("artists row {row}: malformed years_active, extracted {years_active:?}"));
    }
    let total_shows = parse_int(cols.get(&record, 2)).and_then(|n| u32::try_from(n).ok()).unwrap_or(0);
    artist.stats = AggregateStats { total_shows, years_active };
    artist.connection_count = parse_int(cols.get(&record, 3)).and_then(|n| u32::try_from(n).ok()).unwrap_or(0);

    parsed.rows.push(artist);
  }

  Ok(parsed)
}

pub fn write_artists<'a, W, I>(writer: W, artists: I) -> Result<(), FsError>
where
  W: Write,
  I: IntoIterator<Item = &'a Artist>,
{
  let mut out = csv::Writer::from_writer(writer);
  out.write_record(ARTIST_COLUMNS)?;
  for artist in artists {
    let stats = &artist.stats;
    out.write_record([
      artist.display_name.clone(),
      artist.key.to_string(),
      stats.total_shows.to_string(),
      artist.connection_count.to_string(),
      format_years(&stats.years_active),
      stats.first_year().map(|y| y.to_string()).unwrap_or_default(),
      stats.last_year().map(|y| y.to_string()).unwrap_or_default(),
      stats.years_span().to_string(),
    ])?;
  }
  out.flush()?;
  Ok(())
}

/// Reads shows. Ids are the zero-based data row index, so they stay stable
/// when a malformed row is dropped.
pub fn read_shows<R: Read>(reader: R) -> Result<Parsed<Show>, FsError> {
  let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
  let cols = Columns::new(reader.headers()?, &SHOW_COLUMNS);
  let mut parsed = Parsed::default();

  for (idx, result) in reader.records().enumerate() {
    let row = idx + 2;
    let record = match result {
      Ok(r) => r,
      Err(e) => {
        parsed.warn(format!("shows row {row}: {e}"));
        continue;
      }
    };
    let Ok(index) = u32::try_from(idx) else {
      parsed.warn(format!("shows row {row}: too many rows"));
      break;
    };

    let title = cols.get(&record, 2);
    if title.is_empty() {
      parsed.warn(format!("shows row {row}: empty title, dropped"));
      continue;
    }

    let mut show = Show::new(ShowId::new(index), title);
    show.description = cols.get(&record, 3).to_string();
    show.genre = cols.get(&record, 4).to_string();
    show.artists = split_artists(cols.get(&record, 5));

    let raw_date = cols.get(&record, 0);
    match parse_date(raw_date) {
      Some(date) => show = show.with_date(date),
      None => {
        if !raw_date.is_empty() {
          parsed.warn(format!("shows row {row}: unparseable date '{raw_date}'"));
        }
        show.year = parse_int(cols.get(&record, 1)).and_then(|y| i32::try_from(y).ok());
      }
    }

    parsed.rows.push(show);
  }

  Ok(parsed)
}

/// Splits the `artists` column on commas. A name written in double quotes
/// may contain commas; `""` inside it is a literal quote.
fn split_artists(value: &str) -> Vec<String> {
  let mut names = Vec::new();
  let mut current = String::new();
  let mut quoted = false;
  let mut chars = value.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '"' if quoted => {
        if chars.peek() == Some(&'"') {
          chars.next();
          current.push('"');
        } else {
          quoted = false;
        }
      }
      '"' if current.trim().is_empty() => {
        current.clear();
        quoted = true;
      }
      ',' if !quoted => names.push(std::mem::take(&mut current)),
      _ => current.push(c),
    }
  }
  names.push(current);

  names.into_iter().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect()
}

/// Inverse of [`split_artists`]: plain names stay bare, names with a comma or
/// a quote are quoted.
fn join_artists(names: &[String]) -> String {
  let escaped: Vec<String> = names
    .iter()
    .map(|n| if n.contains([',', '"']) { format!("\"{}\"", n.replace('"', "\"\"")) } else { n.clone() })
    .collect();
  escaped.join(", ")
}

pub fn write_shows<'a, W, I>(writer: W, shows: I) -> Result<(), FsError>
where
  W: Write,
  I: IntoIterator<Item = &'a Show>,
{
  let mut out = csv::Writer::from_writer(writer);
  out.write_record(SHOW_COLUMNS)?;
  for show in shows {
    out.write_record([
      show.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
      show.stats_year().map(|y| y.to_string()).unwrap_or_default(),
      show.title.clone(),
      show.description.clone(),
      show.genre.clone(),
      join_artists(&show.artists),
    ])?;
  }
  out.flush()?;
  Ok(())
}

pub fn read_artists_file(path: &Path) -> Result<Parsed<Artist>, FsError> {
  read_artists(std::fs::File::open(path)?)
}

pub fn read_shows_file(path: &Path) -> Result<Parsed<Show>, FsError> {
  read_shows(std::fs::File::open(path)?)
}

pub fn write_artists_file<'a>(path: &Path, artists: impl IntoIterator<Item = &'a Artist>) -> Result<(), FsError> {
  let mut buf = Vec::new();
  write_artists(&mut buf, artists)?;
  atomic_write(path, &buf)?;
  Ok(())
}

pub fn write_shows_file<'a>(path: &Path, shows: impl IntoIterator<Item = &'a Show>) -> Result<(), FsError> {
  let mut buf = Vec::new();
  write_shows(&mut buf, shows)?;
  atomic_write(path, &buf)?;
  Ok(())
}

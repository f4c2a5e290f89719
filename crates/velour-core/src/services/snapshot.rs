use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{Artist, ArtistKey, ChangeLog, ChangeRecord, Show};
use crate::errors::CoreError;
use crate::ports::{SlotWrite, SnapshotSlot};
use crate::services::entity_store::EntityStore;

/// Serializes the three collections of a store, ready for a single commit.
///
/// Nothing is returned unless every slot encodes and validates, so a caller
/// never ends up writing a partial snapshot.
pub fn encode_store(store: &EntityStore) -> Result<Vec<SlotWrite>, CoreError> {
  let artists: Vec<&Artist> = store.all_artists().collect();
  validate_artists(artists.iter().copied())?;
  validate_shows(store.all_shows())?;

  Ok(vec![
    SlotWrite { slot: SnapshotSlot::Artists, payload: to_json(SnapshotSlot::Artists, &artists)? },
    SlotWrite { slot: SnapshotSlot::Shows, payload: to_json(SnapshotSlot::Shows, store.all_shows())? },
    SlotWrite { slot: SnapshotSlot::ChangeLog, payload: to_json(SnapshotSlot::ChangeLog, store.change_log().records())? },
  ])
}

pub fn decode_artists(payload: &str) -> Result<Vec<Artist>, CoreError> {
  let artists: Vec<Artist> = from_json(SnapshotSlot::Artists, payload)?;
  validate_artists(artists.iter())?;
  Ok(artists)
}

pub fn decode_shows(payload: &str) -> Result<Vec<Show>, CoreError> {
  let shows: Vec<Show> = from_json(SnapshotSlot::Shows, payload)?;
  validate_shows(&shows)?;
  Ok(shows)
}

pub fn decode_change_log(payload: &str) -> Result<ChangeLog, CoreError> {
  let records: Vec<ChangeRecord> = from_json(SnapshotSlot::ChangeLog, payload)?;
  let mut seen = BTreeSet::new();
  for record in &records {
    if !seen.insert(record.seq) {
      return Err(CoreError::Parse(format!("{}: duplicate sequence {}", SnapshotSlot::ChangeLog, record.seq)));
    }
  }
  Ok(ChangeLog::from_records(records))
}

fn validate_artists<'a>(artists: impl Iterator<Item = &'a Artist>) -> Result<(), CoreError> {
  let mut seen: BTreeSet<&ArtistKey> = BTreeSet::new();
  for (idx, artist) in artists.enumerate() {
    let slot = SnapshotSlot::Artists;
    if artist.display_name.trim().is_empty() {
      return Err(CoreError::Parse(format!("{slot}: artist {idx} has an empty display name")));
    }
    if artist.key != ArtistKey::from_name(artist.key.as_str()) || artist.key.is_empty() {
      return Err(CoreError::Parse(format!("{slot}: artist {idx} has a non-normalized key '{}'", artist.key)));
    }
    if !seen.insert(&artist.key) {
      return Err(CoreError::Parse(format!("{slot}: duplicate key '{}'", artist.key)));
    }
  }
  Ok(())
}

fn validate_shows(shows: &[Show]) -> Result<(), CoreError> {
  let mut seen = BTreeSet::new();
  for show in shows {
    let slot = SnapshotSlot::Shows;
    if show.title.trim().is_empty() {
      return Err(CoreError::Parse(format!("{slot}: show {} has no title", show.id)));
    }
    if !seen.insert(show.id) {
      return Err(CoreError::Parse(format!("{slot}: duplicate show id {}", show.id)));
    }
  }
  Ok(())
}

fn to_json<T: Serialize + ?Sized>(slot: SnapshotSlot, value: &T) -> Result<String, CoreError> {
  serde_json::to_string(value).map_err(|e| CoreError::Parse(format!("{slot}: {e}")))
}

fn from_json<T: DeserializeOwned>(slot: SnapshotSlot, payload: &str) -> Result<T, CoreError> {
  serde_json::from_str(payload).map_err(|e| CoreError::Parse(format!("{slot}: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Mutation, ShowId};

  fn store() -> EntityStore {
    let mut log = ChangeLog::default();
    log.append(Mutation::Delete { artist: Artist::new("Ghost") });
    EntityStore::new(
      vec![Artist::new("Echo"), Artist::new("Shake")],
      vec![Show::new(ShowId::new(0), "Echo & Shake").with_year(2022).with_artists(["Echo", "Shake"])],
      log,
    )
  }

  #[test]
  fn encodes_all_three_slots() {
    let writes = encode_store(&store()).unwrap();
    let slots: Vec<SnapshotSlot> = writes.iter().map(|w| w.slot).collect();
    assert_eq!(slots, SnapshotSlot::ALL.to_vec());

    let artists = decode_artists(&writes[0].payload).unwrap();
    assert_eq!(artists.len(), 2);
    let shows = decode_shows(&writes[1].payload).unwrap();
    assert_eq!(shows[0].artists, vec!["Echo", "Shake"]);
    assert_eq!(decode_change_log(&writes[2].payload).unwrap().len(), 1);
  }

  #[test]
  fn rejects_artist_without_name() {
    let payload = r#"[{"key":"echo","display_name":"  ","total_shows":0,"years_active":[]}]"#;
    assert!(matches!(decode_artists(payload), Err(CoreError::Parse(_))));
  }

  #[test]
  fn rejects_non_normalized_or_repeated_keys() {
    let upper = r#"[{"key":"Echo","display_name":"Echo","total_shows":0,"years_active":[]}]"#;
    assert!(decode_artists(upper).is_err());
    let twice = r#"[{"key":"echo","display_name":"Echo","total_shows":0,"years_active":[]},
                    {"key":"echo","display_name":"ECHO","total_shows":0,"years_active":[]}]"#;
    assert!(decode_artists(twice).is_err());
  }

  #[test]
  fn rejects_show_without_title() {
    let payload = r#"[{"id":0,"date":null,"year":2020,"title":"","artists":["Echo"]}]"#;
    assert!(decode_shows(payload).is_err());
  }

  #[test]
  fn rejects_garbage() {
    assert!(decode_shows("not json").is_err());
    assert!(decode_change_log("{}").is_err());
  }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artist::Artist;
use crate::domain::ids::{ArtistKey, ShowId};
use crate::domain::show::Show;

/// Kind of a mutation, as written in the `type` tag of the exported log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
  Edit,
  Merge,
  Split,
  Delete,
  ShowEdit,
}

/// Before/after snapshots of the entities a mutation touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
  Edit {
    original: Artist,
    updated: Artist,
  },
  Merge {
    source: Artist,
    target_before: Artist,
    target: Artist,
  },
  Split {
    source: Artist,
    created: Vec<Artist>,
    /// Existing artists that absorbed the source's stats: (before, after).
    absorbed: Vec<(Artist, Artist)>,
  },
  Delete {
    artist: Artist,
  },
  ShowEdit {
    show_id: ShowId,
    original: Show,
    updated: Show,
    /// Artist staged because the added name was not yet registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    staged: Option<Artist>,
  },
}

impl Mutation {
  pub fn kind(&self) -> MutationKind {
    match self {
      Mutation::Edit { .. } => MutationKind::Edit,
      Mutation::Merge { .. } => MutationKind::Merge,
      Mutation::Split { .. } => MutationKind::Split,
      Mutation::Delete { .. } => MutationKind::Delete,
      Mutation::ShowEdit { .. } => MutationKind::ShowEdit,
    }
  }

  /// Short human label used in logs.
  pub fn subject(&self) -> String {
    match self {
      Mutation::Edit { original, updated } => {
        format!("{} -> {}", original.display_name, updated.display_name)
      }
      Mutation::Merge { source, target, .. } => {
        format!("{} into {}", source.display_name, target.display_name)
      }
      Mutation::Split { source, created, absorbed } => {
        format!("{} into {} new, {} existing", source.display_name, created.len(), absorbed.len())
      }
      Mutation::Delete { artist } => artist.display_name.clone(),
      Mutation::ShowEdit { show_id, updated, .. } => format!("show {show_id} ({})", updated.title),
    }
  }

  /// Old key to new key, for mutations that move an identity.
  pub fn key_mapping(&self) -> Option<(&ArtistKey, &ArtistKey)> {
    match self {
      Mutation::Edit { original, updated } if original.key != updated.key => Some((&original.key, &updated.key)),
      Mutation::Merge { source, target, .. } => Some((&source.key, &target.key)),
      _ => None,
    }
  }
}

/// One append-only entry of the change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
  pub seq: u64,
  pub at: DateTime<Utc>,
  #[serde(flatten)]
  pub mutation: Mutation,
}

impl ChangeRecord {
  pub fn kind(&self) -> MutationKind {
    self.mutation.kind()
  }
}

/// Append-only audit trail. Records are never mutated; the log is only
/// cleared by a reset to the original source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLog {
  records: Vec<ChangeRecord>,
}

impl ChangeLog {
  pub fn from_records(mut records: Vec<ChangeRecord>) -> Self {
    records.sort_by_key(|r| r.seq);
    ChangeLog { records }
  }

  pub fn append(&mut self, mutation: Mutation) -> &ChangeRecord {
    let seq = self.records.last().map_or(1, |r| r.seq + 1);
    self.records.push(ChangeRecord { seq, at: Utc::now(), mutation });
    &self.records[self.records.len() - 1]
  }

  pub fn records(&self) -> &[ChangeRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn append_numbers_records_in_order() {
    let mut log = ChangeLog::default();
    log.append(Mutation::Delete { artist: Artist::new("Echo") });
    let second = log.append(Mutation::Delete { artist: Artist::new("Shake") }).seq;
    assert_eq!(second, 2);
    assert_eq!(log.records()[0].kind(), MutationKind::Delete);
  }

  #[test]
  fn records_are_tagged_by_type() {
    let record = ChangeRecord {
      seq: 1,
      at: Utc::now(),
      mutation: Mutation::Edit { original: Artist::new("neon trees"), updated: Artist::new("Neon Trees") },
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["type"], "edit");
    assert_eq!(json["original"]["key"], "neon trees");
    assert_eq!(json["updated"]["display_name"], "Neon Trees");

    let back: ChangeRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
  }

  #[test]
  fn edit_without_key_change_has_no_mapping() {
    let m = Mutation::Edit { original: Artist::new("neon trees"), updated: Artist::new("Neon Trees") };
    assert!(m.key_mapping().is_none());
  }
}

use velour_core::domain::{Artist, ArtistKey, Mutation, MutationKind, Show, ShowId};
use velour_core::ports::{InMemorySource, MemorySnapshotRepository, SnapshotRepository, SnapshotSlot};
use velour_core::services::{CatalogService, FlushStatus, LoadOrigin, ShowArtistChange, recompute};
use velour_core::{CoreError, ValidationError, normalize};

type Catalog = CatalogService<MemorySnapshotRepository, InMemorySource>;

fn key(name: &str) -> ArtistKey {
  ArtistKey::from_name(name)
}

fn show(id: u32, year: i32, artists: &[&str]) -> Show {
  Show::new(ShowId::new(id), &format!("show {id}")).with_year(year).with_artists(artists.iter().copied())
}

fn catalog_with(shows: Vec<Show>) -> (Catalog, MemorySnapshotRepository) {
  let repo = MemorySnapshotRepository::new();
  let mut catalog = CatalogService::new(repo.clone(), InMemorySource::new(vec![], shows));
  catalog.load().unwrap();
  (catalog, repo)
}

/// A: 3 shows in {2019, 2020}; B: 2 shows in {2020, 2021}.
fn merge_fixture() -> Vec<Show> {
  vec![
    show(0, 2019, &["A"]),
    show(1, 2019, &["A"]),
    show(2, 2020, &["A"]),
    show(3, 2020, &["B"]),
    show(4, 2021, &["B"]),
  ]
}

#[test]
fn echo_and_shake_scenario() {
  let (catalog, _) = catalog_with(vec![show(0, 2022, &["Echo", "Shake"]), show(1, 2022, &["Echo"])]);

  let echo = catalog.get_artist(&key("echo")).unwrap();
  assert_eq!(echo.total_shows(), 2);
  assert_eq!(echo.years_active().iter().copied().collect::<Vec<_>>(), vec![2022]);
  assert_eq!(catalog.get_artist(&key("shake")).unwrap().total_shows(), 1);
}

#[test]
fn merge_conserves_shows_and_years() {
  let (mut catalog, _) = catalog_with(merge_fixture());
  let outcome = catalog.merge_artists("A", "B").unwrap();
  assert_eq!(outcome.record.kind(), MutationKind::Merge);

  let b = catalog.get_artist(&key("b")).unwrap();
  assert_eq!(b.total_shows(), 5);
  assert_eq!(b.years_active().iter().copied().collect::<Vec<_>>(), vec![2019, 2020, 2021]);
  assert_eq!(b.stats.years_span(), 3);
  assert!(catalog.all_shows().iter().all(|s| !s.references(&key("a"))));
}

#[test]
fn merged_source_is_gone() {
  let (mut catalog, _) = catalog_with(merge_fixture());
  catalog.merge_artists("A", "B").unwrap();
  assert!(catalog.get_artist(&ArtistKey::from_name(&normalize("A"))).is_none());
  assert_eq!(
    catalog.merge_artists("A", "B").unwrap_err(),
    ValidationError::SourceNotFound(key("a"))
  );
}

#[test]
fn split_copies_without_touching_source() {
  let (mut catalog, _) = catalog_with(merge_fixture());
  let before = catalog.get_artist(&key("a")).unwrap().total_shows();

  catalog.split_artist("A", &["A1", "A2"]).unwrap();

  assert_eq!(catalog.get_artist(&key("a")).unwrap().total_shows(), before);
  for name in ["a1", "a2"] {
    let copy = catalog.get_artist(&key(name)).unwrap();
    assert_eq!(copy.total_shows(), before);
    assert!(copy.staged);
  }

  // A later mutation does not wipe the staged copies.
  catalog.edit_artist("b", "Bee").unwrap();
  assert_eq!(catalog.get_artist(&key("a1")).unwrap().total_shows(), before);

  // A full pass releases them; nothing references them yet.
  catalog.recompute_all();
  let a1 = catalog.get_artist(&key("a1")).unwrap();
  assert!(!a1.staged);
  assert_eq!(a1.total_shows(), 0);
}

#[test]
fn deleted_artist_resurrects_from_remaining_references() {
  let (mut catalog, _) = catalog_with(vec![show(0, 2018, &["X", "Y"]), show(1, 2019, &["X"])]);

  catalog.delete_artist("X").unwrap();
  assert!(catalog.get_artist(&key("x")).is_none());
  catalog.edit_show_artists(ShowId::new(1), ShowArtistChange::Remove("x".into())).unwrap();

  let (report, flush) = catalog.recompute_all();
  assert!(flush.is_saved());
  assert_eq!(report.synthesized, vec![key("x")]);

  let x = catalog.get_artist(&key("x")).unwrap();
  assert_eq!(x.display_name, "X");
  assert_eq!(x.total_shows(), 1);
  assert_eq!(x.years_active().iter().copied().collect::<Vec<_>>(), vec![2018]);
}

#[test]
fn rename_propagates_by_key() {
  let (mut catalog, _) = catalog_with(vec![show(0, 2008, &["Neon trees", "Fictionist"])]);
  catalog.edit_artist("neon trees", "Neon Trees").unwrap();
  assert_eq!(catalog.all_shows()[0].artists, vec!["Neon Trees", "Fictionist"]);
  assert_eq!(catalog.get_artist(&key("neon trees")).unwrap().total_shows(), 1);
}

#[test]
fn change_log_records_before_and_after() {
  let (mut catalog, _) = catalog_with(merge_fixture());
  catalog.edit_artist("a", "Alpha").unwrap();
  catalog.delete_artist("b").unwrap();

  let records = catalog.change_log().records();
  assert_eq!(records.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2]);
  let Mutation::Edit { original, updated } = &records[0].mutation else { panic!("expected edit") };
  assert_eq!(original.key, key("a"));
  assert_eq!(updated.key, key("alpha"));
  assert_eq!(updated.total_shows(), 3);
}

#[test]
fn quota_failure_keeps_memory_state() {
  let (mut catalog, repo) = catalog_with(merge_fixture());
  let saved = repo.raw(SnapshotSlot::Artists);
  repo.set_quota(Some(16));

  let outcome = catalog.merge_artists("A", "B").unwrap();
  assert!(matches!(outcome.flush, FlushStatus::Failed(CoreError::StorageQuota { .. })));
  assert!(catalog.get_artist(&key("a")).is_none());
  assert_eq!(catalog.change_log().len(), 1);
  // Nothing was written: the snapshot still holds the pre-merge state.
  assert_eq!(repo.raw(SnapshotSlot::Artists), saved);
  assert!(repo.raw(SnapshotSlot::ChangeLog).unwrap().starts_with("[]"));
}

#[test]
fn snapshot_survives_a_new_session() {
  let (mut catalog, repo) = catalog_with(merge_fixture());
  catalog.merge_artists("A", "B").unwrap();

  let mut next = CatalogService::new(repo, InMemorySource::default());
  let report = next.load().unwrap();
  assert_eq!(report.origin, LoadOrigin::Snapshot);
  assert_eq!(report.log_records, 1);
  assert_eq!(next.get_artist(&key("b")).unwrap().total_shows(), 5);
}

#[test]
fn invalid_slot_falls_back_to_source() {
  let repo = MemorySnapshotRepository::new();
  repo.put_raw(SnapshotSlot::Artists, r#"[{"key":"echo","display_name":"","total_shows":1,"years_active":[]}]"#);
  repo.put_raw(SnapshotSlot::Shows, "[]");

  let source = InMemorySource::new(vec![Artist::new("Echo")], vec![show(0, 2022, &["Echo"])]);
  let mut catalog = CatalogService::new(repo.clone(), source);
  let report = catalog.load().unwrap();

  assert_eq!(report.origin, LoadOrigin::Source);
  assert_eq!(catalog.get_artist(&key("echo")).unwrap().total_shows(), 1);
  assert!(repo.read_slot(SnapshotSlot::Artists).unwrap().unwrap().contains("\"display_name\":\"Echo\""));
}

#[test]
fn missing_shows_slot_falls_back_to_source() {
  let repo = MemorySnapshotRepository::new();
  repo.put_raw(SnapshotSlot::Artists, "[]");
  let mut catalog = CatalogService::new(repo, InMemorySource::new(vec![], vec![show(0, 2022, &["Echo"])]));
  assert_eq!(catalog.load().unwrap().origin, LoadOrigin::Source);
}

#[test]
fn store_matches_pure_recompute_after_edits() {
  let (mut catalog, _) = catalog_with(merge_fixture());
  catalog.merge_artists("A", "B").unwrap();
  catalog.edit_show_artists(ShowId::new(0), ShowArtistChange::Add("C".into())).unwrap();

  let fresh = recompute(catalog.all_shows());
  for artist in catalog.all_artists() {
    assert_eq!(fresh.get(&artist.key).cloned().unwrap_or_default(), artist.stats, "{}", artist.key);
  }
}

#[test]
fn split_into_existing_artist_tracks_shows_again_once_named() {
  let (mut catalog, _) = catalog_with(merge_fixture());

  catalog.split_artist("A", &["B"]).unwrap();
  let b = catalog.get_artist(&key("b")).unwrap();
  assert!(b.staged);
  assert_eq!(b.total_shows(), 5);

  catalog.edit_show_artists(ShowId::new(0), ShowArtistChange::Add("B".into())).unwrap();
  catalog.delete_artist("A").unwrap();

  let b = catalog.get_artist(&key("b")).unwrap();
  assert!(!b.staged);
  assert_eq!(b.stats, recompute(catalog.all_shows())[&key("b")]);
  assert_eq!(b.total_shows(), 3);
}

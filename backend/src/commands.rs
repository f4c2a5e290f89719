use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tokio_util::sync::CancellationToken;
use velour_core::domain::{ArtistKey, MutationKind, ShowId};
use velour_core::services::{
  BulkScan, FlushStatus, LoadOrigin, LoadReport, Outcome, ShowArtistChange, apply_changes, build_graph,
};
use velour_core::{ValidationError, normalize};
use velour_fs::json;
use velour_scanner::LineupDetector;

use crate::cli::{ArtistOrder, Commands, GraphCommand};
use crate::infrastructure::reporter::LogReporter;
use crate::{App, Catalog};

pub async fn dispatch(command: Commands, app: &mut App) -> Result<()> {
  // `reset` no pasa por el snapshot: vuelve directamente a la fuente.
  let report = match command {
    Commands::Reset => app.catalog.reset_to_original().context("failed to reload the source")?,
    _ => app.catalog.load().context("failed to open the session")?,
  };
  warn_if_unsaved(&report);

  match command {
    Commands::Import | Commands::Reset => print_load(&report),
    Commands::Artists { sort, limit } => list_artists(&app.catalog, sort, limit),
    Commands::Shows { artist, year } => list_shows(&app.catalog, artist.as_deref(), year),
    Commands::Edit { artist, name } => {
      let result = app.catalog.edit_artist(&artist, &name);
      return commit(app, result);
    }
    Commands::Merge { source, target } => {
      let result = app.catalog.merge_artists(&source, &target);
      return commit(app, result);
    }
    Commands::Split { source, names } => {
      let names: Vec<&str> = names.iter().map(String::as_str).collect();
      let result = app.catalog.split_artist(&source, &names);
      return commit(app, result);
    }
    Commands::Delete { artist } => {
      let result = app.catalog.delete_artist(&artist);
      return commit(app, result);
    }
    Commands::ShowAdd { show, name } => {
      let result = app.catalog.edit_show_artists(ShowId::new(show), ShowArtistChange::Add(name));
      return commit(app, result);
    }
    Commands::ShowRemove { show, name } => {
      let result = app.catalog.edit_show_artists(ShowId::new(show), ShowArtistChange::Remove(name));
      return commit(app, result);
    }
    Commands::Recompute => {
      let (recompute, flush) = app.catalog.recompute_all();
      println!(
        "{} artists changed, {} unreferenced, {} restored",
        recompute.changed,
        recompute.unreferenced,
        recompute.synthesized.len()
      );
      for key in &recompute.synthesized {
        println!("  restored {key}");
      }
      return ensure_saved(app, flush);
    }
    Commands::Scan { chunk_size } => return scan(app, chunk_size).await,
    Commands::Export { dir } => {
      let dir = dir.unwrap_or_else(|| app.source.export_dir.clone());
      export_to(&app.catalog, &dir)?;
      println!("exported to {}", dir.display());
    }
    Commands::Log { json } => print_log(&app.catalog, json)?,
    Commands::Graph(GraphCommand::Build { out }) => {
      let graph = build_graph(app.catalog.all_shows(), app.catalog.store());
      json::write_graph(&out, &graph)?;
      println!("{} nodes, {} edges -> {}", graph.nodes.len(), graph.edges.len(), out.display());
    }
    Commands::Graph(GraphCommand::Apply { graph, out }) => {
      let snapshot = json::read_graph(&graph)?;
      let synced = apply_changes(&snapshot, app.catalog.change_log().records(), app.catalog.store());
      let out = out.unwrap_or(graph);
      json::write_graph(&out, &synced)?;
      println!(
        "{} -> {} nodes, {} -> {} edges -> {}",
        snapshot.nodes.len(),
        synced.nodes.len(),
        snapshot.edges.len(),
        synced.edges.len(),
        out.display()
      );
    }
  }
  Ok(())
}

fn kind_label(kind: MutationKind) -> &'static str {
  match kind {
    MutationKind::Edit => "edit",
    MutationKind::Merge => "merge",
    MutationKind::Split => "split",
    MutationKind::Delete => "delete",
    MutationKind::ShowEdit => "show_edit",
  }
}

fn print_load(report: &LoadReport) {
  let origin = match report.origin {
    LoadOrigin::Snapshot => "snapshot",
    LoadOrigin::Source => "source",
  };
  println!(
    "{} artists, {} shows, {} change records (from {origin})",
    report.artists, report.shows, report.log_records
  );
  if !report.warnings.is_empty() {
    println!("{} source rows dropped, see log", report.warnings.len());
  }
}

fn warn_if_unsaved(report: &LoadReport) {
  if let Some(FlushStatus::Failed(reason)) = &report.flush {
    tracing::warn!(error = %reason, "imported state could not be saved; it will be imported again next run");
  }
}

fn commit(app: &App, result: Result<Outcome, ValidationError>) -> Result<()> {
  let outcome = result?;
  println!(
    "#{} {} {}",
    outcome.record.seq,
    kind_label(outcome.record.kind()),
    outcome.record.mutation.subject()
  );
  ensure_saved(app, outcome.flush)
}

/// The process ends after each command, so an unsaved change would be lost:
/// dump it to `<export_dir>/unsaved` and fail.
fn ensure_saved(app: &App, flush: FlushStatus) -> Result<()> {
  match flush {
    FlushStatus::Saved => Ok(()),
    FlushStatus::Failed(reason) => {
      let dir = app.source.export_dir.join("unsaved");
      export_to(&app.catalog, &dir)?;
      tracing::warn!(dir = %dir.display(), "snapshot not saved, current state exported");
      Err(anyhow!("change applied but not persisted: {reason}"))
    }
  }
}

fn export_to(catalog: &Catalog, dir: &Path) -> Result<()> {
  velour_fs::write_artists_file(&dir.join("artists.csv"), catalog.all_artists())?;
  velour_fs::write_shows_file(&dir.join("shows.csv"), catalog.all_shows())?;
  json::write_change_log(&dir.join("change_log.json"), catalog.change_log().records())?;
  tracing::info!(dir = %dir.display(), "export written");
  Ok(())
}

fn list_artists(catalog: &Catalog, order: ArtistOrder, limit: Option<usize>) {
  let mut artists: Vec<_> = catalog.all_artists().collect();
  match order {
    ArtistOrder::Shows => {
      artists.sort_by(|a, b| b.total_shows().cmp(&a.total_shows()).then_with(|| a.key.cmp(&b.key)))
    }
    ArtistOrder::Name => artists.sort_by(|a, b| a.key.cmp(&b.key)),
  }

  for artist in artists.into_iter().take(limit.unwrap_or(usize::MAX)) {
    let years = match (artist.stats.first_year(), artist.stats.last_year()) {
      (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
      (Some(first), _) => first.to_string(),
      _ => "-".to_string(),
    };
    let staged = if artist.staged { " (staged)" } else { "" };
    println!(
      "{}\t{}\t{}\t{}{}",
      artist.display_name,
      artist.total_shows(),
      years,
      artist.connection_count,
      staged
    );
  }
}

fn list_shows(catalog: &Catalog, artist: Option<&str>, year: Option<i32>) {
  let key = artist.map(|name| ArtistKey::from_name(&normalize(name)));
  let shows = catalog
    .all_shows()
    .iter()
    .filter(|s| key.as_ref().is_none_or(|k| s.references(k)))
    .filter(|s| year.is_none_or(|y| s.stats_year() == Some(y)));

  for show in shows {
    let when = match (show.date, show.year) {
      (Some(date), _) => date.format("%Y-%m-%d").to_string(),
      (None, Some(year)) => year.to_string(),
      (None, None) => "-".to_string(),
    };
    println!("{}\t{}\t{}\t{}", show.id.index(), when, show.title, show.artists.join(", "));
  }
}

fn print_log(catalog: &Catalog, as_json: bool) -> Result<()> {
  let records = catalog.change_log().records();
  if as_json {
    println!("{}", serde_json::to_string_pretty(records)?);
    return Ok(());
  }
  for record in records {
    println!(
      "#{}\t{}\t{}\t{}",
      record.seq,
      record.at.to_rfc3339(),
      kind_label(record.kind()),
      record.mutation.subject()
    );
  }
  Ok(())
}

async fn scan(app: &mut App, chunk_size: Option<usize>) -> Result<()> {
  let chunk_size = chunk_size.unwrap_or(app.scanner.chunk_size);
  let detector = LineupDetector::new(app.scanner.clone());

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  let watcher = tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::warn!("interrupt received, stopping after the current chunk");
      on_interrupt.cancel();
    }
  });

  let summary =
    BulkScan::new(detector).with_chunk_size(chunk_size).run(&mut app.catalog, &LogReporter::new(), &cancel).await;
  watcher.abort();

  println!(
    "{} shows scanned in {} chunks, {} names added, {} rejected{}",
    summary.shows_scanned,
    summary.chunks_committed,
    summary.names_added,
    summary.rejected,
    if summary.cancelled { " (cancelled)" } else { "" }
  );

  if summary.flush_failures == 0 {
    return Ok(());
  }
  // Un bloque quedó solo en memoria: último intento antes de salir.
  let status = match app.catalog.flush() {
    Ok(()) => FlushStatus::Saved,
    Err(e) => FlushStatus::Failed(e),
  };
  ensure_saved(app, status)
}

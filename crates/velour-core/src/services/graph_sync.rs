use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde_json::Value;

use crate::domain::{ArtistKey, ChangeRecord, EdgeShow, GraphEdge, GraphNode, GraphSnapshot, Mutation, Show};
use crate::services::entity_store::EntityStore;

/// Shows kept on each edge for the network view.
pub const EDGE_SHOW_LIMIT: usize = 10;

/// Builds the co-performance graph from shows with a known year. Nodes are sorted by key
/// and edges by their endpoint pair.
pub fn build_graph(shows: &[Show], store: &EntityStore) -> GraphSnapshot {
  let mut nodes: BTreeMap<ArtistKey, GraphNode> = BTreeMap::new();
  let mut edges: BTreeMap<(ArtistKey, ArtistKey), GraphEdge> = BTreeMap::new();
  let mut counted = 0usize;

  for show in shows.iter().filter(|s| s.stats_year().is_some()) {
    counted += 1;
    let keys = show.referenced_keys();

    for key in &keys {
      let node = nodes.entry(key.clone()).or_insert_with(|| GraphNode {
        id: key.clone(),
        label: label_for(key, show, store),
        shows: 0,
        size: 0,
      });
      node.shows += 1;
      node.size = node.shows;
    }

    for (i, a) in keys.iter().enumerate() {
      for b in &keys[i + 1..] {
        let pair = if a <= b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
        let edge = edges.entry(pair.clone()).or_insert_with(|| GraphEdge {
          source: pair.0,
          target: pair.1,
          weight: 0,
          shows_together: 0,
          shows: Vec::new(),
        });
        edge.weight += 1;
        edge.shows_together += 1;
        if edge.shows.len() < EDGE_SHOW_LIMIT {
          edge.shows.push(edge_show(show));
        }
      }
    }
  }

  let mut graph =
    GraphSnapshot { nodes: nodes.into_values().collect(), edges: edges.into_values().collect(), ..Default::default() };
  graph.metadata.insert("total_nodes".into(), Value::from(graph.nodes.len()));
  graph.metadata.insert("total_edges".into(), Value::from(graph.edges.len()));
  graph.metadata.insert("total_shows".into(), Value::from(counted));
  graph.metadata.insert("created_at".into(), Value::from(Utc::now().to_rfc3339()));
  tracing::debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "graph built");
  graph
}

fn label_for(key: &ArtistKey, show: &Show, store: &EntityStore) -> String {
  if let Some(artist) = store.get_artist(key) {
    return artist.display_name.clone();
  }
  show.artists.iter().find(|n| key.matches(n)).map(|n| n.trim().to_string()).unwrap_or_else(|| key.to_string())
}

fn edge_show(show: &Show) -> EdgeShow {
  EdgeShow {
    date: show.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
    title: show.title.clone(),
    genre: show.genre.clone(),
    description: show.description.clone(),
  }
}

/// Old key to current key for every id in `keys`, replaying the log in order:
/// a rename of a merge target is followed, and a key reused after it was
/// renamed away only moves graph ids that still carry it at that point.
fn key_mapping<'a>(
  records: &'a [ChangeRecord],
  keys: impl IntoIterator<Item = &'a ArtistKey>,
) -> BTreeMap<ArtistKey, ArtistKey> {
  let moves: Vec<(&ArtistKey, &ArtistKey)> = records.iter().filter_map(|r| r.mutation.key_mapping()).collect();

  let mut resolved = BTreeMap::new();
  for start in keys {
    let mut current = start;
    for (from, to) in &moves {
      if *from == current {
        current = *to;
      }
    }
    if current != start {
      resolved.insert(start.clone(), current.clone());
    }
  }
  resolved
}

/// Replays the change log onto an existing graph snapshot, refreshing labels
/// and show counts from the registry.
pub fn apply_changes(graph: &GraphSnapshot, records: &[ChangeRecord], store: &EntityStore) -> GraphSnapshot {
  let ids = graph.nodes.iter().map(|n| &n.id).chain(graph.edges.iter().flat_map(|e| [&e.source, &e.target]));
  let mapping = key_mapping(records, ids);
  let map = |key: &ArtistKey| mapping.get(key).cloned().unwrap_or_else(|| key.clone());

  let deleted: BTreeSet<ArtistKey> = records
    .iter()
    .filter_map(|r| match &r.mutation {
      Mutation::Delete { artist } => Some(artist.key.clone()),
      _ => None,
    })
    .filter(|key| !store.contains_artist(key))
    .collect();

  let mut seen = BTreeSet::new();
  let mut nodes = Vec::with_capacity(graph.nodes.len());
  for node in &graph.nodes {
    let id = map(&node.id);
    if deleted.contains(&id) || !seen.insert(id.clone()) {
      continue;
    }
    let mut node = node.clone();
    node.id = id;
    if let Some(artist) = store.get_artist(&node.id) {
      node.label = artist.display_name.clone();
      node.shows = artist.total_shows();
      node.size = artist.total_shows();
    }
    nodes.push(node);
  }

  let mut combined: Vec<GraphEdge> = Vec::with_capacity(graph.edges.len());
  let mut index: BTreeMap<(ArtistKey, ArtistKey), usize> = BTreeMap::new();
  for edge in &graph.edges {
    let (source, target) = (map(&edge.source), map(&edge.target));
    if source == target || !seen.contains(&source) || !seen.contains(&target) {
      continue;
    }
    let pair = if source <= target { (source.clone(), target.clone()) } else { (target.clone(), source.clone()) };
    match index.get(&pair) {
      Some(&i) => {
        let existing = &mut combined[i];
        existing.weight += edge.weight;
        existing.shows_together += edge.shows_together;
        existing.shows.extend(edge.shows.iter().cloned());
        existing.shows.truncate(EDGE_SHOW_LIMIT);
      }
      None => {
        index.insert(pair, combined.len());
        combined.push(GraphEdge { source, target, ..edge.clone() });
      }
    }
  }

  let mut updated = GraphSnapshot { nodes, edges: combined, metadata: graph.metadata.clone() };
  updated.metadata.insert("total_nodes".into(), Value::from(updated.nodes.len()));
  updated.metadata.insert("total_edges".into(), Value::from(updated.edges.len()));
  updated.metadata.insert("updated_at".into(), Value::from(Utc::now().to_rfc3339()));
  updated.metadata.insert("updated_from".into(), Value::from("change_log"));
  tracing::info!(
    records = records.len(),
    renamed = mapping.len(),
    dropped = deleted.len(),
    nodes = updated.nodes.len(),
    edges = updated.edges.len(),
    "graph synced with change log"
  );
  updated
}

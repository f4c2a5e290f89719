use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ids::ArtistKey;

/// Show summary attached to a co-performance edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeShow {
  #[serde(default)]
  pub date: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub genre: String,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
  pub id: ArtistKey,
  pub label: String,
  #[serde(default)]
  pub shows: u32,
  #[serde(default)]
  pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
  pub source: ArtistKey,
  pub target: ArtistKey,
  #[serde(default)]
  pub weight: u32,
  #[serde(default)]
  pub shows_together: u32,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub shows: Vec<EdgeShow>,
}

impl GraphEdge {
  /// Endpoints in canonical (sorted) order.
  pub fn pair(&self) -> (&ArtistKey, &ArtistKey) {
    if self.source <= self.target { (&self.source, &self.target) } else { (&self.target, &self.source) }
  }

  pub fn touches(&self, key: &ArtistKey) -> bool {
    &self.source == key || &self.target == key
  }
}

/// Co-performance graph as consumed by the network view.
///
/// Read-only for the mutation operations; it is rebuilt from shows or
/// re-synced from the change log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
  pub nodes: Vec<GraphNode>,
  pub edges: Vec<GraphEdge>,
  #[serde(default)]
  pub metadata: Map<String, Value>,
}

impl GraphSnapshot {
  pub fn node(&self, key: &ArtistKey) -> Option<&GraphNode> {
    self.nodes.iter().find(|n| &n.id == key)
  }

  /// Number of distinct co-performers. Advisory only; never written back
  /// into the artist registry by recomputation.
  pub fn degree(&self, key: &ArtistKey) -> usize {
    let mut neighbours: Vec<&ArtistKey> = self
      .edges
      .iter()
      .filter(|e| e.touches(key))
      .map(|e| if &e.source == key { &e.target } else { &e.source })
      .filter(|other| *other != key)
      .collect();
    neighbours.sort();
    neighbours.dedup();
    neighbours.len()
  }

  pub fn edge_between(&self, a: &ArtistKey, b: &ArtistKey) -> Option<&GraphEdge> {
    self.edges.iter().find(|e| e.touches(a) && e.touches(b) && a != b)
  }
}

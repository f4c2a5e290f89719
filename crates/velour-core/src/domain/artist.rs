use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::ids::ArtistKey;

/// Estadísticas derivadas de la colección de shows.
///
/// `first_year`, `last_year` y `years_span` no se almacenan: se derivan de
/// `years_active`. `years_span` es la cantidad de años distintos, no la
/// diferencia entre el último y el primero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
  pub total_shows: u32,
  pub years_active: BTreeSet<i32>,
}

impl AggregateStats {
  /// Acumula una aparición en un show fechado.
  pub fn record_show(&mut self, year: i32) {
    self.total_shows += 1;
    self.years_active.insert(year);
  }

  pub fn first_year(&self) -> Option<i32> {
    self.years_active.first().copied()
  }

  pub fn last_year(&self) -> Option<i32> {
    self.years_active.last().copied()
  }

  pub fn years_span(&self) -> usize {
    self.years_active.len()
  }

  pub fn is_empty(&self) -> bool {
    self.total_shows == 0 && self.years_active.is_empty()
  }

  /// Suma de shows y unión de años (fusión y split sobre un artista existente).
  pub fn absorb(&mut self, other: &AggregateStats) {
    self.total_shows += other.total_shows;
    self.years_active.extend(other.years_active.iter().copied());
  }
}

/// Un artista del registro.
///
/// La identidad es `key`; `display_name` es mutable vía Edit. Las
/// estadísticas se recalculan desde los shows, salvo `connection_count`, que
/// proviene del grafo externo y solo se toca en Merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
  pub key: ArtistKey,

  pub display_name: String,

  #[serde(flatten)]
  pub stats: AggregateStats,

  /// Dato consultivo del grafo de co-actuaciones; no se deriva de los shows.
  #[serde(default)]
  pub connection_count: u32,

  /// Creado por Split y pendiente de reasignación manual de shows. Sus
  /// estadísticas copiadas sobreviven hasta el próximo recálculo completo.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub staged: bool,
}

impl Artist {
  /// Artista nuevo con estadísticas en cero.
  pub fn new(display_name: &str) -> Self {
    let display_name = display_name.trim().to_string();
    Artist {
      key: ArtistKey::from_name(&display_name),
      display_name,
      stats: AggregateStats::default(),
      connection_count: 0,
      staged: false,
    }
  }

  pub fn with_stats(mut self, stats: AggregateStats) -> Self {
    self.stats = stats;
    self
  }

  pub fn total_shows(&self) -> u32 {
    self.stats.total_shows
  }

  pub fn years_active(&self) -> &BTreeSet<i32> {
    &self.stats.years_active
  }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `velour`
#[derive(Parser, Debug)]
#[command(name = "velour")]
#[command(about = "Venue show archive: artist registry, show records and the co-performance graph")]
#[command(version)]
pub struct Cli {
  /// Config file to use instead of the platform one
  #[arg(long, global = true, env = "VELOUR_CONFIG")]
  pub config: Option<PathBuf>,

  /// Artists CSV, overriding `[source].artists_csv`
  #[arg(long, global = true)]
  pub artists_csv: Option<PathBuf>,

  /// Shows CSV, overriding `[source].shows_csv`
  #[arg(long, global = true)]
  pub shows_csv: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Open the session; imports the source CSVs when there is no usable snapshot
  Import,

  /// List registered artists
  Artists {
    #[arg(long, value_enum, default_value_t = ArtistOrder::Shows)]
    sort: ArtistOrder,

    #[arg(long)]
    limit: Option<usize>,
  },

  /// List shows, optionally only those of one artist or year
  Shows {
    #[arg(long)]
    artist: Option<String>,

    #[arg(long)]
    year: Option<i32>,
  },

  /// Rename an artist
  Edit { artist: String, name: String },

  /// Fold SOURCE into TARGET; SOURCE disappears
  Merge { source: String, target: String },

  /// Copy an artist's show history onto new names; the source is kept
  Split {
    source: String,

    #[arg(required = true, num_args = 1..)]
    names: Vec<String>,
  },

  /// Remove an artist from the registry; show references are kept
  Delete { artist: String },

  /// Add an artist name to a show
  ShowAdd { show: u32, name: String },

  /// Remove an artist name from a show
  ShowRemove { show: u32, name: String },

  /// Full recomputation from the show records, restoring orphaned artists
  Recompute,

  /// Detect artist names in show titles and descriptions
  Scan {
    /// Shows per committed chunk, overriding `[scanner].chunk_size`
    #[arg(long)]
    chunk_size: Option<usize>,
  },

  /// Write artists.csv, shows.csv and change_log.json
  Export {
    /// Target directory, overriding `[source].export_dir`
    #[arg(long)]
    dir: Option<PathBuf>,
  },

  /// Print the change log
  Log {
    #[arg(long)]
    json: bool,
  },

  /// Discard every change and reload the source CSVs
  Reset,

  /// Co-performance graph snapshots
  #[command(subcommand)]
  Graph(GraphCommand),
}

#[derive(Subcommand, Debug)]
pub enum GraphCommand {
  /// Build a graph from the current shows
  Build {
    #[arg(short, long)]
    out: PathBuf,
  },

  /// Replay the change log onto an existing graph snapshot
  Apply {
    graph: PathBuf,

    /// Where to write the result; defaults to overwriting GRAPH
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistOrder {
  Shows,
  Name,
}

pub mod artist;
pub mod change;
pub mod graph;
pub mod ids;
pub mod show;

pub use artist::{AggregateStats, Artist};
pub use change::{ChangeLog, ChangeRecord, Mutation, MutationKind};
pub use graph::{EdgeShow, GraphEdge, GraphNode, GraphSnapshot};
pub use ids::{ArtistKey, ShowId};
pub use show::Show;

pub mod bulk_scan;
pub mod catalog_service;
pub mod entity_store;
pub mod graph_sync;
pub mod mutations;
pub mod normalize;
pub mod propagation;
pub mod recompute;
pub mod snapshot;

pub use bulk_scan::{BulkScan, ScanSummary};
pub use catalog_service::{BatchOutcome, CatalogService, FlushStatus, LoadOrigin, LoadReport, Outcome};
pub use entity_store::EntityStore;
pub use graph_sync::{apply_changes, build_graph};
pub use mutations::{Command, ShowArtistChange};
pub use recompute::{RecomputeReport, RecomputeScope, recompute};

pub mod detector;
pub mod progress;
pub mod snapshot_repository;
pub mod source;

pub use detector::{ArtistDetector, KnownArtists};
pub use progress::{ProgressReporter, ScanProgress, SilentReporter};
pub use snapshot_repository::{MemorySnapshotRepository, RepoError, SlotWrite, SnapshotRepository, SnapshotSlot};
pub use source::{InMemorySource, ShowSource, SourceData};

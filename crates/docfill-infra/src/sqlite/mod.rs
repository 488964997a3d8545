//! SQLite storage layer.
//!
//! Artifact persistence backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod artifact;
pub mod pool;

pub use artifact::SqliteArtifactStore;
pub use pool::{DatabasePool, database_url};

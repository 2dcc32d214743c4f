//! Persistence layer abstractions and implementations.
//!
//! # Responsibility
//! - Define the snapshot persistence contract used by the task store.
//! - Isolate SQLite and JSON details from store orchestration.
//!
//! # Invariants
//! - The whole collection is written on every save; there are no partial
//!   updates.
//! - Loaded snapshots are validated before the store sees them.

pub mod snapshot;
pub mod snapshot_repo;

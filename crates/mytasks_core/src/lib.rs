//! Core task-list logic for MyTasks.
//! This crate is the single source of truth for task state invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Priority, ReminderHandle, Task, TaskId, TaskStats, TaskValidationError};
pub use reminder::{
    DisabledNotifier, Notifier, NotifierError, ReminderOutcome, ReminderPolicy, ReminderRequest,
    ReminderTicket,
};
pub use repo::snapshot_repo::{
    MemorySnapshotRepository, RepoError, RepoResult, SnapshotRepository,
    SqliteSnapshotRepository, SNAPSHOT_KEY,
};
pub use service::task_store::{
    AttachOutcome, SideEffectFailure, TaskStore, TaskStoreError, TaskStoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

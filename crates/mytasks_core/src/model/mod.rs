//! Domain model for the task list.
//!
//! # Responsibility
//! - Define canonical data structures used by the task store.
//! - Keep the persisted snapshot shape and the in-memory shape identical.
//!
//! # Invariants
//! - Every task is identified by a store-assigned `TaskId`.
//! - Deletion is a hard removal; ids are still never reused.

pub mod task;

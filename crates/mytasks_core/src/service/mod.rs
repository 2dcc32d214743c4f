//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate task state, reminders and persistence into use-case APIs.
//! - Keep FFI/CLI layers decoupled from storage and notification details.

pub mod task_store;

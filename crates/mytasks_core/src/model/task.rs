//! Task domain model.
//!
//! # Responsibility
//! - Define the single record shown by the task list screen.
//! - Own text normalization and record-level validation.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused for another task.
//! - `text` is trimmed and non-empty.
//! - A completed task never carries a `reminder_handle`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier. `0` and `TaskId::MAX` are never assigned.
pub type TaskId = u64;

/// Task urgency shown as a colored badge by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort weight used by presentation order. Higher sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// Stable label used by snapshots and FFI payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Parses a priority label, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier of one scheduled reminder, issued by a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(String);

impl ReminderHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ReminderHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    ZeroId,
    IdOutOfRange(TaskId),
    EmptyText(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroId => write!(f, "task id must be greater than 0"),
            Self::IdOutOfRange(id) => write!(f, "task id {id} is outside the assignable range"),
            Self::EmptyText(id) => write!(f, "task {id} has empty text"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Serialized with camelCase keys so snapshots written by earlier app
/// versions (`notificationId`) keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "notificationId")]
    pub reminder_handle: Option<ReminderHandle>,
}

impl Task {
    /// Creates an incomplete task without a reminder.
    ///
    /// `text` must already be normalized by [`normalize_task_text`].
    pub fn new(
        id: TaskId,
        text: impl Into<String>,
        priority: Priority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            priority,
            created_at,
            reminder_handle: None,
        }
    }

    /// Checks id and text.
    ///
    /// A completed task holding a handle passes; the store repairs it on load.
    pub fn validate_shape(&self) -> Result<(), TaskValidationError> {
        if self.id == 0 {
            return Err(TaskValidationError::ZeroId);
        }
        if self.id == TaskId::MAX {
            return Err(TaskValidationError::IdOutOfRange(self.id));
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText(self.id));
        }
        Ok(())
    }

    /// Whether the task should currently own a reminder.
    pub fn wants_reminder(&self) -> bool {
        !self.completed && self.reminder_handle.is_none()
    }
}

/// Trims user input. Returns `None` for blank input.
pub fn normalize_task_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Header counters shown above the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total: tasks.len(),
            pending: tasks.len() - completed,
            completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_task_text, Priority, Task, TaskId, TaskValidationError};
    use chrono::Utc;

    #[test]
    fn priority_rank_orders_high_first() {
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!(Priority::parse(" High "), Some(Priority::High));
        assert_eq!(Priority::parse("LOW"), Some(Priority::Low));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn normalize_task_text_trims_and_rejects_blank() {
        assert_eq!(normalize_task_text("  buy milk \n").as_deref(), Some("buy milk"));
        assert_eq!(normalize_task_text(""), None);
        assert_eq!(normalize_task_text(" \t "), None);
    }

    #[test]
    fn new_task_wants_reminder() {
        let task = Task::new(1, "call mom", Priority::default(), Utc::now());
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert!(task.wants_reminder());
        assert!(task.validate_shape().is_ok());
    }

    #[test]
    fn validate_shape_rejects_unassignable_ids() {
        let zero = Task::new(0, "x", Priority::Low, Utc::now());
        let max = Task::new(TaskId::MAX, "x", Priority::Low, Utc::now());
        assert_eq!(zero.validate_shape(), Err(TaskValidationError::ZeroId));
        assert_eq!(
            max.validate_shape(),
            Err(TaskValidationError::IdOutOfRange(TaskId::MAX))
        );
    }
}

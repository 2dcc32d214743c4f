//! Reminder port used by the task store.
//!
//! # Responsibility
//! - Define the notifier contract the store calls into.
//! - Define request tickets so late results can be matched to the request
//!   that produced them.
//!
//! # Invariants
//! - Requesting a reminder never blocks the store on delivery.
//! - Releasing a handle is idempotent; unknown handles are ignored.

pub mod local;

pub use local::DisabledNotifier;

use crate::model::task::{ReminderHandle, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

const REMINDER_TITLE: &str = "Task Reminder ⏰";
const DEFAULT_REMINDER_DELAY: Duration = Duration::from_secs(10);

/// Identifies one in-flight reminder request.
///
/// `sequence` is unique per store instance, so a ticket issued before a
/// delete, completion or re-edit never matches the task's current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderTicket {
    pub task_id: TaskId,
    pub sequence: u64,
}

/// Reminder request handed to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub ticket: ReminderTicket,
    pub text: String,
    pub delay: Duration,
}

impl ReminderRequest {
    pub fn task_id(&self) -> TaskId {
        self.ticket.task_id
    }

    /// Notification title shown by the host.
    pub fn title(&self) -> &'static str {
        REMINDER_TITLE
    }

    /// Notification body shown by the host.
    pub fn body(&self) -> String {
        format!("Time to complete: {}", self.text)
    }
}

/// Immediate result of a reminder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// The notifier scheduled the reminder synchronously.
    Scheduled(ReminderHandle),
    /// The handle arrives later through `TaskStore::attach_reminder`.
    Pending,
    /// No reminder will exist for this request (unsupported host, denied
    /// permission, ...).
    Unavailable,
}

/// Notifier-side failure. Never escalated to a task-state error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierError {
    Schedule(String),
    Release(String),
}

impl Display for NotifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule(message) => write!(f, "failed to schedule reminder: {message}"),
            Self::Release(message) => write!(f, "failed to release reminder: {message}"),
        }
    }
}

impl Error for NotifierError {}

/// Reminder collaborator of the task store.
pub trait Notifier {
    fn request_reminder(&self, request: &ReminderRequest) -> Result<ReminderOutcome, NotifierError>;
    fn release_reminder(&self, handle: &ReminderHandle) -> Result<(), NotifierError>;
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn request_reminder(&self, request: &ReminderRequest) -> Result<ReminderOutcome, NotifierError> {
        (**self).request_reminder(request)
    }

    fn release_reminder(&self, handle: &ReminderHandle) -> Result<(), NotifierError> {
        (**self).release_reminder(handle)
    }
}

/// When a requested reminder should fire.
///
/// Tasks carry no due date, so every reminder uses the same fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub delay: Duration,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_REMINDER_DELAY,
        }
    }
}

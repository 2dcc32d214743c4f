//! Task store use-case service.
//!
//! # Responsibility
//! - Hold the in-memory task collection and apply add/toggle/edit/delete.
//! - Couple every state transition to the reminder lifecycle.
//! - Persist the full collection once per successful mutation.
//!
//! # Invariants
//! - Ids are assigned monotonically and never reused.
//! - A completed task never holds a reminder handle.
//! - At most one reminder request is in flight per task; only the latest
//!   ticket may attach a handle.
//! - Notifier and persistence failures are logged, never returned.

use crate::model::task::{
    normalize_task_text, Priority, ReminderHandle, Task, TaskId, TaskStats,
};
use crate::reminder::{
    Notifier, NotifierError, ReminderOutcome, ReminderPolicy, ReminderRequest, ReminderTicket,
};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Caller-actionable task store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStoreError {
    /// Text was empty after trimming.
    EmptyInput,
    /// No task with this id exists.
    NotFound(TaskId),
    /// Every assignable id has been used.
    IdsExhausted,
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "task text cannot be empty"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::IdsExhausted => write!(f, "task id space exhausted"),
        }
    }
}

impl Error for TaskStoreError {}

/// Best-effort side effect that failed. Logged and swallowed by the store.
#[derive(Debug)]
pub enum SideEffectFailure {
    Persistence(RepoError),
    Notifier(NotifierError),
}

impl Display for SideEffectFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
            Self::Notifier(err) => write!(f, "notifier failed: {err}"),
        }
    }
}

impl Error for SideEffectFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::Notifier(err) => Some(err),
        }
    }
}

/// Result of applying a late reminder result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Handle stored on the task.
    Attached,
    /// Ticket was current but the notifier produced no handle.
    NoReminder,
    /// Ticket no longer matches the task's state; any handle was released.
    Discarded,
}

/// Explicit task store with injected persistence and notifier.
pub struct TaskStore<P: SnapshotRepository, N: Notifier> {
    tasks: Vec<Task>,
    next_id: TaskId,
    next_sequence: u64,
    in_flight: HashMap<TaskId, ReminderTicket>,
    policy: ReminderPolicy,
    persistence: P,
    notifier: N,
}

impl<P: SnapshotRepository, N: Notifier> TaskStore<P, N> {
    /// Creates an empty store. Nothing is loaded or persisted.
    pub fn new(persistence: P, notifier: N, policy: ReminderPolicy) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            next_sequence: 1,
            in_flight: HashMap::new(),
            policy,
            persistence,
            notifier,
        }
    }

    /// Creates a store and loads the persisted snapshot, if any.
    ///
    /// A snapshot that cannot be read is logged and the store starts empty.
    pub fn open(persistence: P, notifier: N, policy: ReminderPolicy) -> Self {
        let mut store = Self::new(persistence, notifier, policy);
        match store.persistence.load() {
            Ok(Some(snapshot)) => store.load(snapshot),
            Ok(None) => info!("event=store_open module=store status=ok snapshot=absent"),
            Err(err) => store.report(SideEffectFailure::Persistence(err), "store_open"),
        }
        store
    }

    /// Adds a task and requests its reminder.
    ///
    /// # Errors
    /// - [`TaskStoreError::EmptyInput`] when `raw_text` is blank.
    /// - [`TaskStoreError::IdsExhausted`] once `TaskId::MAX` is reached.
    pub fn add(&mut self, raw_text: &str, priority: Option<Priority>) -> TaskStoreResult<Task> {
        let text = normalize_task_text(raw_text).ok_or(TaskStoreError::EmptyInput)?;
        let id = self.next_id;
        if id == TaskId::MAX {
            return Err(TaskStoreError::IdsExhausted);
        }
        self.next_id = id + 1;

        let mut task = Task::new(id, text, priority.unwrap_or_default(), Utc::now());
        task.reminder_handle = self.request_reminder(id, &task.text);
        self.tasks.push(task.clone());

        info!(
            "event=task_add module=store status=ok task_id={id} priority={} reminder={}",
            task.priority,
            reminder_state(&task, self.in_flight.contains_key(&id))
        );
        self.persist("task_add");
        Ok(task)
    }

    /// Flips completion and adjusts the reminder accordingly.
    ///
    /// # Errors
    /// - [`TaskStoreError::NotFound`] for unknown ids.
    pub fn toggle_completion(&mut self, id: TaskId) -> TaskStoreResult<Task> {
        let index = self.index_of(id)?;
        let completed = !self.tasks[index].completed;
        self.tasks[index].completed = completed;

        if completed {
            self.in_flight.remove(&id);
            if let Some(handle) = self.tasks[index].reminder_handle.take() {
                self.release(&handle);
            }
        } else if self.tasks[index].reminder_handle.is_none() {
            let text = self.tasks[index].text.clone();
            let handle = self.request_reminder(id, &text);
            self.tasks[index].reminder_handle = handle;
        }

        info!("event=task_toggle module=store status=ok task_id={id} completed={completed}");
        self.persist("task_toggle");
        Ok(self.tasks[index].clone())
    }

    /// Replaces text and priority.
    ///
    /// Reminder churn only happens when the text changed and the task is
    /// incomplete with a handle or an in-flight request.
    ///
    /// # Errors
    /// - [`TaskStoreError::EmptyInput`] when `new_text` is blank.
    /// - [`TaskStoreError::NotFound`] for unknown ids.
    pub fn edit(
        &mut self,
        id: TaskId,
        new_text: &str,
        new_priority: Priority,
    ) -> TaskStoreResult<Task> {
        let text = normalize_task_text(new_text).ok_or(TaskStoreError::EmptyInput)?;
        let index = self.index_of(id)?;

        let text_changed = self.tasks[index].text != text;
        let has_reminder =
            self.tasks[index].reminder_handle.is_some() || self.in_flight.contains_key(&id);
        let reschedule = text_changed && !self.tasks[index].completed && has_reminder;

        self.tasks[index].text = text;
        self.tasks[index].priority = new_priority;

        if reschedule {
            self.in_flight.remove(&id);
            if let Some(handle) = self.tasks[index].reminder_handle.take() {
                self.release(&handle);
            }
            let text = self.tasks[index].text.clone();
            let handle = self.request_reminder(id, &text);
            self.tasks[index].reminder_handle = handle;
        }

        info!(
            "event=task_edit module=store status=ok task_id={id} priority={new_priority} text_changed={text_changed} rescheduled={reschedule}"
        );
        self.persist("task_edit");
        Ok(self.tasks[index].clone())
    }

    /// Releases the task's reminder and removes it.
    ///
    /// # Errors
    /// - [`TaskStoreError::NotFound`] for unknown ids.
    pub fn delete(&mut self, id: TaskId) -> TaskStoreResult<()> {
        let index = self.index_of(id)?;
        self.in_flight.remove(&id);
        if let Some(handle) = self.tasks[index].reminder_handle.take() {
            self.release(&handle);
        }
        self.tasks.remove(index);

        info!("event=task_delete module=store status=ok task_id={id}");
        self.persist("task_delete");
        Ok(())
    }

    /// Presentation order: incomplete first, then priority high to low.
    ///
    /// Equal keys keep insertion order. The stored order is untouched.
    pub fn sorted_view(&self) -> Vec<Task> {
        let mut view = self.tasks.clone();
        view.sort_by_key(|task| (task.completed, std::cmp::Reverse(task.priority.rank())));
        view
    }

    /// Replaces the collection with a decoded snapshot.
    ///
    /// Next id continues after the largest loaded id. Incomplete tasks
    /// without a handle get a fresh reminder request; completed tasks still
    /// holding one have it released. The snapshot is saved again whenever
    /// a handle was cleared or assigned.
    pub fn load(&mut self, snapshot: Vec<Task>) {
        self.in_flight.clear();
        self.tasks = snapshot;
        self.next_id = self
            .tasks
            .iter()
            .map(|task| task.id)
            .max()
            .unwrap_or(0)
            .saturating_add(1);

        let mut repaired = 0usize;
        let mut requested = 0usize;
        let mut assigned = 0usize;
        for index in 0..self.tasks.len() {
            let task = &self.tasks[index];
            if task.completed {
                if let Some(handle) = self.tasks[index].reminder_handle.take() {
                    self.release(&handle);
                    repaired += 1;
                }
            } else if task.reminder_handle.is_none() {
                let (id, text) = (task.id, task.text.clone());
                let handle = self.request_reminder(id, &text);
                if handle.is_some() {
                    assigned += 1;
                }
                self.tasks[index].reminder_handle = handle;
                requested += 1;
            }
        }

        info!(
            "event=store_load module=store status=ok count={} next_id={} reminders_requested={requested} handles_assigned={assigned} handles_repaired={repaired}",
            self.tasks.len(),
            self.next_id
        );
        if repaired > 0 || assigned > 0 {
            self.persist("store_load");
        }
    }

    /// Applies a reminder result that arrived after its request returned.
    ///
    /// The handle is kept only when `ticket` is the task's current request
    /// and the task still exists, is incomplete and has no handle. A
    /// discarded handle is released so no orphan reminder fires.
    pub fn attach_reminder(
        &mut self,
        ticket: ReminderTicket,
        handle: Option<ReminderHandle>,
    ) -> AttachOutcome {
        let current = self.in_flight.get(&ticket.task_id) == Some(&ticket);
        let index = self.tasks.iter().position(|task| task.id == ticket.task_id);

        let index = match index {
            Some(index) if current && self.tasks[index].wants_reminder() => index,
            _ => {
                if current {
                    self.in_flight.remove(&ticket.task_id);
                }
                if let Some(handle) = handle {
                    self.release(&handle);
                }
                debug!(
                    "event=reminder_attach module=store status=discarded task_id={} sequence={}",
                    ticket.task_id, ticket.sequence
                );
                return AttachOutcome::Discarded;
            }
        };

        self.in_flight.remove(&ticket.task_id);
        let Some(handle) = handle else {
            debug!(
                "event=reminder_attach module=store status=empty task_id={}",
                ticket.task_id
            );
            return AttachOutcome::NoReminder;
        };

        self.tasks[index].reminder_handle = Some(handle);
        debug!(
            "event=reminder_attach module=store status=ok task_id={}",
            ticket.task_id
        );
        self.persist("reminder_attach");
        AttachOutcome::Attached
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Id the next `add` will assign.
    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// Number of reminder requests awaiting `attach_reminder`.
    pub fn pending_reminder_count(&self) -> usize {
        self.in_flight.len()
    }

    /// In-flight ticket for `id`, if any.
    pub fn pending_ticket(&self, id: TaskId) -> Option<ReminderTicket> {
        self.in_flight.get(&id).copied()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn index_of(&self, id: TaskId) -> TaskStoreResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskStoreError::NotFound(id))
    }

    /// Issues a new ticket and asks the notifier. Returns a handle only for
    /// synchronous scheduling; `Pending` leaves the ticket in flight.
    fn request_reminder(&mut self, task_id: TaskId, text: &str) -> Option<ReminderHandle> {
        let ticket = ReminderTicket {
            task_id,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        let request = ReminderRequest {
            ticket,
            text: text.to_string(),
            delay: self.policy.delay,
        };
        match self.notifier.request_reminder(&request) {
            Ok(ReminderOutcome::Scheduled(handle)) => Some(handle),
            Ok(ReminderOutcome::Pending) => {
                self.in_flight.insert(task_id, ticket);
                None
            }
            Ok(ReminderOutcome::Unavailable) => None,
            Err(err) => {
                self.report(SideEffectFailure::Notifier(err), "reminder_request");
                None
            }
        }
    }

    fn release(&self, handle: &ReminderHandle) {
        if let Err(err) = self.notifier.release_reminder(handle) {
            self.report(SideEffectFailure::Notifier(err), "reminder_release");
        }
    }

    fn persist(&self, event: &str) {
        if let Err(err) = self.persistence.save(&self.tasks) {
            self.report(SideEffectFailure::Persistence(err), event);
        }
    }

    fn report(&self, failure: SideEffectFailure, event: &str) {
        warn!("event={event} module=store status=side_effect_failed error={failure}");
    }
}

fn reminder_state(task: &Task, pending: bool) -> &'static str {
    match (&task.reminder_handle, pending) {
        (Some(_), _) => "scheduled",
        (None, true) => "pending",
        (None, false) => "none",
    }
}

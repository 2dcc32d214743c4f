//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task list use-cases to Dart via FRB.
//! - Broker reminders: the core queues requests, the host schedules real
//!   notifications and reports handles back with `reminder_attach`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One process-wide store; every call is serialized behind its lock.
//! - Priorities cross the boundary as `high|medium|low` labels.

use log::warn;
use mytasks_core::db::open_db;
use mytasks_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AttachOutcome, CoreConfig, Notifier, NotifierError, Priority, ReminderHandle,
    ReminderOutcome, ReminderRequest, ReminderTicket, SqliteSnapshotRepository, Task, TaskStore,
};
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type HostStore = TaskStore<SqliteSnapshotRepository, HostNotifier>;

struct OpenStore {
    db_path: PathBuf,
    store: HostStore,
}

static STORE: Lazy<Mutex<Option<OpenStore>>> = Lazy::new(|| Mutex::new(None));

/// Notifier that hands reminder work to the Flutter host.
///
/// Requests resolve later through [`reminder_attach`]; releases are queued
/// for the host to cancel.
#[derive(Default)]
struct HostNotifier {
    requests: Mutex<VecDeque<ReminderRequest>>,
    releases: Mutex<Vec<ReminderHandle>>,
}

impl Notifier for HostNotifier {
    fn request_reminder(&self, request: &ReminderRequest) -> Result<ReminderOutcome, NotifierError> {
        self.requests
            .lock()
            .map_err(|_| NotifierError::Schedule("request queue poisoned".to_string()))?
            .push_back(request.clone());
        Ok(ReminderOutcome::Pending)
    }

    fn release_reminder(&self, handle: &ReminderHandle) -> Result<(), NotifierError> {
        self.releases
            .lock()
            .map_err(|_| NotifierError::Release("release queue poisoned".to_string()))?
            .push(handle.clone());
        Ok(())
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the task store at `db_path` (or the configured default when
/// `None`) and loads the persisted snapshot.
///
/// # FFI contract
/// - Idempotent for the same path.
/// - Switching to a different path after the store is open is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_store(db_path: Option<String>) -> String {
    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => return format!("configure_store failed: {err}"),
    };
    let requested = db_path
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| config.db_path.clone());

    let mut guard = match STORE.lock() {
        Ok(guard) => guard,
        Err(_) => return "configure_store failed: store lock poisoned".to_string(),
    };
    if let Some(open) = guard.as_ref() {
        if open.db_path == requested {
            return String::new();
        }
        return format!(
            "store already open at `{}`; refusing to switch to `{}`",
            open.db_path.display(),
            requested.display()
        );
    }

    match open_store(&requested, &config) {
        Ok(open) => {
            *guard = Some(open);
            String::new()
        }
        Err(err) => format!("configure_store failed: {err}"),
    }
}

/// Task row rendered by the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    /// `high|medium|low`.
    pub priority: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub has_reminder: bool,
}

/// Response envelope for task mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Task after the mutation; `None` on failure and for deletes.
    pub task: Option<TaskItem>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task: Option<TaskItem>) -> Self {
        Self {
            ok: true,
            task,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task: None,
            message: message.into(),
        }
    }
}

/// Header counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStatsResponse {
    pub total: u64,
    pub pending: u64,
    pub completed: u64,
}

/// Reminder the host must schedule, then report with `reminder_attach`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequestItem {
    pub task_id: u64,
    pub sequence: u64,
    pub title: String,
    pub body: String,
    pub delay_ms: u64,
}

/// Adds a task. `priority` defaults to medium when `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(text: String, priority: Option<String>) -> TaskActionResponse {
    let priority = match priority.as_deref().map(parse_priority).transpose() {
        Ok(priority) => priority,
        Err(message) => return TaskActionResponse::failure(message),
    };
    mutate("task_add", "Task created.", |store| {
        store.add(&text, priority).map(Some)
    })
}

/// Flips completion of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: u64) -> TaskActionResponse {
    mutate("task_toggle", "Task updated.", |store| {
        store.toggle_completion(id).map(Some)
    })
}

/// Replaces text and priority of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_edit(id: u64, text: String, priority: String) -> TaskActionResponse {
    let priority = match parse_priority(&priority) {
        Ok(priority) => priority,
        Err(message) => return TaskActionResponse::failure(message),
    };
    mutate("task_edit", "Task updated.", |store| {
        store.edit(id, &text, priority).map(Some)
    })
}

/// Deletes one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: u64) -> TaskActionResponse {
    mutate("task_delete", "Task deleted.", |store| {
        store.delete(id).map(|()| None)
    })
}

/// Tasks in presentation order. Empty when the store cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> Vec<TaskItem> {
    with_store(|store| store.sorted_view().iter().map(to_task_item).collect())
        .unwrap_or_else(|err| {
            warn!("event=task_list module=ffi status=error error={err}");
            Vec::new()
        })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_stats() -> TaskStatsResponse {
    with_store(|store| {
        let stats = store.stats();
        TaskStatsResponse {
            total: stats.total as u64,
            pending: stats.pending as u64,
            completed: stats.completed as u64,
        }
    })
    .unwrap_or_default()
}

/// Drains reminder requests queued since the last call.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_take_requests() -> Vec<ReminderRequestItem> {
    with_store(|store| {
        let Ok(mut queue) = store.notifier().requests.lock() else {
            return Vec::new();
        };
        let items = queue
            .drain(..)
            .map(|request| ReminderRequestItem {
                task_id: request.task_id(),
                sequence: request.ticket.sequence,
                title: request.title().to_string(),
                body: request.body(),
                delay_ms: u64::try_from(request.delay.as_millis()).unwrap_or(u64::MAX),
            })
            .collect::<Vec<_>>();
        items
    })
    .unwrap_or_default()
}

/// Drains reminder handles the host must cancel.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_take_releases() -> Vec<String> {
    with_store(|store| {
        let Ok(mut queue) = store.notifier().releases.lock() else {
            return Vec::new();
        };
        let handles = queue
            .drain(..)
            .map(|handle| handle.to_string())
            .collect::<Vec<_>>();
        handles
    })
    .unwrap_or_default()
}

/// Reports the host's result for one reminder request.
///
/// `handle = None` means the host could not schedule it.
///
/// # FFI contract
/// - Returns `attached`, `no_reminder` or `discarded`.
/// - A discarded handle is queued for release again.
/// - Returns `error: ...` when the store is unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_attach(task_id: u64, sequence: u64, handle: Option<String>) -> String {
    let ticket = ReminderTicket { task_id, sequence };
    let handle = handle
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(ReminderHandle::new);
    match with_store(|store| store.attach_reminder(ticket, handle)) {
        Ok(AttachOutcome::Attached) => "attached".to_string(),
        Ok(AttachOutcome::NoReminder) => "no_reminder".to_string(),
        Ok(AttachOutcome::Discarded) => "discarded".to_string(),
        Err(err) => format!("error: {err}"),
    }
}

fn open_store(db_path: &Path, config: &CoreConfig) -> Result<OpenStore, String> {
    let conn = open_db(db_path).map_err(|err| format!("task DB open failed: {err}"))?;
    let store = TaskStore::open(
        SqliteSnapshotRepository::new(conn),
        HostNotifier::default(),
        config.reminder_policy(),
    );
    Ok(OpenStore {
        db_path: db_path.to_path_buf(),
        store,
    })
}

/// Runs `f` against the process-wide store, opening it from config on
/// first use.
fn with_store<T>(f: impl FnOnce(&mut HostStore) -> T) -> Result<T, String> {
    let mut guard = STORE
        .lock()
        .map_err(|_| "store lock poisoned".to_string())?;
    if guard.is_none() {
        let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
        *guard = Some(open_store(&config.db_path, &config)?);
    }
    match guard.as_mut() {
        Some(open) => Ok(f(&mut open.store)),
        None => Err("store unavailable".to_string()),
    }
}

fn mutate(
    op: &str,
    success_message: &str,
    f: impl FnOnce(&mut HostStore) -> mytasks_core::TaskStoreResult<Option<Task>>,
) -> TaskActionResponse {
    match with_store(f) {
        Ok(Ok(task)) => {
            TaskActionResponse::success(success_message, task.as_ref().map(to_task_item))
        }
        Ok(Err(err)) => TaskActionResponse::failure(format!("{op} failed: {err}")),
        Err(err) => TaskActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("unsupported priority `{raw}`; expected high|medium|low"))
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id,
        text: task.text.clone(),
        completed: task.completed,
        priority: task.priority.as_str().to_ascii_lowercase(),
        created_at: task.created_at.to_rfc3339(),
        has_reminder: task.reminder_handle.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_store, core_version, init_logging, ping, reminder_attach,
        reminder_take_releases, reminder_take_requests, task_add, task_delete, task_edit,
        task_list, task_toggle,
    };
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_DB: OnceLock<PathBuf> = OnceLock::new();

    fn ensure_store() {
        let path = TEST_DB.get_or_init(|| {
            std::env::temp_dir().join(format!("mytasks-ffi-{}.sqlite3", std::process::id()))
        });
        let error = configure_store(Some(path.to_string_lossy().into_owned()));
        assert!(error.is_empty(), "{error}");
    }

    fn unique_text(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn configure_store_rejects_switching_paths() {
        ensure_store();
        let error = configure_store(Some("/tmp/another-mytasks.sqlite3".to_string()));
        assert!(error.contains("refusing to switch"));
    }

    #[test]
    fn task_add_rejects_blank_text_and_unknown_priority() {
        ensure_store();
        let blank = task_add("   ".to_string(), None);
        assert!(!blank.ok);
        assert!(blank.message.contains("empty"));

        let bad_priority = task_add("x".to_string(), Some("urgent".to_string()));
        assert!(!bad_priority.ok);
        assert!(bad_priority.message.contains("priority"));
    }

    #[test]
    fn task_lifecycle_round_trips_through_ffi() {
        ensure_store();
        let text = unique_text("ffi-task");
        let created = task_add(format!("  {text} "), Some("HIGH".to_string()));
        assert!(created.ok, "{}", created.message);
        let item = created.task.expect("created task should be returned");
        assert_eq!(item.text, text);
        assert_eq!(item.priority, "high");
        assert!(!item.has_reminder);

        let listed = task_list();
        assert!(listed.iter().any(|task| task.id == item.id));

        let edited = task_edit(item.id, text.clone(), "low".to_string());
        assert!(edited.ok, "{}", edited.message);
        assert_eq!(edited.task.unwrap().priority, "low");

        let toggled = task_toggle(item.id);
        assert!(toggled.task.unwrap().completed);

        let deleted = task_delete(item.id);
        assert!(deleted.ok);
        assert!(!task_list().iter().any(|task| task.id == item.id));
        assert!(!task_toggle(item.id).ok);
    }

    #[test]
    fn reminder_requests_are_brokered_to_host() {
        ensure_store();
        let text = unique_text("ffi-reminder");
        let item = task_add(text.clone(), None).task.expect("task created");

        let requests = reminder_take_requests();
        let request = requests
            .iter()
            .find(|request| request.task_id == item.id)
            .expect("add should queue a reminder request");
        assert_eq!(request.body, format!("Time to complete: {text}"));

        let outcome = reminder_attach(item.id, request.sequence, Some("host-1".to_string()));
        assert_eq!(outcome, "attached");
        assert!(task_list()
            .iter()
            .any(|task| task.id == item.id && task.has_reminder));

        task_delete(item.id);
        assert!(reminder_take_releases().contains(&"host-1".to_string()));
        assert_eq!(
            reminder_attach(item.id, request.sequence, Some("late".to_string())),
            "discarded"
        );
    }
}

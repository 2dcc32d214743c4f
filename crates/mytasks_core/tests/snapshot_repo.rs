use chrono::{TimeZone, Utc};
use mytasks_core::db::{open_db, open_db_in_memory};
use mytasks_core::{
    DisabledNotifier, Priority, ReminderHandle, ReminderPolicy, RepoError, SnapshotRepository,
    SqliteSnapshotRepository, Task, TaskStore, SNAPSHOT_KEY,
};

fn sample_tasks() -> Vec<Task> {
    let created_at = Utc.with_ymd_and_hms(2026, 2, 14, 8, 0, 0).unwrap();
    let mut first = Task::new(1, "buy flowers", Priority::High, created_at);
    first.reminder_handle = Some(ReminderHandle::new("n-1"));
    let mut second = Task::new(2, "book table", Priority::Low, created_at);
    second.completed = true;
    vec![first, second]
}

#[test]
fn load_returns_none_before_first_save() {
    let repo = SqliteSnapshotRepository::new(open_db_in_memory().unwrap());
    assert!(repo.load().unwrap().is_none());
}

#[test]
fn save_then_load_preserves_order_and_fields() {
    let repo = SqliteSnapshotRepository::new(open_db_in_memory().unwrap());
    let tasks = sample_tasks();

    repo.save(&tasks).unwrap();
    repo.save(&tasks[..1]).unwrap();
    repo.save(&tasks).unwrap();

    assert_eq!(repo.load().unwrap().unwrap(), tasks);
    let rows: i64 = repo
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn stored_snapshot_uses_camel_case_labels() {
    let repo = SqliteSnapshotRepository::new(open_db_in_memory().unwrap());
    repo.save(&sample_tasks()).unwrap();

    let raw: String = repo
        .connection()
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1;",
            [SNAPSHOT_KEY],
            |row| row.get(0),
        )
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json[0]["id"], 1);
    assert_eq!(json[0]["priority"], "HIGH");
    assert_eq!(json[0]["createdAt"], "2026-02-14T08:00:00Z");
    assert_eq!(json[0]["reminderHandle"], "n-1");
    assert_eq!(json[1]["completed"], true);
    assert!(json[1]["reminderHandle"].is_null());
}

#[test]
fn invalid_persisted_snapshot_is_rejected() {
    let repo = SqliteSnapshotRepository::new(open_db_in_memory().unwrap());
    repo.connection()
        .execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2);",
            [SNAPSHOT_KEY, r#"[{"id":0,"text":"x","createdAt":"2026-01-01T00:00:00Z"}]"#],
        )
        .unwrap();

    assert!(matches!(repo.load().unwrap_err(), RepoError::InvalidData(_)));
}

#[test]
fn store_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    {
        let repo = SqliteSnapshotRepository::new(open_db(&path).unwrap());
        let mut store = TaskStore::new(repo, DisabledNotifier, ReminderPolicy::default());
        store.add("first", Some(Priority::Low)).unwrap();
        let second = store.add("second", Some(Priority::High)).unwrap();
        store.toggle_completion(second.id).unwrap();
        store.add("third", None).unwrap();
        store.delete(1).unwrap();
    }

    let repo = SqliteSnapshotRepository::new(open_db(&path).unwrap());
    let mut store = TaskStore::open(repo, DisabledNotifier, ReminderPolicy::default());

    let ids = store.tasks().iter().map(|task| task.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 3]);
    assert!(store.get(2).unwrap().completed);
    assert_eq!(store.add("fourth", None).unwrap().id, 4);
}

//! JSON snapshot codec.
//!
//! A snapshot is a JSON array of task records in insertion order, e.g.
//! `[{"id":1,"text":"buy milk","completed":false,"priority":"HIGH",
//! "createdAt":"2026-01-01T09:00:00Z","reminderHandle":null}]`.

use crate::model::task::Task;
use crate::repo::snapshot_repo::{RepoError, RepoResult};
use std::collections::HashSet;

/// Encodes tasks in their current order.
pub fn encode_snapshot(tasks: &[Task]) -> RepoResult<String> {
    Ok(serde_json::to_string(tasks)?)
}

/// Decodes and validates a snapshot.
///
/// Rejects records with id `0`, blank text, or an id used twice. A completed
/// record that still carries a reminder handle is accepted here; the store
/// repairs it on load.
pub fn decode_snapshot(raw: &str) -> RepoResult<Vec<Task>> {
    let tasks: Vec<Task> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        task.validate_shape()?;
        if !seen.insert(task.id) {
            return Err(RepoError::duplicate_id(task.id));
        }
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::decode_snapshot;
    use crate::model::task::Priority;
    use crate::repo::snapshot_repo::RepoError;

    #[test]
    fn decode_accepts_legacy_notification_key_and_missing_priority() {
        let raw = r#"[
            {"id": 3, "text": "water plants", "completed": false,
             "createdAt": "2025-05-01T08:30:00.000Z", "notificationId": "abc-1"}
        ]"#;

        let tasks = decode_snapshot(raw).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, Priority::Medium);
        assert_eq!(
            tasks[0].reminder_handle.as_ref().map(|h| h.as_str()),
            Some("abc-1")
        );
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let raw = r#"[
            {"id": 1, "text": "a", "priority": "LOW", "createdAt": "2025-05-01T08:30:00Z"},
            {"id": 1, "text": "b", "priority": "LOW", "createdAt": "2025-05-01T08:31:00Z"}
        ]"#;

        let err = decode_snapshot(raw).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("duplicate")));
    }

    #[test]
    fn decode_rejects_blank_text() {
        let raw = r#"[{"id": 2, "text": "  ", "createdAt": "2025-05-01T08:30:00Z"}]"#;
        assert!(matches!(
            decode_snapshot(raw).unwrap_err(),
            RepoError::InvalidData(_)
        ));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(matches!(
            decode_snapshot("{not json").unwrap_err(),
            RepoError::Codec(_)
        ));
    }
}

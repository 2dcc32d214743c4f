//! In-process notifier implementations.

use super::{Notifier, NotifierError, ReminderOutcome, ReminderRequest};
use crate::model::task::ReminderHandle;

/// Notifier for hosts without local notification support.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn request_reminder(&self, _request: &ReminderRequest) -> Result<ReminderOutcome, NotifierError> {
        Ok(ReminderOutcome::Unavailable)
    }

    fn release_reminder(&self, _handle: &ReminderHandle) -> Result<(), NotifierError> {
        Ok(())
    }
}

//! Notification port.

use std::path::Path;

use crate::domain::error::NotifyError;

/// Delivers alert summaries and attachments.
///
/// Callers log failures and carry on; a notifier never aborts a run.
pub trait NotifierPort: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), NotifyError>;

    fn send_file(&self, path: &Path, caption: &str) -> Result<(), NotifyError>;
}

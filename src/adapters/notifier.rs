//! Local notifier adapters.
//!
//! [`LogNotifier`] emits messages through `tracing`. [`OutboxNotifier`] drops
//! each message (and copies each attachment) into an outbox directory for an
//! external delivery process to pick up.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

use crate::domain::error::NotifyError;
use crate::ports::notifier_port::NotifierPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotifierPort for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        for line in message.lines() {
            info!(target: "sigtrader::notify", "{}", line);
        }
        Ok(())
    }

    fn send_file(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        info!(target: "sigtrader::notify", file = %path.display(), "{}", caption);
        Ok(())
    }
}

#[derive(Debug)]
pub struct OutboxNotifier {
    dir: PathBuf,
    sequence: AtomicUsize,
}

impl OutboxNotifier {
    /// Create the outbox directory if needed. Numbering continues after any
    /// messages already present.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, NotifyError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| NotifyError {
            reason: format!("cannot create outbox {}: {}", dir.display(), e),
        })?;
        let existing = fs::read_dir(&dir)
            .map_err(|e| NotifyError {
                reason: format!("cannot read outbox {}: {}", dir.display(), e),
            })?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| sequence_of(&entry.file_name().to_string_lossy()))
            .max()
            .unwrap_or(0);
        Ok(Self {
            dir,
            sequence: AtomicUsize::new(existing),
        })
    }

    fn next_prefix(&self) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:04}", n)
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), NotifyError> {
        fs::write(path, content).map_err(|e| NotifyError {
            reason: format!("cannot write {}: {}", path.display(), e),
        })
    }
}

fn sequence_of(name: &str) -> Option<usize> {
    name.split(['-', '.']).next()?.parse().ok()
}

impl NotifierPort for OutboxNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let path = self.dir.join(format!("{}-message.txt", self.next_prefix()));
        self.write(&path, message)
    }

    fn send_file(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        let name = path
            .file_name()
            .ok_or_else(|| NotifyError {
                reason: format!("{} is not a file", path.display()),
            })?
            .to_string_lossy()
            .to_string();
        let prefix = self.next_prefix();
        let target = self.dir.join(format!("{}-{}", prefix, name));
        fs::copy(path, &target).map_err(|e| NotifyError {
            reason: format!("cannot attach {}: {}", path.display(), e),
        })?;
        self.write(&self.dir.join(format!("{}-caption.txt", prefix)), caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn log_notifier_never_fails() {
        assert!(LogNotifier.notify("2 alerts").is_ok());
        assert!(LogNotifier.send_file(Path::new("alerts.csv"), "alerts").is_ok());
    }

    #[test]
    fn outbox_writes_numbered_messages() {
        let dir = TempDir::new().unwrap();
        let outbox_dir = dir.path().join("outbox");
        let outbox = OutboxNotifier::new(&outbox_dir).unwrap();
        outbox.notify("first").unwrap();
        outbox.notify("second").unwrap();

        assert_eq!(
            names(&outbox_dir),
            vec!["0001-message.txt", "0002-message.txt"]
        );
        let second = fs::read_to_string(outbox_dir.join("0002-message.txt")).unwrap();
        assert_eq!(second, "second");
    }

    #[test]
    fn outbox_continues_numbering() {
        let dir = TempDir::new().unwrap();
        OutboxNotifier::new(dir.path()).unwrap().notify("a").unwrap();
        OutboxNotifier::new(dir.path()).unwrap().notify("b").unwrap();
        assert_eq!(
            names(dir.path()),
            vec!["0001-message.txt", "0002-message.txt"]
        );
    }

    #[test]
    fn outbox_copies_attachment_with_caption() {
        let dir = TempDir::new().unwrap();
        let attachment = dir.path().join("alerts.csv");
        fs::write(&attachment, "symbol\nTCS\n").unwrap();

        let outbox_dir = dir.path().join("outbox");
        let outbox = OutboxNotifier::new(&outbox_dir).unwrap();
        outbox.send_file(&attachment, "scan alerts").unwrap();

        assert_eq!(
            names(&outbox_dir),
            vec!["0001-alerts.csv", "0001-caption.txt"]
        );
        let copied = fs::read_to_string(outbox_dir.join("0001-alerts.csv")).unwrap();
        assert_eq!(copied, "symbol\nTCS\n");
    }

    #[test]
    fn missing_attachment_is_error() {
        let dir = TempDir::new().unwrap();
        let outbox = OutboxNotifier::new(dir.path()).unwrap();
        assert!(outbox.send_file(&dir.path().join("nope.csv"), "x").is_err());
    }
}

//! Pending notarization notifications.
//!
//! In-memory only. Whatever is pending when the process stops is lost; the
//! events are re-derived from normal chain processing.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::domain::{NotarizationTarget, NotarizedNotification};

/// One pending set: `miniblock hash -> notification`, for a single target.
pub struct PendingNotifications {
    target: NotarizationTarget,
    entries: Mutex<HashMap<Vec<u8>, NotarizedNotification>>,
}

impl PendingNotifications {
    pub fn new(target: NotarizationTarget) -> Self {
        Self {
            target,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn target(&self) -> NotarizationTarget {
        self.target
    }

    /// Insert or overwrite. Last write wins.
    pub fn set(&self, miniblock_hash: Vec<u8>, notification: NotarizedNotification) {
        self.entries.lock().insert(miniblock_hash, notification);
    }

    pub fn get(&self, miniblock_hash: &[u8]) -> Option<NotarizedNotification> {
        self.entries.lock().get(miniblock_hash).cloned()
    }

    /// Snapshot of the keys currently pending.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Remove the entry only if it still holds `applied`.
    ///
    /// An entry overwritten after it was read stays for the next pass.
    pub fn remove_if_unchanged(&self, miniblock_hash: &[u8], applied: &NotarizedNotification) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(miniblock_hash) {
            Some(current) if current == applied => {
                entries.remove(miniblock_hash);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(nonce: u64) -> NotarizedNotification {
        NotarizedNotification {
            meta_nonce: nonce,
            meta_hash: vec![nonce as u8; 32],
        }
    }

    #[test]
    fn test_last_write_wins() {
        let pending = PendingNotifications::new(NotarizationTarget::Source);
        pending.set(b"mb".to_vec(), notification(1));
        pending.set(b"mb".to_vec(), notification(2));

        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get(b"mb"), Some(notification(2)));
    }

    #[test]
    fn test_remove_if_unchanged() {
        let pending = PendingNotifications::new(NotarizationTarget::Both);
        pending.set(b"mb".to_vec(), notification(1));

        assert!(pending.remove_if_unchanged(b"mb", &notification(1)));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_remove_keeps_overwritten_entry() {
        let pending = PendingNotifications::new(NotarizationTarget::Destination);
        pending.set(b"mb".to_vec(), notification(1));
        let applied = pending.get(b"mb").unwrap();
        pending.set(b"mb".to_vec(), notification(2));

        assert!(!pending.remove_if_unchanged(b"mb", &applied));
        assert_eq!(pending.get(b"mb"), Some(notification(2)));
    }
}

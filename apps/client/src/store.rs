#![allow(dead_code)]

use tokio::sync::watch;

use crate::models::cv::CvRecord;

/// Owner of the "current record" the display surface is showing.
///
/// Listeners subscribe with [`RecordStore::subscribe`] and observe every
/// replacement; dropping the receiver unsubscribes. The watch channel
/// keeps only the latest value, so a listener that is busy when several
/// swaps land wakes up once with the newest record.
pub struct RecordStore {
    tx: watch::Sender<Option<CvRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<CvRecord> {
        self.tx.borrow().clone()
    }

    /// Replaces the current record and notifies subscribers.
    pub fn replace(&self, record: CvRecord) {
        self.tx.send_replace(Some(record));
    }

    /// Clears the current record (e.g. after a delete).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CvRecord>> {
        self.tx.subscribe()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_record;

    #[tokio::test]
    async fn test_replace_notifies_subscriber() {
        let store = RecordStore::new();
        let mut rx = store.subscribe();

        store.replace(sample_record("a"));
        assert!(rx.changed().await.is_ok());
        assert_eq!(
            rx.borrow_and_update().as_ref().and_then(|r| r.id.clone()),
            Some("a".to_string())
        );
    }

    #[tokio::test]
    async fn test_burst_coalesces_to_latest() {
        let store = RecordStore::new();
        let mut rx = store.subscribe();

        store.replace(sample_record("a"));
        store.replace(sample_record("b"));
        store.replace(sample_record("c"));

        assert!(rx.changed().await.is_ok());
        assert_eq!(
            rx.borrow_and_update().as_ref().and_then(|r| r.id.clone()),
            Some("c".to_string())
        );
    }

    #[test]
    fn test_clear_empties_current() {
        let store = RecordStore::new();
        store.replace(sample_record("a"));
        assert!(store.current().is_some());
        store.clear();
        assert!(store.current().is_none());
    }
}

//! In-memory sink for tests and embedding.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{BoxFuture, MileageSink, SinkError};
use crate::tracking::MileageRecord;

/// Sink that keeps records in a vector.
///
/// Can be told to reject the next N writes to exercise retry paths.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, MileageRecord)>>,
    fail_next: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` writes.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Stored records, without the user id.
    pub fn records(&self) -> Vec<MileageRecord> {
        self.records.lock().iter().map(|(_, r)| r.clone()).collect()
    }

    /// Stored records for one user.
    pub fn records_for(&self, user_id: &str) -> Vec<MileageRecord> {
        self.records
            .lock()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Total `append` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MileageSink for MemorySink {
    fn append<'a>(
        &'a self,
        record: &'a MileageRecord,
        user_id: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let rejected = self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                return Err(SinkError::Rejected("injected failure".to_string()));
            }
            self.records
                .lock()
                .push((user_id.to_string(), record.clone()));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use chrono::Utc;

    fn record(code: &str) -> MileageRecord {
        MileageRecord {
            jurisdiction: code.into(),
            miles: 5.0,
            occurred_at: Utc::now(),
            endpoint: Coordinate::new(39.0, -104.0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_stores_by_user() {
        let sink = MemorySink::new();
        sink.append(&record("CO"), "alice").await.unwrap();
        sink.append(&record("KS"), "bob").await.unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records_for("alice").len(), 1);
        assert_eq!(sink.records_for("alice")[0].jurisdiction.as_str(), "CO");
    }

    #[tokio::test]
    async fn test_fail_next() {
        let sink = MemorySink::new();
        sink.fail_next(2);

        assert!(sink.append(&record("CO"), "u").await.is_err());
        assert!(sink.append(&record("CO"), "u").await.is_err());
        assert!(sink.append(&record("CO"), "u").await.is_ok());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.attempts(), 3);
    }
}

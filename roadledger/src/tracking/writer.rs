//! Background sink writer with bounded retries.
//!
//! Records are enqueued without waiting and written by a dedicated task, so
//! a slow or failing sink never holds up position processing. Each record is
//! retried per the [`RetryPolicy`]; records that exhaust their attempts are
//! kept and handed back by [`SinkWriter::drain`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::record::MileageRecord;
use super::retry::RetryPolicy;
use crate::sink::MileageSink;

/// Counters shared between the writer handle and its task.
#[derive(Debug, Default)]
struct WriterStats {
    enqueued: AtomicU64,
    saved: AtomicU64,
    failed: AtomicU64,
}

impl WriterStats {
    fn pending(&self) -> u64 {
        let done = self.saved.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst);
        self.enqueued.load(Ordering::SeqCst).saturating_sub(done)
    }
}

/// Outcome of draining the writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriterReport {
    /// Records the sink accepted.
    pub saved: u64,
    /// Records that were never persisted.
    pub unsaved: Vec<MileageRecord>,
}

/// Enqueue-and-forget writer in front of a [`MileageSink`].
pub struct SinkWriter {
    tx: Mutex<Option<mpsc::UnboundedSender<MileageRecord>>>,
    task: Mutex<Option<JoinHandle<Vec<MileageRecord>>>>,
    stats: Arc<WriterStats>,
}

impl SinkWriter {
    /// Start the writer task. Must be called within a Tokio runtime.
    pub fn spawn(sink: Arc<dyn MileageSink>, user_id: impl Into<String>, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(WriterStats::default());
        let task = tokio::spawn(write_loop(
            sink,
            user_id.into(),
            policy,
            rx,
            Arc::clone(&stats),
        ));

        Self {
            tx: Mutex::new(Some(tx)),
            task: Mutex::new(Some(task)),
            stats,
        }
    }

    /// Queue a record for writing. Returns `false` once the writer is drained.
    pub fn enqueue(&self, record: MileageRecord) -> bool {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            warn!(jurisdiction = %record.jurisdiction, "Sink writer closed, record not queued");
            return false;
        };
        self.stats.enqueued.fetch_add(1, Ordering::SeqCst);
        if tx.send(record).is_err() {
            self.stats.failed.fetch_add(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Records queued or retrying, not yet saved or given up on.
    pub fn pending_count(&self) -> u64 {
        self.stats.pending()
    }

    /// Records the sink has accepted so far.
    pub fn saved_count(&self) -> u64 {
        self.stats.saved.load(Ordering::SeqCst)
    }

    /// Stop accepting records. Already queued records are still written.
    pub fn close(&self) {
        drop(self.tx.lock().take());
    }

    /// Close the queue and wait for every queued record to be written or
    /// to exhaust its retries.
    pub async fn drain(&self) -> WriterReport {
        self.close();
        let task = self.task.lock().take();

        let unsaved = match task {
            Some(handle) => match handle.await {
                Ok(unsaved) => unsaved,
                Err(e) => {
                    error!(error = %e, "Sink writer task failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        WriterReport {
            saved: self.saved_count(),
            unsaved,
        }
    }
}

impl std::fmt::Debug for SinkWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkWriter")
            .field("stats", &self.stats)
            .finish()
    }
}

async fn write_loop(
    sink: Arc<dyn MileageSink>,
    user_id: String,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<MileageRecord>,
    stats: Arc<WriterStats>,
) -> Vec<MileageRecord> {
    let mut unsaved = Vec::new();

    while let Some(record) = rx.recv().await {
        if write_with_retry(sink.as_ref(), &record, &user_id, &policy).await {
            stats.saved.fetch_add(1, Ordering::SeqCst);
        } else {
            stats.failed.fetch_add(1, Ordering::SeqCst);
            unsaved.push(record);
        }
    }

    debug!(unsaved = unsaved.len(), "Sink writer finished");
    unsaved
}

async fn write_with_retry(
    sink: &dyn MileageSink,
    record: &MileageRecord,
    user_id: &str,
    policy: &RetryPolicy,
) -> bool {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match sink.append(record, user_id).await {
            Ok(()) => {
                debug!(
                    jurisdiction = %record.jurisdiction,
                    miles = record.miles,
                    attempt,
                    "Mileage record saved"
                );
                return true;
            }
            Err(e) => match policy.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(
                        jurisdiction = %record.jurisdiction,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Sink write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(
                        jurisdiction = %record.jurisdiction,
                        miles = record.miles,
                        attempts = attempt,
                        error = %e,
                        "Sink write failed, giving up"
                    );
                    return false;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::sink::MemorySink;
    use chrono::Utc;
    use std::time::Duration;

    fn record(code: &str, miles: f64) -> MileageRecord {
        MileageRecord {
            jurisdiction: code.into(),
            miles,
            occurred_at: Utc::now(),
            endpoint: Coordinate::new(39.0, -104.0).unwrap(),
        }
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::exponential_with(attempts, Duration::from_millis(1), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_writes_in_order() {
        let sink = Arc::new(MemorySink::new());
        let writer = SinkWriter::spawn(sink.clone(), "driver", fast_policy(3));

        assert!(writer.enqueue(record("CO", 5.0)));
        assert!(writer.enqueue(record("KS", 1.0)));
        let report = writer.drain().await;

        assert_eq!(report.saved, 2);
        assert!(report.unsaved.is_empty());
        assert_eq!(writer.pending_count(), 0);
        let stored = sink.records_for("driver");
        assert_eq!(stored[0].jurisdiction.as_str(), "CO");
        assert_eq!(stored[1].jurisdiction.as_str(), "KS");
    }

    #[tokio::test]
    async fn test_retries_transient_failure() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(2);
        let writer = SinkWriter::spawn(sink.clone(), "driver", fast_policy(3));

        writer.enqueue(record("CO", 5.0));
        let report = writer.drain().await;

        assert_eq!(report.saved, 1, "third attempt should succeed");
        assert_eq!(sink.attempts(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_reported_unsaved() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(10);
        let writer = SinkWriter::spawn(sink.clone(), "driver", fast_policy(2));

        writer.enqueue(record("CO", 5.0));
        writer.enqueue(record("KS", 2.0));
        let report = writer.drain().await;

        assert_eq!(report.saved, 0);
        assert_eq!(report.unsaved.len(), 2);
        assert_eq!(report.unsaved[0].jurisdiction.as_str(), "CO");
        assert_eq!(sink.attempts(), 4);
    }

    #[tokio::test]
    async fn test_pending_count_while_retrying() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(1);
        let policy = RetryPolicy::exponential_with(
            2,
            Duration::from_millis(300),
            Duration::from_millis(300),
        );
        let writer = SinkWriter::spawn(sink.clone(), "driver", policy);

        writer.enqueue(record("CO", 5.0));
        for _ in 0..100 {
            if sink.attempts() >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // First attempt failed; the record sits in backoff
        assert_eq!(sink.attempts(), 1);
        assert_eq!(writer.pending_count(), 1);
        assert_eq!(writer.saved_count(), 0);

        let report = writer.drain().await;
        assert_eq!(report.saved, 1);
        assert_eq!(writer.pending_count(), 0);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_after_drain_rejected() {
        let sink = Arc::new(MemorySink::new());
        let writer = SinkWriter::spawn(sink, "driver", RetryPolicy::None);
        writer.drain().await;
        assert!(!writer.enqueue(record("CO", 1.0)));
    }
}

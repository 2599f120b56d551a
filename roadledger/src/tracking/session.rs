//! Tracking session - owns the lifecycle of one drive.
//!
//! ```text
//! PositionSource ──► worker task ──► MileageAccumulator ──► SinkWriter ──► MileageSink
//!                        │                (mutex)              (retries)
//!                        └── drops paused, stale and inaccurate fixes
//! ```
//!
//! `start` checks permission, subscribes and waits for the first usable fix.
//! From then on a single worker task applies fixes in arrival order, so the
//! accumulator only ever sees one writer. `stop` cancels the worker, flushes
//! the remainder, drains the write queue and returns a [`SessionSummary`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::accumulator::{AccumulatorConfig, MileageAccumulator};
use super::permission::PermissionGate;
use super::record::MileageRecord;
use super::retry::RetryPolicy;
use super::writer::SinkWriter;
use crate::coord::{CoordError, Coordinate};
use crate::jurisdiction::{JurisdictionCode, JurisdictionResolver};
use crate::position::{PositionFix, PositionSource, PositionSubscription};
use crate::sink::MileageSink;

/// Default time to wait for the first fix after subscribing.
pub const DEFAULT_FIRST_FIX_TIMEOUT_SECS: u64 = 10;

/// Errors from the tracking lifecycle.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Location permission has not been granted.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The position source could not deliver a fix.
    #[error("Position source unavailable: {0}")]
    SourceUnavailable(String),

    /// A session is already running.
    #[error("Tracking is already active")]
    AlreadyActive,

    /// No session is running.
    #[error("Tracking is not active")]
    NotActive,

    /// A position fix carried an invalid coordinate.
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordError),
}

/// Configuration for a tracking session.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Accumulator flush settings.
    pub accumulator: AccumulatorConfig,
    /// How long `start` waits for the first fix.
    pub first_fix_timeout: Duration,
    /// Drop fixes whose accuracy radius exceeds this. `None` accepts all.
    pub max_accuracy_meters: Option<f64>,
    /// Retry policy for sink writes.
    pub retry: RetryPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            accumulator: AccumulatorConfig::default(),
            first_fix_timeout: Duration::from_secs(DEFAULT_FIRST_FIX_TIMEOUT_SECS),
            max_accuracy_meters: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Live view of a tracking session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingStatus {
    /// A session has started and not yet stopped.
    pub active: bool,
    /// Fixes are being ignored until `resume()`.
    pub paused: bool,
    /// Wall-clock time `start()` completed.
    pub started_at: Option<DateTime<Utc>>,
    /// Jurisdiction of the last applied fix, `None` outside coverage.
    pub current_jurisdiction: Option<JurisdictionCode>,
    /// Last applied coordinate.
    pub last_position: Option<Coordinate>,
    /// Miles in the current jurisdiction not yet flushed as a record.
    pub accumulated_miles: f64,
    /// Every mile driven this session, attributed or not.
    pub total_miles: f64,
    /// Miles driven while no jurisdiction matched.
    pub unattributed_miles: f64,
    /// Sorted by code.
    pub jurisdictions_visited: Vec<JurisdictionCode>,
    /// Records flushed by the accumulator so far.
    pub records_emitted: u64,
    /// Records queued or retrying in the sink writer.
    pub pending_writes: u64,
    /// Fixes rejected as out of order, inaccurate or invalid.
    pub dropped_fixes: u64,
}

/// Result of stopping a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Wall-clock time `start()` completed.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time `stop()` finished draining.
    pub ended_at: DateTime<Utc>,
    /// Whole seconds between `started_at` and `ended_at`.
    pub duration_seconds: i64,
    /// Every mile driven this session, attributed or not.
    pub total_miles: f64,
    /// Miles driven while no jurisdiction matched. Never emitted.
    pub unattributed_miles: f64,
    /// Sorted by code.
    pub jurisdictions_visited: Vec<JurisdictionCode>,
    /// Records flushed, including the final remainder.
    pub records_emitted: u64,
    /// Records the sink accepted.
    pub records_saved: u64,
    /// Records the sink never accepted. The caller should keep these.
    pub pending: Vec<MileageRecord>,
    /// Fixes rejected as out of order, inaccurate or invalid.
    pub dropped_fixes: u64,
}

/// State shared between the session handle and its worker task.
struct SessionShared {
    accumulator: Mutex<MileageAccumulator>,
    writer: SinkWriter,
    paused: AtomicBool,
    dropped_fixes: AtomicU64,
    max_accuracy_meters: Option<f64>,
    source_ended: CancellationToken,
}

impl SessionShared {
    /// Apply one fix. `watermark` is the timestamp of the last applied fix.
    fn process(&self, fix: PositionFix, watermark: &mut DateTime<Utc>) {
        if fix.timestamp < *watermark {
            warn!(
                fix_at = %fix.timestamp,
                last_at = %watermark,
                "Dropping out-of-order position fix"
            );
            self.dropped_fixes.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if !accuracy_ok(&fix, self.max_accuracy_meters) {
            debug!(accuracy = ?fix.accuracy_meters, "Dropping inaccurate position fix");
            self.dropped_fixes.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let records = {
            let mut accumulator = self.accumulator.lock();
            // Checked under the lock so a concurrent pause cannot interleave
            if self.paused.load(Ordering::SeqCst) {
                trace!("Paused, ignoring position fix");
                return;
            }
            match accumulator.apply_position(fix.coordinate, fix.timestamp) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "Dropping invalid position fix");
                    self.dropped_fixes.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }
        };

        *watermark = fix.timestamp;
        for record in records {
            self.writer.enqueue(record);
        }
    }
}

struct ActiveSession {
    shared: Arc<SessionShared>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// Orchestrates position tracking for one user.
pub struct TrackingSession {
    resolver: Arc<dyn JurisdictionResolver>,
    permission: Arc<dyn PermissionGate>,
    sink: Arc<dyn MileageSink>,
    user_id: String,
    config: TrackingConfig,
    active: Option<ActiveSession>,
}

impl TrackingSession {
    /// Create a session with default configuration.
    pub fn new(
        resolver: Arc<dyn JurisdictionResolver>,
        permission: Arc<dyn PermissionGate>,
        sink: Arc<dyn MileageSink>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::with_config(resolver, permission, sink, user_id, TrackingConfig::default())
    }

    /// Create a session with custom configuration.
    pub fn with_config(
        resolver: Arc<dyn JurisdictionResolver>,
        permission: Arc<dyn PermissionGate>,
        sink: Arc<dyn MileageSink>,
        user_id: impl Into<String>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            resolver,
            permission,
            sink,
            user_id: user_id.into(),
            config,
            active: None,
        }
    }

    /// Begin tracking from `source`.
    ///
    /// Returns once the first usable fix has been applied. Fails with
    /// `SourceUnavailable` if none arrives within the first-fix timeout.
    pub async fn start(&mut self, source: &mut dyn PositionSource) -> Result<(), TrackingError> {
        if self.active.is_some() {
            return Err(TrackingError::AlreadyActive);
        }
        if !self.permission.is_granted() {
            warn!(user_id = %self.user_id, "Location permission denied");
            return Err(TrackingError::PermissionDenied);
        }

        let mut subscription = source
            .subscribe()
            .map_err(|e| TrackingError::SourceUnavailable(e.to_string()))?;

        let timeout = self.config.first_fix_timeout;
        let max_accuracy = self.config.max_accuracy_meters;
        let first = match tokio::time::timeout(
            timeout,
            first_usable_fix(&mut subscription, max_accuracy),
        )
        .await
        {
            Ok(Some(fix)) => fix,
            Ok(None) => {
                return Err(TrackingError::SourceUnavailable(
                    "position stream ended before the first fix".to_string(),
                ));
            }
            Err(_) => {
                subscription.unsubscribe();
                warn!(timeout_secs = timeout.as_secs_f64(), "No position fix before timeout");
                return Err(TrackingError::SourceUnavailable(format!(
                    "no position fix within {:.1}s",
                    timeout.as_secs_f64()
                )));
            }
        };

        let mut accumulator =
            MileageAccumulator::new(Arc::clone(&self.resolver), self.config.accumulator.clone());
        accumulator.apply_position(first.coordinate, first.timestamp)?;
        let initial = accumulator.snapshot().current_jurisdiction;

        let shared = Arc::new(SessionShared {
            accumulator: Mutex::new(accumulator),
            writer: SinkWriter::spawn(
                Arc::clone(&self.sink),
                self.user_id.clone(),
                self.config.retry.clone(),
            ),
            paused: AtomicBool::new(false),
            dropped_fixes: AtomicU64::new(0),
            max_accuracy_meters: max_accuracy,
            source_ended: CancellationToken::new(),
        });

        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_worker(
            subscription,
            Arc::clone(&shared),
            cancel.clone(),
            first.timestamp,
        ));

        let started_at = Utc::now();
        info!(
            user_id = %self.user_id,
            at = %first.coordinate,
            jurisdiction = initial.as_ref().map(|c| c.as_str()).unwrap_or("-"),
            "Tracking started"
        );

        self.active = Some(ActiveSession {
            shared,
            cancel,
            worker,
            started_at,
        });
        Ok(())
    }

    /// Flush pending miles and ignore fixes until [`resume`](Self::resume).
    pub fn pause(&self) -> Result<(), TrackingError> {
        let active = self.active.as_ref().ok_or(TrackingError::NotActive)?;
        let shared = &active.shared;

        let record = {
            let mut accumulator = shared.accumulator.lock();
            if shared.paused.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            accumulator.suspend()
        };
        if let Some(record) = record {
            shared.writer.enqueue(record);
        }
        info!(user_id = %self.user_id, "Tracking paused");
        Ok(())
    }

    /// Accept fixes again. The next fix starts a fresh segment.
    pub fn resume(&self) -> Result<(), TrackingError> {
        let active = self.active.as_ref().ok_or(TrackingError::NotActive)?;
        if active.shared.paused.swap(false, Ordering::SeqCst) {
            info!(user_id = %self.user_id, "Tracking resumed");
        }
        Ok(())
    }

    /// Whether a session is running.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Snapshot of the live state. Returns the default status when idle.
    pub fn status(&self) -> TrackingStatus {
        let Some(active) = self.active.as_ref() else {
            return TrackingStatus::default();
        };
        let shared = &active.shared;
        let snapshot = shared.accumulator.lock().snapshot();

        TrackingStatus {
            active: true,
            paused: shared.paused.load(Ordering::SeqCst),
            started_at: Some(active.started_at),
            current_jurisdiction: snapshot.current_jurisdiction,
            last_position: snapshot.last_position,
            accumulated_miles: snapshot.accumulated_miles,
            total_miles: snapshot.total_miles,
            unattributed_miles: snapshot.unattributed_miles,
            jurisdictions_visited: snapshot.jurisdictions_visited.into_iter().collect(),
            records_emitted: snapshot.records_emitted,
            pending_writes: shared.writer.pending_count(),
            dropped_fixes: shared.dropped_fixes.load(Ordering::Relaxed),
        }
    }

    /// Resolves once the position source stops delivering fixes.
    ///
    /// Returns immediately when no session is running.
    pub async fn wait_for_source_end(&self) {
        if let Some(active) = self.active.as_ref() {
            active.shared.source_ended.cancelled().await;
        }
    }

    /// Stop tracking and return the session summary.
    pub async fn stop(&mut self) -> Result<SessionSummary, TrackingError> {
        let active = self.active.take().ok_or(TrackingError::NotActive)?;

        active.cancel.cancel();
        if let Err(e) = active.worker.await {
            error!(error = %e, "Tracking worker failed");
        }

        let (record, snapshot) = active.shared.accumulator.lock().finish();
        if let Some(record) = record {
            active.shared.writer.enqueue(record);
        }
        let report = active.shared.writer.drain().await;

        let ended_at = Utc::now();
        let summary = SessionSummary {
            started_at: active.started_at,
            ended_at,
            duration_seconds: (ended_at - active.started_at).num_seconds(),
            total_miles: snapshot.total_miles,
            unattributed_miles: snapshot.unattributed_miles,
            jurisdictions_visited: snapshot.jurisdictions_visited.into_iter().collect(),
            records_emitted: snapshot.records_emitted,
            records_saved: report.saved,
            pending: report.unsaved,
            dropped_fixes: active.shared.dropped_fixes.load(Ordering::Relaxed),
        };

        if summary.pending.is_empty() {
            info!(
                user_id = %self.user_id,
                total_miles = %format!("{:.2}", summary.total_miles),
                records = summary.records_saved,
                "Tracking stopped"
            );
        } else {
            warn!(
                user_id = %self.user_id,
                total_miles = %format!("{:.2}", summary.total_miles),
                records = summary.records_saved,
                unsaved = summary.pending.len(),
                "Tracking stopped with unsaved records"
            );
        }

        Ok(summary)
    }
}

impl Drop for TrackingSession {
    /// A session dropped without [`stop`](TrackingSession::stop) still ends its
    /// worker and hands the unflushed remainder to the writer, which finishes
    /// the queue in the background. Nothing is reported back.
    fn drop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.cancel.cancel();

        let (record, snapshot) = active.shared.accumulator.lock().finish();
        if let Some(record) = record {
            active.shared.writer.enqueue(record);
        }
        active.shared.writer.close();
        warn!(
            user_id = %self.user_id,
            total_miles = %format!("{:.2}", snapshot.total_miles),
            pending = active.shared.writer.pending_count(),
            "Tracking session dropped without stop"
        );
    }
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("user_id", &self.user_id)
            .field("config", &self.config)
            .field("active", &self.active.is_some())
            .finish()
    }
}

fn accuracy_ok(fix: &PositionFix, max_accuracy: Option<f64>) -> bool {
    match (fix.accuracy_meters, max_accuracy) {
        (Some(accuracy), Some(max)) => accuracy <= max,
        _ => true,
    }
}

async fn first_usable_fix(
    subscription: &mut PositionSubscription,
    max_accuracy: Option<f64>,
) -> Option<PositionFix> {
    while let Some(fix) = subscription.recv().await {
        if let Err(e) = fix.coordinate.validate() {
            warn!(error = %e, "Ignoring invalid first fix");
            continue;
        }
        if !accuracy_ok(&fix, max_accuracy) {
            debug!(accuracy = ?fix.accuracy_meters, "Ignoring inaccurate first fix");
            continue;
        }
        return Some(fix);
    }
    None
}

async fn run_worker(
    mut subscription: PositionSubscription,
    shared: Arc<SessionShared>,
    cancel: CancellationToken,
    mut watermark: DateTime<Utc>,
) {
    loop {
        let fix = tokio::select! {
            _ = cancel.cancelled() => break,
            fix = subscription.recv() => fix,
        };
        match fix {
            Some(fix) => shared.process(fix, &mut watermark),
            None => {
                info!("Position source ended");
                shared.source_ended.cancel();
                break;
            }
        }
    }
    subscription.unsubscribe();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::BoundingBoxResolver;
    use crate::position::{ChannelPositionSource, PositionPublisher, ReplayPositionSource};
    use crate::sink::MemorySink;
    use crate::tracking::StaticPermission;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 14, minute, 0).unwrap()
    }

    fn fix(lat: f64, lng: f64, minute: u32) -> PositionFix {
        PositionFix::new(Coordinate::new(lat, lng).unwrap(), at(minute))
    }

    fn session(sink: Arc<MemorySink>, config: TrackingConfig) -> TrackingSession {
        TrackingSession::with_config(
            Arc::new(BoundingBoxResolver::us_contiguous()),
            Arc::new(StaticPermission::granted()),
            sink,
            "driver-1",
            config,
        )
    }

    fn fast_config() -> TrackingConfig {
        TrackingConfig {
            first_fix_timeout: Duration::from_millis(200),
            retry: RetryPolicy::exponential_with(
                2,
                Duration::from_millis(1),
                Duration::from_millis(5),
            ),
            ..TrackingConfig::default()
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    /// Start `session` on a channel source, delivering `first` once subscribed.
    async fn start_on_channel(session: &mut TrackingSession, first: PositionFix) -> PositionPublisher {
        let (mut source, publisher) = ChannelPositionSource::new();
        let feeder = publisher.clone();
        tokio::spawn(async move {
            while !feeder.is_subscribed() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            feeder.publish(first);
        });
        session.start(&mut source).await.unwrap();
        publisher
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let mut session = TrackingSession::new(
            Arc::new(BoundingBoxResolver::us_contiguous()),
            Arc::new(StaticPermission::denied()),
            Arc::new(MemorySink::new()),
            "driver-1",
        );
        let mut source = ReplayPositionSource::new(vec![fix(39.74, -104.99, 0)]);
        let result = session.start(&mut source).await;
        assert!(matches!(result, Err(TrackingError::PermissionDenied)));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_drop_without_stop_ends_worker() {
        let sink = Arc::new(MemorySink::new());
        let mut session = session(sink.clone(), fast_config());
        let publisher = start_on_channel(&mut session, fix(39.74, -104.99, 0)).await;

        assert!(publisher.publish(fix(39.76, -104.97, 1)));
        wait_until(|| session.status().total_miles > 0.0).await;
        assert!(sink.is_empty(), "below threshold, nothing flushed yet");

        drop(session);

        wait_until(|| !publisher.is_subscribed()).await;
        wait_until(|| sink.len() == 1).await;
        let records = sink.records_for("driver-1");
        assert_eq!(records[0].jurisdiction.as_str(), "CO");
        assert!(records[0].miles > 0.0);
    }

    #[tokio::test]
    async fn test_first_fix_timeout() {
        let mut session = session(Arc::new(MemorySink::new()), fast_config());
        let (mut source, _publisher) = ChannelPositionSource::new();

        let result = session.start(&mut source).await;
        assert!(matches!(result, Err(TrackingError::SourceUnavailable(_))));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_empty_source_unavailable() {
        let mut session = session(Arc::new(MemorySink::new()), fast_config());
        let mut source = ReplayPositionSource::new(Vec::new());
        let result = session.start(&mut source).await;
        assert!(matches!(result, Err(TrackingError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_idle() {
        let mut session = session(Arc::new(MemorySink::new()), fast_config());
        assert!(matches!(session.stop().await, Err(TrackingError::NotActive)));
        assert!(matches!(session.pause(), Err(TrackingError::NotActive)));

        let mut source = ReplayPositionSource::new(vec![fix(39.74, -104.99, 0)]);
        session.start(&mut source).await.unwrap();

        let mut other = ReplayPositionSource::new(vec![fix(39.74, -104.99, 0)]);
        assert!(matches!(
            session.start(&mut other).await,
            Err(TrackingError::AlreadyActive)
        ));
        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_denver_to_kansas_city() {
        let sink = Arc::new(MemorySink::new());
        let mut session = session(sink.clone(), fast_config());
        let mut source = ReplayPositionSource::new(vec![
            fix(39.7392, -104.9903, 0),
            fix(39.0997, -94.5786, 30),
        ]);

        session.start(&mut source).await.unwrap();
        session.wait_for_source_end().await;
        let summary = session.stop().await.unwrap();

        let codes: Vec<&str> = summary
            .jurisdictions_visited
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(codes, vec!["CO", "MO"]);
        assert_eq!(summary.records_emitted, 1);
        assert_eq!(summary.records_saved, 1);
        assert!(summary.pending.is_empty());

        let records = sink.records_for("driver-1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].jurisdiction.as_str(), "CO");
        assert!((records[0].miles - summary.total_miles).abs() < 1e-9);
        assert!((summary.total_miles - 560.0).abs() < 10.0);
    }

    #[tokio::test]
    async fn test_out_of_order_fix_dropped() {
        let sink = Arc::new(MemorySink::new());
        let mut session = session(sink.clone(), fast_config());
        let mut source = ReplayPositionSource::new(vec![
            fix(39.00, -105.0, 10),
            fix(39.01, -105.0, 12),
            fix(39.74, -104.99, 11),
        ]);

        session.start(&mut source).await.unwrap();
        session.wait_for_source_end().await;
        let summary = session.stop().await.unwrap();

        assert_eq!(summary.dropped_fixes, 1);
        assert!(summary.total_miles < 1.0, "stale fix must not add distance");
    }

    #[tokio::test]
    async fn test_inaccurate_fix_dropped() {
        let config = TrackingConfig {
            max_accuracy_meters: Some(50.0),
            ..fast_config()
        };
        let mut session = session(Arc::new(MemorySink::new()), config);
        let mut source = ReplayPositionSource::new(vec![
            fix(39.00, -105.0, 0).with_accuracy(500.0),
            fix(39.00, -105.0, 1).with_accuracy(10.0),
            fix(39.50, -105.0, 2).with_accuracy(900.0),
        ]);

        session.start(&mut source).await.unwrap();
        session.wait_for_source_end().await;
        let summary = session.stop().await.unwrap();

        assert_eq!(summary.dropped_fixes, 1);
        assert_eq!(summary.total_miles, 0.0);
    }

    #[tokio::test]
    async fn test_pause_flushes_and_ignores_fixes() {
        let sink = Arc::new(MemorySink::new());
        let mut session = session(sink.clone(), fast_config());
        let publisher = start_on_channel(&mut session, fix(39.00, -105.0, 0)).await;

        publisher.publish(fix(39.05, -105.0, 1));
        wait_until(|| session.status().total_miles > 0.0).await;

        session.pause().unwrap();
        let status = session.status();
        assert!(status.paused);
        assert_eq!(status.accumulated_miles, 0.0);
        assert_eq!(status.records_emitted, 1, "pause should flush the remainder");

        // Far away while paused: must not count
        publisher.publish(fix(40.50, -105.0, 2));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let paused_total = session.status().total_miles;

        session.resume().unwrap();
        publisher.publish(fix(40.50, -105.0, 3));
        publisher.publish(fix(40.55, -105.0, 4));
        wait_until(|| session.status().total_miles > paused_total).await;

        let summary = session.stop().await.unwrap();
        let one_hop = 0.05 * 69.097;
        assert!((summary.total_miles - 2.0 * one_hop).abs() < 0.05);
        assert_eq!(summary.records_saved, 2);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_unsaved_records_reported() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(100);
        let mut session = session(sink.clone(), fast_config());
        let mut source = ReplayPositionSource::new(vec![
            fix(39.00, -105.0, 0),
            fix(39.02, -105.0, 1),
        ]);

        session.start(&mut source).await.unwrap();
        session.wait_for_source_end().await;
        let summary = session.stop().await.unwrap();

        assert_eq!(summary.records_saved, 0);
        assert_eq!(summary.pending.len(), 1);
        assert_eq!(summary.pending[0].jurisdiction.as_str(), "CO");
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_status_idle_default() {
        let session = session(Arc::new(MemorySink::new()), fast_config());
        assert_eq!(session.status(), TrackingStatus::default());
        // Nothing to wait for
        session.wait_for_source_end().await;
    }
}

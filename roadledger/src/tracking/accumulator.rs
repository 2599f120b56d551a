//! Mileage accumulator - turns position fixes into jurisdiction mileage.
//!
//! # State Machine
//!
//! ```text
//! Idle ──[first fix]──► Tracking ──[fix]──► Tracking
//!   ▲                      │
//!   └──────[suspend]───────┘
//! ```
//!
//! Each fix in `Tracking` adds the great-circle delta from the previous fix to
//! the running total. The delta is billed to the jurisdiction the segment
//! *started* in. A record is emitted when:
//!
//! - the resolved jurisdiction changes and the previous one was known
//!   (immediate flush, regardless of the threshold),
//! - the accumulated miles for the current jurisdiction reach the flush
//!   threshold, or
//! - the session is paused or stopped with a non-zero remainder.
//!
//! Miles covered while no jurisdiction is known count toward the total but
//! are never billed; they are tracked separately as `unattributed_miles`.
//!
//! # Conservation
//!
//! At any point `emitted + pending + unattributed == total` (up to float
//! rounding), so no mile is dropped or billed twice.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::record::{FlushReason, MileageRecord};
use crate::coord::{CoordError, Coordinate, DistanceEstimator, Haversine};
use crate::jurisdiction::{JurisdictionCode, JurisdictionResolver};

/// Default miles accumulated in one jurisdiction before a record is flushed.
pub const DEFAULT_FLUSH_THRESHOLD_MILES: f64 = 5.0;

/// Configuration for the mileage accumulator.
#[derive(Debug, Clone)]
pub struct AccumulatorConfig {
    /// Flush a record once this many miles accumulate without a crossing.
    pub flush_threshold_miles: f64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            flush_threshold_miles: DEFAULT_FLUSH_THRESHOLD_MILES,
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    /// No prior fix.
    Idle,
    /// At least one fix applied since start or resume.
    Tracking {
        last_position: Coordinate,
        last_fix_at: DateTime<Utc>,
        current: Option<JurisdictionCode>,
    },
}

/// Point-in-time view of accumulator state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatorSnapshot {
    /// Jurisdiction miles are currently billed to.
    pub current_jurisdiction: Option<JurisdictionCode>,
    /// Most recent applied position.
    pub last_position: Option<Coordinate>,
    /// Miles accumulated in the current jurisdiction and not yet emitted.
    pub accumulated_miles: f64,
    /// All miles covered, billed or not.
    pub total_miles: f64,
    /// Miles already emitted as records.
    pub emitted_miles: f64,
    /// Miles covered while no jurisdiction was known.
    pub unattributed_miles: f64,
    /// Number of records emitted.
    pub records_emitted: u64,
    /// Every jurisdiction resolved during the session.
    pub jurisdictions_visited: BTreeSet<JurisdictionCode>,
}

/// Per-session mileage accumulator.
///
/// Not thread-safe by itself; the tracking session serializes access.
pub struct MileageAccumulator {
    resolver: Arc<dyn JurisdictionResolver>,
    estimator: Arc<dyn DistanceEstimator>,
    config: AccumulatorConfig,
    phase: Phase,
    accumulated_miles: f64,
    total_miles: f64,
    emitted_miles: f64,
    unattributed_miles: f64,
    records_emitted: u64,
    visited: BTreeSet<JurisdictionCode>,
}

impl MileageAccumulator {
    /// Create an accumulator using haversine distance.
    pub fn new(resolver: Arc<dyn JurisdictionResolver>, config: AccumulatorConfig) -> Self {
        Self::with_estimator(resolver, Arc::new(Haversine), config)
    }

    /// Create an accumulator with a custom distance estimator.
    pub fn with_estimator(
        resolver: Arc<dyn JurisdictionResolver>,
        estimator: Arc<dyn DistanceEstimator>,
        config: AccumulatorConfig,
    ) -> Self {
        Self {
            resolver,
            estimator,
            config,
            phase: Phase::Idle,
            accumulated_miles: 0.0,
            total_miles: 0.0,
            emitted_miles: 0.0,
            unattributed_miles: 0.0,
            records_emitted: 0,
            visited: BTreeSet::new(),
        }
    }

    /// Apply one position fix.
    ///
    /// Returns the records flushed by this fix (zero or one). A malformed
    /// coordinate is rejected before any state is touched.
    pub fn apply_position(
        &mut self,
        coord: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<MileageRecord>, CoordError> {
        coord.validate()?;

        let (last_position, current) = match &self.phase {
            Phase::Idle => {
                self.begin(coord, at);
                return Ok(Vec::new());
            }
            Phase::Tracking {
                last_position,
                current,
                ..
            } => (*last_position, current.clone()),
        };

        let delta = self.estimator.distance(&last_position, &coord);
        self.total_miles += delta;
        if current.is_some() {
            self.accumulated_miles += delta;
        } else {
            self.unattributed_miles += delta;
        }

        let next = self.resolver.resolve(&coord);
        let mut emitted = Vec::new();

        if next != current {
            if let Some(previous) = current.as_ref() {
                emitted.extend(self.take_record(
                    previous,
                    coord,
                    at,
                    FlushReason::JurisdictionChange,
                ));
            }
            // Anything pending under an unknown jurisdiction is never billed
            self.accumulated_miles = 0.0;
            if let Some(entered) = next.as_ref() {
                self.visited.insert(entered.clone());
            }
            info!(
                from = current.as_ref().map(|c| c.as_str()).unwrap_or("-"),
                to = next.as_ref().map(|c| c.as_str()).unwrap_or("-"),
                at = %coord,
                "Jurisdiction crossing"
            );
        } else if let Some(jurisdiction) = current.as_ref() {
            if self.accumulated_miles >= self.config.flush_threshold_miles {
                emitted.extend(self.take_record(jurisdiction, coord, at, FlushReason::Threshold));
            }
        }

        self.phase = Phase::Tracking {
            last_position: coord,
            last_fix_at: at,
            current: next,
        };

        Ok(emitted)
    }

    /// Flush the remainder and return to `Idle`, keeping session totals.
    ///
    /// Used when tracking pauses: the next fix starts a fresh segment, so the
    /// distance covered while paused is never counted.
    pub fn suspend(&mut self) -> Option<MileageRecord> {
        let record = self.flush_remainder();
        self.phase = Phase::Idle;
        self.accumulated_miles = 0.0;
        record
    }

    /// Flush the remainder and clear all state.
    ///
    /// Returns the final record (if any) together with the snapshot taken
    /// just before the reset.
    pub fn finish(&mut self) -> (Option<MileageRecord>, AccumulatorSnapshot) {
        let record = self.flush_remainder();
        let snapshot = self.snapshot();
        self.reset();
        (record, snapshot)
    }

    /// Current state, without mutation.
    pub fn snapshot(&self) -> AccumulatorSnapshot {
        let (current_jurisdiction, last_position) = match &self.phase {
            Phase::Idle => (None, None),
            Phase::Tracking {
                last_position,
                current,
                ..
            } => (current.clone(), Some(*last_position)),
        };
        AccumulatorSnapshot {
            current_jurisdiction,
            last_position,
            accumulated_miles: self.accumulated_miles,
            total_miles: self.total_miles,
            emitted_miles: self.emitted_miles,
            unattributed_miles: self.unattributed_miles,
            records_emitted: self.records_emitted,
            jurisdictions_visited: self.visited.clone(),
        }
    }

    /// Whether at least one fix has been applied since start or resume.
    pub fn is_tracking(&self) -> bool {
        matches!(self.phase, Phase::Tracking { .. })
    }

    /// Miles accumulated in the current jurisdiction, not yet emitted.
    pub fn pending_miles(&self) -> f64 {
        self.accumulated_miles
    }

    /// All miles covered so far.
    pub fn total_miles(&self) -> f64 {
        self.total_miles
    }

    /// The configuration in use.
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    fn begin(&mut self, coord: Coordinate, at: DateTime<Utc>) {
        let current = self.resolver.resolve(&coord);
        if let Some(code) = current.as_ref() {
            self.visited.insert(code.clone());
        }
        debug!(
            jurisdiction = current.as_ref().map(|c| c.as_str()).unwrap_or("-"),
            at = %coord,
            "Accumulator started"
        );
        self.accumulated_miles = 0.0;
        self.phase = Phase::Tracking {
            last_position: coord,
            last_fix_at: at,
            current,
        };
    }

    fn flush_remainder(&mut self) -> Option<MileageRecord> {
        match self.phase.clone() {
            Phase::Tracking {
                last_position,
                last_fix_at,
                current: Some(jurisdiction),
            } => self.take_record(
                &jurisdiction,
                last_position,
                last_fix_at,
                FlushReason::SessionEnd,
            ),
            _ => None,
        }
    }

    fn take_record(
        &mut self,
        jurisdiction: &JurisdictionCode,
        endpoint: Coordinate,
        at: DateTime<Utc>,
        reason: FlushReason,
    ) -> Option<MileageRecord> {
        let miles = std::mem::take(&mut self.accumulated_miles);
        if miles <= 0.0 {
            return None;
        }

        self.emitted_miles += miles;
        self.records_emitted += 1;
        debug!(
            jurisdiction = jurisdiction.as_str(),
            miles = %format!("{:.3}", miles),
            reason = %reason,
            "Mileage record flushed"
        );

        Some(MileageRecord {
            jurisdiction: jurisdiction.clone(),
            miles,
            occurred_at: at,
            endpoint,
        })
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.accumulated_miles = 0.0;
        self.total_miles = 0.0;
        self.emitted_miles = 0.0;
        self.unattributed_miles = 0.0;
        self.records_emitted = 0;
        self.visited.clear();
    }
}

impl std::fmt::Debug for MileageAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MileageAccumulator")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("accumulated_miles", &self.accumulated_miles)
            .field("total_miles", &self.total_miles)
            .finish()
    }
}

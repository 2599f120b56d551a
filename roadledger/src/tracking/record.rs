//! Mileage records emitted by the accumulator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::jurisdiction::JurisdictionCode;

/// Miles driven in one jurisdiction, emitted on a flush.
///
/// Immutable once emitted; `miles` is always greater than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageRecord {
    /// Jurisdiction the miles are billed to.
    pub jurisdiction: JurisdictionCode,
    /// Statute miles covered since the previous flush.
    pub miles: f64,
    /// Timestamp of the position fix that triggered the flush.
    pub occurred_at: DateTime<Utc>,
    /// Position at the moment of the flush.
    pub endpoint: Coordinate,
}

impl MileageRecord {
    /// UTC calendar date of the record, used for quarter filtering.
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}

/// Why the accumulator emitted a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The vehicle crossed into another jurisdiction (or out of coverage).
    JurisdictionChange,
    /// Accumulated miles reached the flush threshold.
    Threshold,
    /// The session was paused or stopped.
    SessionEnd,
}

impl std::fmt::Display for FlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushReason::JurisdictionChange => write!(f, "jurisdiction_change"),
            FlushReason::Threshold => write!(f, "threshold"),
            FlushReason::SessionEnd => write!(f, "session_end"),
        }
    }
}

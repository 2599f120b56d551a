//! Mileage tracking
//!
//! Turns a stream of position fixes into per-jurisdiction mileage records:
//!
//! - [`MileageAccumulator`] - the pure state machine (fix in, records out)
//! - [`TrackingSession`] - lifecycle orchestration over a
//!   [`PositionSource`](crate::position::PositionSource)
//! - [`SinkWriter`] - retrying background writer in front of a
//!   [`MileageSink`](crate::sink::MileageSink)
//!
//! # Example
//!
//! ```ignore
//! let mut session = TrackingSession::new(
//!     Arc::new(BoundingBoxResolver::us_contiguous()),
//!     Arc::new(StaticPermission::granted()),
//!     Arc::new(JsonlFileSink::new("mileage.jsonl")),
//!     "driver-1",
//! );
//!
//! session.start(&mut source).await?;
//! // ... drive ...
//! let summary = session.stop().await?;
//! println!("{:.1} miles", summary.total_miles);
//! ```

mod accumulator;
mod permission;
mod record;
mod retry;
mod session;
mod writer;

pub use accumulator::{
    AccumulatorConfig, AccumulatorSnapshot, MileageAccumulator, DEFAULT_FLUSH_THRESHOLD_MILES,
};
pub use permission::{PermissionGate, StaticPermission};
pub use record::{FlushReason, MileageRecord};
pub use retry::{
    RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_SECS,
};
pub use session::{
    SessionSummary, TrackingConfig, TrackingError, TrackingSession, TrackingStatus,
    DEFAULT_FIRST_FIX_TIMEOUT_SECS,
};
pub use writer::{SinkWriter, WriterReport};

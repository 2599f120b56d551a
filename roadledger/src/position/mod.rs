//! Position sources
//!
//! A [`PositionSource`] hands out a [`PositionSubscription`]: a push-based
//! stream of [`PositionFix`] values that the tracking session drains. The
//! session never cares where fixes come from; each platform is an adapter:
//!
//! - [`ChannelPositionSource`] - the host application pushes fixes from its own
//!   location callback (mobile OS or browser geolocation bridge)
//! - [`UdpPositionSource`] - NMEA `RMC`/`GGA` or ForeFlight `XGPS` sentences
//!   broadcast over UDP by a GPS device or phone app
//! - [`ReplayPositionSource`] - a recorded JSON-lines trace, for testing and
//!   re-processing
//!
//! # Example
//!
//! ```ignore
//! let (mut source, publisher) = ChannelPositionSource::new();
//! let mut subscription = source.subscribe()?;
//!
//! publisher.publish(PositionFix::now(Coordinate::new(39.74, -104.99)?));
//! let fix = subscription.recv().await;
//!
//! subscription.unsubscribe();
//! ```

mod channel;
mod protocol;
mod replay;
mod udp;

pub use channel::{ChannelPositionSource, PositionPublisher, DEFAULT_CHANNEL_CAPACITY};
pub use protocol::parse_datagram;
pub use replay::ReplayPositionSource;
pub use udp::{UdpPositionSource, DEFAULT_UDP_PORT};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::coord::Coordinate;

/// A single position sample from a location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Reported position.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// When the position was measured.
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy radius in meters, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
}

impl PositionFix {
    /// Create a fix.
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            timestamp,
            accuracy_meters: None,
        }
    }

    /// Create a fix stamped with the current time.
    pub fn now(coordinate: Coordinate) -> Self {
        Self::new(coordinate, Utc::now())
    }

    /// Attach an accuracy radius.
    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy_meters = Some(meters);
        self
    }
}

/// Errors raised by position sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Failed to bind the UDP socket.
    #[error("Failed to bind UDP socket on port {port}: {source}")]
    SocketBind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a replay trace.
    #[error("Failed to read trace '{}': {source}", .path.display())]
    TraceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A replay trace line is not a valid fix.
    #[error("Invalid fix on line {line}: {reason}")]
    TraceParse { line: usize, reason: String },

    /// The source only supports one subscription at a time.
    #[error("Position source is already subscribed")]
    AlreadySubscribed,
}

/// Something that can stream position fixes.
pub trait PositionSource: Send {
    /// Start streaming fixes.
    ///
    /// Must be called from within a Tokio runtime; adapters may spawn a
    /// background task that feeds the subscription.
    fn subscribe(&mut self) -> Result<PositionSubscription, SourceError>;
}

/// A live stream of fixes. Dropping it unsubscribes.
#[derive(Debug)]
pub struct PositionSubscription {
    rx: mpsc::Receiver<PositionFix>,
    cancel: CancellationToken,
}

impl PositionSubscription {
    /// Wrap a receiver and the token that stops its producer.
    pub fn new(rx: mpsc::Receiver<PositionFix>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next fix, or `None` once unsubscribed or the source has ended.
    pub async fn recv(&mut self) -> Option<PositionFix> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            fix = self.rx.recv() => fix,
        }
    }

    /// Stop the producer and close the stream.
    pub fn unsubscribe(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has been called.
    pub fn is_unsubscribed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for PositionSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

//! Push adapter: the host application feeds fixes directly.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{PositionFix, PositionSource, PositionSubscription, SourceError};

/// Default buffered fixes between the host callback and the session.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

type SenderSlot = Arc<Mutex<Option<mpsc::Sender<PositionFix>>>>;

/// Position source fed by a [`PositionPublisher`].
///
/// Bridges a platform location callback (native OS services, browser
/// geolocation) into a subscription. Each `subscribe` replaces the previous
/// stream.
#[derive(Debug)]
pub struct ChannelPositionSource {
    slot: SenderSlot,
    capacity: usize,
}

impl ChannelPositionSource {
    /// Create a source and its publisher with the default capacity.
    pub fn new() -> (Self, PositionPublisher) {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a source and its publisher with a custom buffer size.
    pub fn with_capacity(capacity: usize) -> (Self, PositionPublisher) {
        let slot: SenderSlot = Arc::new(Mutex::new(None));
        let publisher = PositionPublisher {
            slot: Arc::clone(&slot),
        };
        (
            Self {
                slot,
                capacity: capacity.max(1),
            },
            publisher,
        )
    }
}

impl PositionSource for ChannelPositionSource {
    fn subscribe(&mut self) -> Result<PositionSubscription, SourceError> {
        let (tx, rx) = mpsc::channel(self.capacity);
        *self.slot.lock() = Some(tx);
        Ok(PositionSubscription::new(rx, CancellationToken::new()))
    }
}

/// Handle the host application uses to push fixes.
#[derive(Debug, Clone)]
pub struct PositionPublisher {
    slot: SenderSlot,
}

impl PositionPublisher {
    /// Push a fix without blocking.
    ///
    /// Returns `false` when nobody is subscribed or the buffer is full.
    pub fn publish(&self, fix: PositionFix) -> bool {
        let mut slot = self.slot.lock();
        let Some(tx) = slot.as_ref() else {
            return false;
        };
        match tx.try_send(fix) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Position buffer full, dropping fix");
                false
            }
            Err(TrySendError::Closed(_)) => {
                *slot = None;
                false
            }
        }
    }

    /// Whether a subscription is currently receiving.
    pub fn is_subscribed(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    /// End the stream, as if the platform stopped delivering fixes.
    pub fn close(&self) {
        self.slot.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;

    fn fix(lat: f64, lng: f64) -> PositionFix {
        PositionFix::now(Coordinate::new(lat, lng).unwrap())
    }

    #[test]
    fn test_publish_without_subscriber() {
        let (_source, publisher) = ChannelPositionSource::new();
        assert!(!publisher.is_subscribed());
        assert!(!publisher.publish(fix(39.0, -104.0)));
    }

    #[tokio::test]
    async fn test_publish_and_receive_in_order() {
        let (mut source, publisher) = ChannelPositionSource::new();
        let mut sub = source.subscribe().unwrap();
        assert!(publisher.is_subscribed());

        assert!(publisher.publish(fix(39.0, -104.0)));
        assert!(publisher.publish(fix(39.1, -104.0)));

        assert_eq!(sub.recv().await.unwrap().coordinate.latitude, 39.0);
        assert_eq!(sub.recv().await.unwrap().coordinate.latitude, 39.1);
    }

    #[tokio::test]
    async fn test_full_buffer_drops() {
        let (mut source, publisher) = ChannelPositionSource::with_capacity(1);
        let _sub = source.subscribe().unwrap();
        assert!(publisher.publish(fix(39.0, -104.0)));
        assert!(!publisher.publish(fix(39.1, -104.0)));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let (mut source, publisher) = ChannelPositionSource::new();
        let mut sub = source.subscribe().unwrap();
        sub.unsubscribe();

        assert!(sub.is_unsubscribed());
        assert!(!publisher.publish(fix(39.0, -104.0)));
        assert!(sub.recv().await.is_none());
        assert!(!publisher.is_subscribed());
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let (mut source, publisher) = ChannelPositionSource::new();
        let mut sub = source.subscribe().unwrap();
        publisher.publish(fix(39.0, -104.0));
        publisher.close();

        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_none());
    }
}

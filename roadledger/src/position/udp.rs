//! UDP adapter - listens for GPS sentences broadcast on the local network.
//!
//! Phone GPS-forwarding apps and in-cab GPS units commonly broadcast NMEA or
//! ForeFlight sentences over UDP. This adapter binds a socket up front (so a
//! busy port fails fast) and streams parsed fixes once subscribed.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::channel::DEFAULT_CHANNEL_CAPACITY;
use super::protocol::parse_datagram;
use super::{PositionFix, PositionSource, PositionSubscription, SourceError};

/// Default UDP port (the ForeFlight GPS broadcast port).
pub const DEFAULT_UDP_PORT: u16 = 49002;

/// Maximum datagram size we expect.
const MAX_PACKET_SIZE: usize = 2048;

/// Position source reading GPS sentences from a UDP socket.
#[derive(Debug)]
pub struct UdpPositionSource {
    socket: Option<UdpSocket>,
    port: u16,
}

impl UdpPositionSource {
    /// Bind `0.0.0.0:port`. Port 0 picks an ephemeral port.
    pub async fn bind(port: u16) -> Result<Self, SourceError> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .await
            .map_err(|source| SourceError::SocketBind { port, source })?;
        let port = socket.local_addr().map(|a| a.port()).unwrap_or(port);
        info!(port, "GPS UDP listener bound");
        Ok(Self {
            socket: Some(socket),
            port,
        })
    }

    /// The bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The bound address, while the socket has not been handed to a subscription.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl PositionSource for UdpPositionSource {
    fn subscribe(&mut self) -> Result<PositionSubscription, SourceError> {
        let socket = self.socket.take().ok_or(SourceError::AlreadySubscribed)?;
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        tokio::spawn(receive_loop(socket, tx, cancel.clone()));
        Ok(PositionSubscription::new(rx, cancel))
    }
}

async fn receive_loop(socket: UdpSocket, tx: mpsc::Sender<PositionFix>, cancel: CancellationToken) {
    let mut buffer = [0u8; MAX_PACKET_SIZE];
    let mut packets_received: u64 = 0;
    let mut fixes_sent: u64 = 0;

    loop {
        let len = tokio::select! {
            _ = cancel.cancelled() => break,
            result = socket.recv(&mut buffer) => match result {
                Ok(len) => len,
                Err(e) => {
                    warn!(error = %e, "UDP receive error");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
        };

        packets_received += 1;
        let fixes = parse_datagram(&buffer[..len], Utc::now());
        if fixes.is_empty() {
            if packets_received <= 5 {
                let preview = String::from_utf8_lossy(&buffer[..len.min(50)]);
                debug!(packet_num = packets_received, preview = %preview, "Unrecognised GPS datagram");
            }
            continue;
        }

        for fix in fixes {
            if fixes_sent == 0 {
                info!(at = %fix.coordinate, "First GPS fix received over UDP");
            }
            trace!(at = %fix.coordinate, "GPS fix");
            if tx.send(fix).await.is_err() {
                debug!("Subscription closed, stopping UDP listener");
                return;
            }
            fixes_sent += 1;
        }
    }

    info!(packets_received, fixes_sent, "GPS UDP listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receives_xgps_over_loopback() {
        let mut source = UdpPositionSource::bind(0).await.unwrap();
        let port = source.port();
        assert_ne!(port, 0);

        let mut sub = source.subscribe().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender
            .send_to(b"XGPSTruck,-104.99,39.74,1600,90,20", ("127.0.0.1", port))
            .await
            .unwrap();

        let fix = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("fix should arrive")
            .unwrap();
        assert_eq!(fix.coordinate.latitude, 39.74);

        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_second_subscribe_fails() {
        let mut source = UdpPositionSource::bind(0).await.unwrap();
        let _sub = source.subscribe().unwrap();
        assert!(matches!(
            source.subscribe(),
            Err(SourceError::AlreadySubscribed)
        ));
    }
}

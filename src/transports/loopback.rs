//! In-memory transport pair.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::transport::FrameTransport;
use crate::types::{NodePair, ReceivedPacket};
use crate::{Result, TelemetryError};

const CHANNEL_CAPACITY: usize = 64;

/// One end of an in-memory link.
///
/// Packets sent on one end arrive on the other stamped with the sender's and
/// peer's node ids, the way the radio driver reports them.
#[derive(Debug)]
pub struct LoopbackTransport {
    node: u8,
    peer: u8,
    tx: mpsc::Sender<ReceivedPacket>,
    rx: mpsc::Receiver<ReceivedPacket>,
    fail_sends: Arc<AtomicU32>,
}

/// Handle for injecting send failures into a [`LoopbackTransport`].
#[derive(Debug, Clone)]
pub struct FaultInjector {
    fail_sends: Arc<AtomicU32>,
}

impl FaultInjector {
    /// Make the next `count` sends fail.
    pub fn fail_next_sends(&self, count: u32) {
        self.fail_sends.store(count, Ordering::SeqCst);
    }
}

impl LoopbackTransport {
    /// Create connected (flight, ground) endpoints for a node pair.
    pub fn pair(nodes: NodePair) -> (Self, Self) {
        let (to_ground, from_flight) = mpsc::channel(CHANNEL_CAPACITY);
        let (to_flight, from_ground) = mpsc::channel(CHANNEL_CAPACITY);
        let flight = Self::endpoint(nodes.flight, nodes.ground, to_ground, from_ground);
        let ground = Self::endpoint(nodes.ground, nodes.flight, to_flight, from_flight);
        (flight, ground)
    }

    fn endpoint(
        node: u8,
        peer: u8,
        tx: mpsc::Sender<ReceivedPacket>,
        rx: mpsc::Receiver<ReceivedPacket>,
    ) -> Self {
        Self { node, peer, tx, rx, fail_sends: Arc::new(AtomicU32::new(0)) }
    }

    /// Send a packet with explicit addressing, bypassing this end's node ids.
    pub async fn send_as(&mut self, from: u8, to: u8, bytes: &[u8]) -> Result<()> {
        self.deliver(ReceivedPacket::new(from, to, bytes)).await
    }

    pub fn fault_injector(&self) -> FaultInjector {
        FaultInjector { fail_sends: Arc::clone(&self.fail_sends) }
    }

    async fn deliver(&mut self, packet: ReceivedPacket) -> Result<()> {
        let injected = self
            .fail_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!("Loopback node {} dropping send (injected fault)", self.node);
            return Err(TelemetryError::transport_failed("injected send failure"));
        }

        trace!("Loopback {} -> {}: {} bytes", packet.from, packet.to, packet.len());
        self.tx
            .send(packet)
            .await
            .map_err(|_| TelemetryError::transport_failed("loopback peer closed"))
    }
}

#[async_trait::async_trait]
impl FrameTransport for LoopbackTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let packet = ReceivedPacket::new(self.node, self.peer, bytes);
        self.deliver(packet).await
    }

    async fn receive(&mut self) -> Result<Option<ReceivedPacket>> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn packets_are_stamped_with_node_ids() {
        let (mut flight, mut ground) = LoopbackTransport::pair(NodePair::default());
        flight.send(b"hello").await.unwrap();
        let packet = ground.receive().await.unwrap().unwrap();
        assert_eq!((packet.from, packet.to), (31, 30));
        assert_eq!(packet.payload, b"hello");

        ground.send(b"ack").await.unwrap();
        let packet = flight.receive().await.unwrap().unwrap();
        assert_eq!((packet.from, packet.to), (30, 31));
    }

    #[tokio::test]
    async fn injected_faults_fail_exact_count() {
        let (mut flight, mut ground) = LoopbackTransport::pair(NodePair::default());
        flight.fault_injector().fail_next_sends(2);
        assert!(flight.send(b"a").await.unwrap_err().is_retryable());
        assert!(flight.send(b"b").await.is_err());
        flight.send(b"c").await.unwrap();
        assert_eq!(ground.receive().await.unwrap().unwrap().payload, b"c");
    }

    #[tokio::test]
    async fn closed_peer_ends_receive_and_fails_send() {
        let (mut flight, ground) = LoopbackTransport::pair(NodePair::default());
        drop(ground);
        assert!(flight.receive().await.unwrap().is_none());
        assert!(matches!(flight.send(b"x").await, Err(TelemetryError::Transport { .. })));
    }

    #[tokio::test]
    async fn send_as_overrides_addressing() {
        let (mut flight, mut ground) = LoopbackTransport::pair(NodePair::default());
        flight.send_as(30, 31, b"spoof").await.unwrap();
        let packet = ground.receive().await.unwrap().unwrap();
        assert_eq!((packet.from, packet.to), (30, 31));
    }
}

//! UDP datagram transport.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

use crate::config::LinkConfig;
use crate::transport::FrameTransport;
use crate::types::ReceivedPacket;
use crate::{Result, TelemetryError};

/// Largest datagram accepted.
const MAX_DATAGRAM: usize = 512;

/// One end of a UDP link.
///
/// UDP carries no node addressing, so received datagrams are stamped with the
/// configured peer as sender and this end as recipient, and carry no signal
/// strength.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
    node: u8,
    peer_node: u8,
    timeout: Duration,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind `local` and send to `peer`.
    pub async fn bind(
        local: SocketAddr,
        peer: SocketAddr,
        node: u8,
        peer_node: u8,
        timeout: Duration,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(local).await.map_err(|e| {
            TelemetryError::transport_failed_with_source(format!("cannot bind {}", local), Box::new(e))
        })?;
        let bound = socket.local_addr()?;
        info!("UDP node {} bound to {}, peer {} at {}", node, bound, peer_node, peer);
        Ok(Self { socket, peer, node, peer_node, timeout, buf: vec![0; MAX_DATAGRAM] })
    }

    /// Flight end: bind the configured flight port, send to the ground endpoint.
    pub async fn flight(config: &LinkConfig) -> Result<Self> {
        let local = SocketAddr::from(([0, 0, 0, 0], config.flight_port));
        Self::bind(
            local,
            config.ground_endpoint,
            config.nodes.flight,
            config.nodes.ground,
            config.receive_timeout(),
        )
        .await
    }

    /// Ground end: bind the ground endpoint, reply to `flight`.
    pub async fn ground(config: &LinkConfig, flight: SocketAddr) -> Result<Self> {
        Self::bind(
            config.ground_endpoint,
            flight,
            config.nodes.ground,
            config.nodes.flight,
            config.receive_timeout(),
        )
        .await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Redirect sends to a different peer address.
    pub fn set_peer(&mut self, peer: SocketAddr) {
        debug!("UDP node {} peer now {}", self.node, peer);
        self.peer = peer;
    }
}

#[async_trait::async_trait]
impl FrameTransport for UdpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let sent = self.socket.send_to(bytes, self.peer).await?;
        if sent != bytes.len() {
            return Err(TelemetryError::transport_failed(format!(
                "short send: {} of {} bytes",
                sent,
                bytes.len()
            )));
        }
        trace!("UDP sent {} bytes to {}", sent, self.peer);
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<ReceivedPacket>> {
        let (len, addr) = tokio::time::timeout(self.timeout, self.socket.recv_from(&mut self.buf))
            .await
            .map_err(|_| TelemetryError::Timeout { duration: self.timeout })??;
        trace!("UDP received {} bytes from {}", len, addr);
        Ok(Some(ReceivedPacket::new(self.peer_node, self.node, &self.buf[..len])))
    }
}

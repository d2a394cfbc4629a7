//! Frame transport trait shared by the radio and network links.

use crate::Result;
use crate::types::ReceivedPacket;

/// Byte sink and source for one end of the link.
///
/// A transport delivers whole packets: one `send` is one radio packet or one
/// datagram, and `receive` hands up one packet with its addressing metadata.
#[async_trait::async_trait]
pub trait FrameTransport: Send + 'static {
    /// Send one packet to the peer node.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Wait for the next packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - Packet received
    /// - `Ok(None)` - Transport closed (normal termination)
    /// - `Err(e)` - Receive failed or timed out
    async fn receive(&mut self) -> Result<Option<ReceivedPacket>>;
}

//! Received packets and node addressing.

use serde::{Deserialize, Serialize};

/// Default radio node id of the flight computer.
pub const FLIGHT_NODE_ID: u8 = 31;

/// Default radio node id of the ground station.
pub const GROUND_NODE_ID: u8 = 30;

/// Sender/recipient pair expected on the downlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePair {
    /// Node that transmits telemetry.
    pub flight: u8,
    /// Node that receives telemetry.
    pub ground: u8,
}

impl Default for NodePair {
    fn default() -> Self {
        Self { flight: FLIGHT_NODE_ID, ground: GROUND_NODE_ID }
    }
}

impl NodePair {
    pub fn new(flight: u8, ground: u8) -> Self {
        Self { flight, ground }
    }

    /// Whether a packet travelled flight -> ground.
    pub fn matches(&self, from: u8, to: u8) -> bool {
        from == self.flight && to == self.ground
    }

    /// The same pair with the roles exchanged.
    pub fn swapped(&self) -> Self {
        Self { flight: self.ground, ground: self.flight }
    }
}

/// A packet handed up by the transport, with its addressing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPacket {
    /// Sender node id.
    pub from: u8,
    /// Recipient node id.
    pub to: u8,
    /// Signal strength in dBm, when the transport reports one.
    pub rssi: Option<i16>,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl ReceivedPacket {
    /// Create a packet without signal strength.
    pub fn new(from: u8, to: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self { from, to, rssi: None, payload: payload.into() }
    }

    /// Attach a signal strength reading.
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

//! Per-packet classification.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{LinkCounters, LinkSummary};
use crate::codec::FrameCodec;
use crate::types::{Frame, NodePair, ReceivedPacket, TelemetrySample, channel};
use crate::{Result, TelemetryError};

/// Default link-test pattern sent by the flight node.
pub const DEFAULT_TEST_PATTERN: &str = "aXXYYZZgXXYYZZttPPaaVV";

/// Outcome of one structurally valid packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkOutcome {
    /// Address and content both correct.
    Good,
    /// Content correct, sent or addressed by the wrong node.
    BadAddress,
    /// Address correct, content wrong.
    BadData,
    /// Neither address nor content correct.
    BadGarbage,
}

impl LinkOutcome {
    pub fn classify(address_ok: bool, data_ok: bool) -> Self {
        match (address_ok, data_ok) {
            (true, true) => LinkOutcome::Good,
            (false, true) => LinkOutcome::BadAddress,
            (true, false) => LinkOutcome::BadData,
            (false, false) => LinkOutcome::BadGarbage,
        }
    }
}

/// What the validator expects packet content to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Packets repeat a fixed test pattern.
    LinkTest { pattern: String },
    /// Packets are telemetry frames.
    Telemetry,
}

impl Default for ValidationMode {
    fn default() -> Self {
        ValidationMode::LinkTest { pattern: DEFAULT_TEST_PATTERN.to_string() }
    }
}

/// Result of observing one packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub outcome: LinkOutcome,
    /// Decoded sample, for telemetry packets whose content checked out.
    pub sample: Option<TelemetrySample>,
}

#[derive(Debug, Clone)]
enum ContentCheck {
    Pattern(Vec<u8>),
    Frames(FrameCodec),
}

/// Classifies received packets and keeps the session counters.
#[derive(Debug, Clone)]
pub struct LinkValidator {
    expected: NodePair,
    mode: ValidationMode,
    check: ContentCheck,
    counters: LinkCounters,
    malformed: u64,
}

impl LinkValidator {
    /// Build a validator. Telemetry mode uses the standard frame layout.
    pub fn new(expected: NodePair, mode: ValidationMode) -> Result<Self> {
        match mode {
            ValidationMode::LinkTest { pattern } => Self::link_test(expected, pattern),
            ValidationMode::Telemetry => Ok(Self::telemetry(expected, FrameCodec::standard()?)),
        }
    }

    /// Validator for link-test packets.
    ///
    /// # Errors
    ///
    /// An empty pattern matches any payload, so it is refused as a config error.
    pub fn link_test(expected: NodePair, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(TelemetryError::config_error("<config>", "test pattern must not be empty"));
        }
        let check = ContentCheck::Pattern(pattern.as_bytes().to_vec());
        Ok(Self {
            expected,
            mode: ValidationMode::LinkTest { pattern },
            check,
            counters: LinkCounters::default(),
            malformed: 0,
        })
    }

    /// Validator for telemetry frames using a specific codec.
    pub fn telemetry(expected: NodePair, codec: FrameCodec) -> Self {
        Self {
            expected,
            mode: ValidationMode::Telemetry,
            check: ContentCheck::Frames(codec),
            counters: LinkCounters::default(),
            malformed: 0,
        }
    }

    pub fn expected(&self) -> NodePair {
        self.expected
    }

    pub fn mode(&self) -> &ValidationMode {
        &self.mode
    }

    /// Classify one packet and update the counters.
    ///
    /// Returns `None` for a packet that is not structurally valid (empty
    /// link-test payload, or a telemetry frame with bad sync or length). Such
    /// packets are logged and counted as malformed, never classified.
    pub fn observe(&mut self, packet: &ReceivedPacket) -> Option<Observation> {
        let address_ok = self.expected.matches(packet.from, packet.to);

        let (data_ok, sample) = match &self.check {
            ContentCheck::Pattern(pattern) => {
                if packet.is_empty() {
                    warn!("Dropping empty packet from node {}", packet.from);
                    self.malformed += 1;
                    return None;
                }
                let n = packet.len().min(pattern.len());
                (packet.payload[..n] == pattern[..n], None)
            }
            ContentCheck::Frames(codec) => {
                let frame = match Frame::from_bytes(&packet.payload) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Dropping malformed frame from node {}: {}", packet.from, e);
                        self.malformed += 1;
                        return None;
                    }
                };
                match decode_checked(codec, &frame) {
                    Some(sample) => (true, Some(sample)),
                    None => (false, None),
                }
            }
        };

        let outcome = LinkOutcome::classify(address_ok, data_ok);
        self.counters.record(outcome);
        trace!(
            "Packet #{} {}->{} ({} bytes, rssi {:?}): {:?}",
            self.counters.total,
            packet.from,
            packet.to,
            packet.len(),
            packet.rssi,
            outcome
        );

        Some(Observation { outcome, sample })
    }

    pub fn counters(&self) -> LinkCounters {
        self.counters
    }

    /// Packets dropped before classification.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    pub fn summary(&self) -> LinkSummary {
        LinkSummary { counters: self.counters, malformed: self.malformed }
    }
}

/// Decode a telemetry frame whose spare bits must be clear.
fn decode_checked(codec: &FrameCodec, frame: &Frame) -> Option<TelemetrySample> {
    let values = match codec.unpack(frame) {
        Ok(values) => values,
        Err(e) => {
            debug!("Frame failed to decode: {}", e);
            return None;
        }
    };
    if values.get(channel::RESERVED).is_some_and(|spare| *spare != 0.0) {
        debug!("Frame has spare bits set: {:?}", frame);
        return None;
    }
    Some(TelemetrySample::from_values(&values))
}

//! Wire frame: sync byte, two big-endian words, sync byte.

use std::fmt;

use crate::{Result, TelemetryError};

/// Marker byte that opens every frame.
pub const SYNC_START: u8 = 0x5E;

/// Marker byte that closes every frame.
pub const SYNC_END: u8 = 0xD5;

/// Payload length in bytes (two 64-bit words).
pub const PAYLOAD_LEN: usize = 16;

/// Total frame length on the wire.
pub const FRAME_LEN: usize = PAYLOAD_LEN + 2;

/// One 18-byte telemetry frame.
///
/// Only the payload is stored; the sync bytes are fixed and added or checked
/// at the byte boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    payload: [u8; PAYLOAD_LEN],
}

impl Frame {
    /// Create a frame from its 16 payload bytes.
    pub fn new(payload: [u8; PAYLOAD_LEN]) -> Self {
        Self { payload }
    }

    /// Create a frame from the two packed words.
    pub fn from_words(word1: u64, word2: u64) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..8].copy_from_slice(&word1.to_be_bytes());
        payload[8..].copy_from_slice(&word2.to_be_bytes());
        Self { payload }
    }

    /// Parse a frame from wire bytes.
    ///
    /// # Errors
    ///
    /// - [`TelemetryError::BadSync`] if the first or last byte is not a sync marker
    /// - [`TelemetryError::BadLength`] if the buffer is not exactly [`FRAME_LEN`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some(&first) = bytes.first() else {
            return Err(TelemetryError::BadLength { expected: FRAME_LEN, found: 0 });
        };
        if first != SYNC_START {
            return Err(TelemetryError::BadSync { position: 0, expected: SYNC_START, found: first });
        }
        if bytes.len() != FRAME_LEN {
            return Err(TelemetryError::BadLength { expected: FRAME_LEN, found: bytes.len() });
        }
        let last = bytes[FRAME_LEN - 1];
        if last != SYNC_END {
            return Err(TelemetryError::BadSync {
                position: FRAME_LEN - 1,
                expected: SYNC_END,
                found: last,
            });
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&bytes[1..FRAME_LEN - 1]);
        Ok(Self { payload })
    }

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        out[0] = SYNC_START;
        out[1..FRAME_LEN - 1].copy_from_slice(&self.payload);
        out[FRAME_LEN - 1] = SYNC_END;
        out
    }

    /// The 16 payload bytes.
    pub fn payload(&self) -> &[u8; PAYLOAD_LEN] {
        &self.payload
    }

    /// The two packed words.
    pub fn words(&self) -> (u64, u64) {
        let mut w1 = [0u8; 8];
        let mut w2 = [0u8; 8];
        w1.copy_from_slice(&self.payload[..8]);
        w2.copy_from_slice(&self.payload[8..]);
        (u64::from_be_bytes(w1), u64::from_be_bytes(w2))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w1, w2) = self.words();
        f.debug_struct("Frame")
            .field("word1", &format_args!("{:#018x}", w1))
            .field("word2", &format_args!("{:#018x}", w2))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = SYNC_START;
        for (i, b) in bytes[1..17].iter_mut().enumerate() {
            *b = i as u8 * 0x11;
        }
        bytes[17] = SYNC_END;
        bytes
    }

    #[test]
    fn wire_bytes_round_trip() {
        let bytes = sample_bytes();
        let frame = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(frame.to_bytes(), bytes);
        assert_eq!(frame.payload()[0], 0x00);
        assert_eq!(frame.payload()[15], 0xFF);
    }

    #[test]
    fn words_are_big_endian() {
        let frame = Frame::from_words(0x0102_0304_0506_0708, 0x1112_1314_1516_1718);
        let bytes = frame.to_bytes();
        assert_eq!(&bytes[1..5], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(bytes[9], 0x11);
        assert_eq!(frame.words(), (0x0102_0304_0506_0708, 0x1112_1314_1516_1718));
    }

    #[test]
    fn altered_boundary_bytes_are_bad_sync() {
        let mut bytes = sample_bytes();
        bytes[0] = 0x5F;
        assert!(matches!(
            Frame::from_bytes(&bytes),
            Err(TelemetryError::BadSync { position: 0, found: 0x5F, .. })
        ));

        let mut bytes = sample_bytes();
        bytes[17] = 0x00;
        assert!(matches!(
            Frame::from_bytes(&bytes),
            Err(TelemetryError::BadSync { position: 17, expected: SYNC_END, found: 0x00 })
        ));
    }

    #[test]
    fn wrong_payload_length_is_bad_length() {
        let bytes = sample_bytes();

        let mut short = bytes[..17].to_vec();
        short[16] = SYNC_END;
        assert!(matches!(
            Frame::from_bytes(&short),
            Err(TelemetryError::BadLength { expected: FRAME_LEN, found: 17 })
        ));

        let mut long = bytes.to_vec();
        long.insert(5, 0xAA);
        assert!(matches!(
            Frame::from_bytes(&long),
            Err(TelemetryError::BadLength { expected: FRAME_LEN, found: 19 })
        ));

        assert!(matches!(Frame::from_bytes(&[]), Err(TelemetryError::BadLength { found: 0, .. })));
    }
}

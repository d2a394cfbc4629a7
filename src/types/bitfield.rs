//! Bitfield accumulator for packing fields into one 64-bit word.

use crate::{Result, TelemetryError};

/// Number of bits one accumulator (and one frame word) holds.
pub const WORD_BITS: u32 = 64;

/// Mask covering the low `width` bits. Valid for `width` in `0..=64`.
pub(crate) fn low_mask(width: u32) -> u64 {
    if width >= WORD_BITS { u64::MAX } else { (1u64 << width) - 1 }
}

/// Sign-extend the low `width` bits of `raw`. `width` must be in `1..=64`.
pub(crate) fn sign_extend(raw: u64, width: u32) -> i64 {
    let shift = WORD_BITS - width;
    ((raw << shift) as i64) >> shift
}

/// A 64-bit shift register that concatenates fields in push order.
///
/// The accumulator is scratch state for a single packing or unpacking pass:
/// build one per word, push or pop its fields, then drop it. Fields come back
/// out in the order they went in (first pushed, first popped), so the same
/// ordered field list drives both directions.
///
/// Unlike a bare `u64` shifted by hand, the accumulator tracks how many bits
/// it holds and refuses a push that would shift earlier fields out of the top
/// of the word.
///
/// ```rust
/// use tecs::Accumulator;
///
/// let mut acc = Accumulator::new();
/// acc.push(-3, 6).unwrap();
/// acc.push(0x2A, 10).unwrap();
/// assert_eq!(acc.pop_signed(6).unwrap(), -3);
/// assert_eq!(acc.pop_unsigned(10).unwrap(), 0x2A);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    /// Held bits, right-aligned: the most recently pushed field is lowest.
    bits: u64,
    /// Number of significant bits currently held.
    len: u32,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a complete 64-bit word for unpacking.
    pub fn from_word(word: u64) -> Self {
        Self { bits: word, len: WORD_BITS }
    }

    /// Load a word from its big-endian byte representation.
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self::from_word(u64::from_be_bytes(bytes))
    }

    /// Number of significant bits held.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the accumulator holds no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits that can still be pushed before the word is full.
    pub fn remaining(&self) -> u32 {
        WORD_BITS - self.len
    }

    /// Push the low `width` bits of `value`.
    ///
    /// Negative values are stored in two's complement, truncated to `width`
    /// bits. A zero width is a no-op.
    ///
    /// # Errors
    ///
    /// - [`TelemetryError::InvalidWidth`] if `width > 64`
    /// - [`TelemetryError::FieldOverflow`] if the push would exceed 64 held bits
    pub fn push(&mut self, value: i64, width: u32) -> Result<()> {
        self.push_bits(value as u64, width)
    }

    /// Push the low `width` bits of an unsigned value.
    pub fn push_bits(&mut self, value: u64, width: u32) -> Result<()> {
        if width > WORD_BITS {
            return Err(TelemetryError::InvalidWidth { width, available: self.remaining() });
        }
        if width == 0 {
            return Ok(());
        }
        if width > self.remaining() {
            return Err(TelemetryError::field_overflow(
                "accumulator",
                self.len + width,
                WORD_BITS,
            ));
        }

        // A 64-bit push only happens into an empty accumulator.
        self.bits = if width == WORD_BITS { 0 } else { self.bits << width };
        self.bits |= value & low_mask(width);
        self.len += width;
        Ok(())
    }

    /// Fill the rest of the word with zero bits.
    pub fn pad_to_word(&mut self) {
        let pad = self.remaining();
        if pad > 0 {
            self.bits = if pad == WORD_BITS { 0 } else { self.bits << pad };
            self.len = WORD_BITS;
        }
    }

    /// Pop the oldest `width` bits as an unsigned value.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::InvalidWidth`] if `width > 64` or more bits are
    /// requested than the accumulator holds.
    pub fn pop_unsigned(&mut self, width: u32) -> Result<u64> {
        if width == 0 {
            return Ok(0);
        }
        if width > WORD_BITS || width > self.len {
            return Err(TelemetryError::InvalidWidth { width, available: self.len });
        }

        let shift = self.len - width;
        let raw = (self.bits >> shift) & low_mask(width);
        self.len = shift;
        self.bits &= low_mask(self.len);
        Ok(raw)
    }

    /// Pop the oldest `width` bits, sign-extending bit `width - 1`.
    pub fn pop_signed(&mut self, width: u32) -> Result<i64> {
        if width == 0 {
            return Ok(0);
        }
        let raw = self.pop_unsigned(width)?;
        Ok(sign_extend(raw, width))
    }

    /// Pop `width` bits with the given signedness.
    ///
    /// Unsigned 64-bit values above `i64::MAX` come back reinterpreted; use
    /// [`pop_unsigned`](Self::pop_unsigned) when the full range matters.
    pub fn pop(&mut self, width: u32, signed: bool) -> Result<i64> {
        if signed { self.pop_signed(width) } else { self.pop_unsigned(width).map(|v| v as i64) }
    }

    /// Serialize a full word as big-endian bytes by popping eight bytes.
    ///
    /// A partially filled accumulator is zero-padded first.
    pub fn drain_be_bytes(&mut self) -> Result<[u8; 8]> {
        self.pad_to_word();
        let mut out = [0u8; 8];
        for byte in &mut out {
            *byte = self.pop_unsigned(8)? as u8;
        }
        Ok(out)
    }
}

//! Frame layouts: ordered field lists for the two payload words.
//!
//! A layout is validated once, when the codec is built. Validation produces a
//! per-channel plan (total width, signedness, scale) so the per-frame
//! encode/decode paths do no layout checking at all.

use std::collections::BTreeMap;

use crate::types::WORD_BITS;
use crate::types::channel::*;
use crate::{Result, TelemetryError};

/// One bitfield inside a word.
///
/// A field carries `width` bits of a named channel. Most channels fit in one
/// field; a channel may also be split across several fields (possibly in
/// different words), each carrying the slice of the quantized value that
/// starts at bit `shift`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Channel this field carries.
    pub name: &'static str,
    /// Width in bits, `1..=64`.
    pub width: u32,
    /// Two's complement when true.
    pub signed: bool,
    /// Quantization multiplier applied before packing.
    pub scale: f64,
    /// Bit offset of this slice within the quantized channel value.
    pub shift: u32,
    /// Flag set: out-of-range bits are dropped instead of saturating.
    pub flags: bool,
}

impl FieldSpec {
    /// Unsigned field, unit scale.
    pub const fn unsigned(name: &'static str, width: u32) -> Self {
        Self { name, width, signed: false, scale: 1.0, shift: 0, flags: false }
    }

    /// Signed field, unit scale.
    pub const fn signed(name: &'static str, width: u32) -> Self {
        Self { name, width, signed: true, scale: 1.0, shift: 0, flags: false }
    }

    /// Unsigned bit set. Only the low `width` bits are carried.
    pub const fn flags(name: &'static str, width: u32) -> Self {
        Self { name, width, signed: false, scale: 1.0, shift: 0, flags: true }
    }

    /// Same field with a quantization multiplier.
    pub const fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Same field carrying the channel bits starting at `shift`.
    pub const fn slice(mut self, shift: u32) -> Self {
        self.shift = shift;
        self
    }

    /// Highest channel bit (exclusive) this field covers.
    fn top(&self) -> u32 {
        self.shift + self.width
    }
}

/// Ordered fields of one 64-bit word, most significant first.
#[derive(Debug, Clone, PartialEq)]
pub struct WordLayout {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl WordLayout {
    pub fn new(name: &'static str, fields: impl Into<Vec<FieldSpec>>) -> Self {
        Self { name, fields: fields.into() }
    }

    /// Sum of declared field widths.
    pub fn declared_bits(&self) -> u32 {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Check widths and the 64-bit budget.
    pub fn validate(&self) -> Result<()> {
        for field in &self.fields {
            if field.width == 0 || field.width > WORD_BITS {
                return Err(TelemetryError::InvalidWidth { width: field.width, available: WORD_BITS });
            }
        }
        let declared = self.declared_bits();
        if declared > WORD_BITS {
            return Err(TelemetryError::field_overflow(self.name, declared, WORD_BITS));
        }
        Ok(())
    }
}

/// Word 1: status, acceleration, x/y rates and the top 11 bits of z rate.
pub fn standard_word1() -> WordLayout {
    WordLayout::new(
        "word 1",
        [
            FieldSpec::unsigned(FLIGHT_STATE, 6),
            FieldSpec::flags(ERROR_FLAGS, 6),
            FieldSpec::signed(ACCEL_X, 6).scaled(10.0),
            FieldSpec::signed(ACCEL_Y, 6).scaled(10.0),
            FieldSpec::signed(ACCEL_Z, 9).scaled(10.0),
            FieldSpec::signed(GYRO_X, 10),
            FieldSpec::signed(GYRO_Y, 10),
            FieldSpec::signed(GYRO_Z, 11).slice(1),
        ],
    )
}

/// Word 2: low bit of z rate, attitude, altitude, temperature, supply, spare byte.
pub fn standard_word2() -> WordLayout {
    WordLayout::new(
        "word 2",
        [
            FieldSpec::unsigned(GYRO_Z, 1),
            FieldSpec::signed(ROLL, 9),
            FieldSpec::signed(PITCH, 9),
            FieldSpec::signed(YAW, 9),
            FieldSpec::unsigned(ALTITUDE, 12),
            FieldSpec::signed(TEMPERATURE, 8),
            FieldSpec::unsigned(VOLTAGE, 8).scaled(10.0),
            FieldSpec::unsigned(RESERVED, 8),
        ],
    )
}

/// Word 2 as first flown: z rate repeated in full, 75 bits in all.
///
/// Kept so tooling can show why it is refused; building a codec with it fails
/// with [`TelemetryError::FieldOverflow`].
pub fn legacy_word2() -> WordLayout {
    WordLayout::new(
        "legacy word 2",
        [
            FieldSpec::signed(GYRO_Z, 12),
            FieldSpec::signed(ROLL, 9),
            FieldSpec::signed(PITCH, 9),
            FieldSpec::signed(YAW, 9),
            FieldSpec::unsigned(ALTITUDE, 12),
            FieldSpec::signed(TEMPERATURE, 8),
            FieldSpec::unsigned(VOLTAGE, 8).scaled(10.0),
            FieldSpec::unsigned(RESERVED, 8),
        ],
    )
}

/// Two word layouts making up a frame payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub words: [WordLayout; 2],
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl FrameLayout {
    pub fn new(word1: WordLayout, word2: WordLayout) -> Self {
        Self { words: [word1, word2] }
    }

    /// The flight layout: 64 bits in each word.
    pub fn standard() -> Self {
        Self::new(standard_word1(), standard_word2())
    }

    /// Validate the layout and derive the per-channel plan.
    pub(crate) fn plan(&self) -> Result<Vec<ChannelPlan>> {
        let mut channels: BTreeMap<&'static str, Vec<FieldSpec>> = BTreeMap::new();
        for word in &self.words {
            word.validate()?;
            for field in &word.fields {
                channels.entry(field.name).or_default().push(*field);
            }
        }

        channels.into_iter().map(|(name, parts)| ChannelPlan::from_parts(name, &parts)).collect()
    }
}

/// Derived description of one logical channel.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChannelPlan {
    pub name: &'static str,
    /// Total bits across all slices.
    pub width: u32,
    pub signed: bool,
    pub scale: f64,
    pub flags: bool,
}

impl ChannelPlan {
    fn from_parts(name: &'static str, parts: &[FieldSpec]) -> Result<Self> {
        let mut sorted: Vec<FieldSpec> = parts.to_vec();
        sorted.sort_by_key(|p| p.shift);

        // Slices must tile the channel from bit 0 upwards.
        let mut next = 0;
        for part in &sorted {
            if part.shift != next {
                return Err(TelemetryError::invalid_layout(format!(
                    "channel '{}' slice at bit {} does not continue from bit {}",
                    name, part.shift, next
                )));
            }
            next = part.top();
        }
        if next > WORD_BITS {
            return Err(TelemetryError::invalid_layout(format!(
                "channel '{}' spans {} bits, more than {}",
                name, next, WORD_BITS
            )));
        }

        let (top, lower) = match sorted.split_last() {
            Some(split) => split,
            None => return Err(TelemetryError::invalid_layout(format!("channel '{}' is empty", name))),
        };
        if lower.iter().any(|p| p.signed) {
            return Err(TelemetryError::invalid_layout(format!(
                "channel '{}' has a signed slice below its top slice",
                name
            )));
        }
        if sorted.iter().any(|p| p.flags != top.flags) || (top.flags && top.signed) {
            return Err(TelemetryError::invalid_layout(format!(
                "channel '{}' mixes flag and numeric slices",
                name
            )));
        }
        if sorted.iter().any(|p| p.scale != top.scale) {
            return Err(TelemetryError::invalid_layout(format!(
                "channel '{}' slices disagree on scale",
                name
            )));
        }
        if !(top.scale.is_finite() && top.scale > 0.0) {
            return Err(TelemetryError::invalid_layout(format!(
                "channel '{}' scale must be positive",
                name
            )));
        }

        Ok(Self { name, width: next, signed: top.signed, scale: top.scale, flags: top.flags })
    }

    /// Smallest and largest quantized values the channel can carry.
    pub fn range(&self) -> (i128, i128) {
        let width = self.width as i128;
        if self.signed {
            (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
        } else {
            (0, (1i128 << width) - 1)
        }
    }
}

//! Telemetry frame codec.
//!
//! The codec turns a [`TelemetrySample`] into an 18-byte [`Frame`] and back.
//! It follows a "validate once, run fast" split:
//!
//! - **Construction**: the [`FrameLayout`] is checked (widths, the 64-bit word
//!   budget, channel slices) and compiled into a per-channel plan. A layout that
//!   oversubscribes a word is refused here with
//!   [`FieldOverflow`](crate::TelemetryError::FieldOverflow), never at runtime.
//! - **Per frame**: each word is packed into a fresh [`Accumulator`] in
//!   declared field order, then drained into big-endian bytes. Decoding loads
//!   each word into an accumulator and pops the fields back in the same order.
//!
//! # Quantization
//!
//! Every channel is multiplied by its scale, rounded to the nearest integer and
//! saturated to the range its total width can carry. Flag channels are the
//! exception: only their low bits are defined, and higher bits are dropped.
//! Decoding divides by the scale again, so a value inside the channel range
//! comes back within half a quantization step.
//!
//! # Example
//!
//! ```rust
//! use tecs::{Axes, FrameCodec, TelemetrySample};
//!
//! let codec = FrameCodec::standard().unwrap();
//! let sample = TelemetrySample { accel: Axes::new(0.5, -1.2, 9.8), ..Default::default() };
//!
//! let bytes = codec.encode(&sample).unwrap().to_bytes();
//! assert_eq!(bytes.len(), 18);
//!
//! let decoded = codec.decode_bytes(&bytes).unwrap();
//! assert!((decoded.accel.y - -1.2).abs() < 0.05);
//! ```

mod layout;
mod scanner;

pub use layout::{
    FieldSpec, FrameLayout, WordLayout, legacy_word2, standard_word1, standard_word2,
};
pub use scanner::FrameScanner;

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::types::{Accumulator, FieldValues, Frame, PAYLOAD_LEN, TelemetrySample};
use crate::Result;
use layout::ChannelPlan;

/// One field of a word together with the index of its channel plan.
#[derive(Debug, Clone)]
struct FieldSlot {
    spec: FieldSpec,
    channel: usize,
}

/// Validated encoder/decoder for one frame layout.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    layout: FrameLayout,
    channels: Vec<ChannelPlan>,
    index_map: HashMap<&'static str, usize>,
    slots: [Vec<FieldSlot>; 2],
}

impl FrameCodec {
    /// Build a codec, validating the layout.
    ///
    /// # Errors
    ///
    /// - [`FieldOverflow`](crate::TelemetryError::FieldOverflow) if a word declares more than 64 bits
    /// - [`InvalidWidth`](crate::TelemetryError::InvalidWidth) for a field width outside `1..=64`
    /// - [`InvalidLayout`](crate::TelemetryError::InvalidLayout) for inconsistent channel slices
    pub fn new(layout: FrameLayout) -> Result<Self> {
        let channels = layout.plan()?;
        let index_map: HashMap<&'static str, usize> =
            channels.iter().enumerate().map(|(index, plan)| (plan.name, index)).collect();

        let slot_list = |word: usize| -> Vec<FieldSlot> {
            layout.words[word]
                .fields
                .iter()
                .map(|spec| FieldSlot { spec: *spec, channel: index_map[spec.name] })
                .collect()
        };
        let slots = [slot_list(0), slot_list(1)];

        debug!(
            "Frame layout validated: {} channels, {}+{} bits",
            channels.len(),
            layout.words[0].declared_bits(),
            layout.words[1].declared_bits()
        );

        Ok(Self { layout, channels, index_map, slots })
    }

    /// Codec for the standard flight layout.
    pub fn standard() -> Result<Self> {
        Self::new(FrameLayout::standard())
    }

    /// The validated layout.
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Channel names carried by this layout, in name order.
    pub fn channel_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.channels.iter().map(|plan| plan.name)
    }

    /// Whether the layout carries a channel.
    pub fn has_channel(&self, name: &str) -> bool {
        self.index_map.contains_key(name)
    }

    /// Pack named channel values into a frame. Missing channels pack as zero.
    pub fn pack(&self, values: &FieldValues) -> Result<Frame> {
        let quantized: Vec<i128> = self
            .channels
            .iter()
            .map(|plan| quantize(plan, values.get(plan.name).copied().unwrap_or(0.0)))
            .collect();

        let mut payload = [0u8; PAYLOAD_LEN];
        for (word, slots) in self.slots.iter().enumerate() {
            let mut acc = Accumulator::new();
            for slot in slots {
                let slice = (quantized[slot.channel] >> slot.spec.shift) as i64;
                acc.push(slice, slot.spec.width)?;
            }
            let bytes = acc.drain_be_bytes()?;
            payload[word * 8..word * 8 + 8].copy_from_slice(&bytes);
        }

        let frame = Frame::new(payload);
        trace!("Packed {:?}", frame);
        Ok(frame)
    }

    /// Unpack a frame into named channel values.
    pub fn unpack(&self, frame: &Frame) -> Result<FieldValues> {
        let (word1, word2) = frame.words();
        let mut raw = vec![0i128; self.channels.len()];

        for (word, slots) in [word1, word2].into_iter().zip(&self.slots) {
            let mut acc = Accumulator::from_word(word);
            for slot in slots {
                let value = if slot.spec.signed {
                    i128::from(acc.pop_signed(slot.spec.width)?)
                } else {
                    i128::from(acc.pop_unsigned(slot.spec.width)?)
                };
                raw[slot.channel] += value << slot.spec.shift;
            }
        }

        Ok(self
            .channels
            .iter()
            .zip(raw)
            .map(|(plan, value)| (plan.name, value as f64 / plan.scale))
            .collect())
    }

    /// Encode a sample into a frame.
    pub fn encode(&self, sample: &TelemetrySample) -> Result<Frame> {
        self.pack(&sample.to_values())
    }

    /// Decode a frame into a sample.
    pub fn decode(&self, frame: &Frame) -> Result<TelemetrySample> {
        Ok(TelemetrySample::from_values(&self.unpack(frame)?))
    }

    /// Validate wire bytes and decode them into a sample.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<TelemetrySample> {
        self.decode(&Frame::from_bytes(bytes)?)
    }
}

/// Scale, round and saturate one engineering value.
fn quantize(plan: &ChannelPlan, value: f64) -> i128 {
    let (min, max) = plan.range();
    if value.is_nan() {
        debug!("Channel '{}' is NaN, packing zero", plan.name);
        return 0.clamp(min, max);
    }

    let scaled = (value * plan.scale).round() as i128;
    if plan.flags {
        let masked = scaled & max;
        if masked != scaled {
            debug!("Channel '{}' has bits above its {} bit width: {:#x}", plan.name, plan.width, scaled);
        }
        return masked;
    }

    let clamped = scaled.clamp(min, max);
    if clamped != scaled {
        debug!("Channel '{}' saturated: {} -> {}", plan.name, value, clamped as f64 / plan.scale);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryError;
    use crate::types::{Attitude, Axes, ErrorFlags, channel, error_flags};
    use proptest::prelude::*;

    fn flight_sample() -> TelemetrySample {
        TelemetrySample {
            flight_state: 5,
            error_flags: ErrorFlags(0b10_0001),
            accel: Axes::new(1.3, -2.1, 12.4),
            gyro: Axes::new(-250.0, 499.0, -1999.0),
            attitude: Attitude::new(-179.0, 45.0, 90.0),
            altitude: 3200.0,
            temperature: -30.0,
            voltage: 14.2,
        }
    }

    /// Read the bits the ground decoder reads, straight from the payload bitstream.
    fn read_stream(payload: &[u8; PAYLOAD_LEN], widths: &[(u32, bool)]) -> Vec<i64> {
        let mut bits: Vec<bool> = Vec::with_capacity(128);
        for byte in payload {
            for i in (0..8).rev() {
                bits.push(byte >> i & 1 == 1);
            }
        }
        let mut cursor = 0;
        widths
            .iter()
            .map(|&(width, signed)| {
                let mut value: i64 = 0;
                for bit in &bits[cursor..cursor + width as usize] {
                    value = (value << 1) | i64::from(*bit);
                }
                cursor += width as usize;
                if signed && value & (1 << (width - 1)) != 0 {
                    value -= 1 << width;
                }
                value
            })
            .collect()
    }

    #[test]
    fn legacy_layout_is_refused_at_construction() {
        let err = FrameCodec::new(FrameLayout::new(standard_word1(), legacy_word2())).unwrap_err();
        assert!(matches!(err, TelemetryError::FieldOverflow { declared_bits: 75, .. }));
    }

    #[test]
    fn frame_is_bracketed_by_sync_bytes() {
        let codec = FrameCodec::standard().unwrap();
        let bytes = codec.encode(&flight_sample()).unwrap().to_bytes();
        assert_eq!(bytes[0], 0x5E);
        assert_eq!(bytes[17], 0xD5);
    }

    #[test]
    fn payload_matches_ground_bitstream_layout() {
        let codec = FrameCodec::standard().unwrap();
        let frame = codec.encode(&flight_sample()).unwrap();

        let fields = read_stream(
            frame.payload(),
            &[
                (6, false),
                (6, false),
                (6, true),
                (6, true),
                (9, true),
                (10, true),
                (10, true),
                (12, true),
                (9, true),
                (9, true),
                (9, true),
                (12, false),
                (8, true),
                (8, false),
                (8, false),
            ],
        );
        assert_eq!(
            fields,
            vec![5, 0b10_0001, 13, -21, 124, -250, 499, -1999, -179, 45, 90, 3200, -30, 142, 0]
        );
    }

    #[test]
    fn decode_recovers_flight_sample() {
        let codec = FrameCodec::standard().unwrap();
        let sample = flight_sample();
        let decoded = codec.decode(&codec.encode(&sample).unwrap()).unwrap();

        assert_eq!(decoded.flight_state, sample.flight_state);
        assert_eq!(decoded.error_flags, sample.error_flags);
        assert!((decoded.accel.x - 1.3).abs() < 1e-9);
        assert!((decoded.accel.z - 12.4).abs() < 1e-9);
        assert_eq!(decoded.gyro, sample.gyro);
        assert_eq!(decoded.attitude, sample.attitude);
        assert_eq!(decoded.altitude, 3200.0);
        assert_eq!(decoded.temperature, -30.0);
        assert!((decoded.voltage - 14.2).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_values_saturate_instead_of_wrapping() {
        let codec = FrameCodec::standard().unwrap();
        let sample = TelemetrySample {
            accel: Axes::new(5.0, -5.0, 0.0),
            gyro: Axes::new(0.0, 0.0, 2500.0),
            altitude: -10.0,
            voltage: f64::NAN,
            ..Default::default()
        };
        let decoded = codec.decode(&codec.encode(&sample).unwrap()).unwrap();
        assert!((decoded.accel.x - 3.1).abs() < 1e-9);
        assert!((decoded.accel.y - -3.2).abs() < 1e-9);
        assert_eq!(decoded.gyro.z, 2047.0);
        assert_eq!(decoded.altitude, 0.0);
        assert_eq!(decoded.voltage, 0.0);
    }

    #[test]
    fn stray_flag_bits_are_dropped_not_saturated() {
        let codec = FrameCodec::standard().unwrap();
        let sample = TelemetrySample {
            flight_state: 200,
            error_flags: ErrorFlags(0x40 | error_flags::BARO),
            ..Default::default()
        };
        let decoded = codec.decode(&codec.encode(&sample).unwrap()).unwrap();
        assert_eq!(decoded.error_flags, ErrorFlags(error_flags::BARO));
        assert_eq!(codec.decode(&codec.encode(&TelemetrySample {
            error_flags: ErrorFlags(0x40),
            ..Default::default()
        }).unwrap()).unwrap().error_flags, ErrorFlags(0));
        // State codes are numeric and still saturate.
        assert_eq!(decoded.flight_state, 63);
    }

    #[test]
    fn underfilled_layout_pads_low_bits() {
        let layout = FrameLayout::new(
            WordLayout::new("w1", [FieldSpec::unsigned("a", 8)]),
            WordLayout::new("w2", [FieldSpec::signed("b", 4)]),
        );
        let codec = FrameCodec::new(layout).unwrap();
        let values = FieldValues::from([("a", 0xAB as f64), ("b", -2.0)]);
        let frame = codec.pack(&values).unwrap();
        assert_eq!(frame.words(), (0xAB00_0000_0000_0000, 0xE000_0000_0000_0000));
        assert_eq!(codec.unpack(&frame).unwrap(), values);
    }

    #[test]
    fn codec_reports_channels() {
        let codec = FrameCodec::standard().unwrap();
        assert!(codec.has_channel(channel::GYRO_Z));
        assert!(!codec.has_channel("pressure"));
        assert_eq!(codec.channel_names().count(), 15);
    }

    proptest! {
        #[test]
        fn in_range_samples_round_trip(
            flight_state in 0u8..64,
            flags in 0u8..64,
            ax in -3.2f64..3.1, ay in -3.2f64..3.1, az in -25.6f64..25.5,
            gx in -512i32..512, gy in -512i32..512, gz in -2048i32..2048,
            roll in -256i32..256, pitch in -256i32..256, yaw in -256i32..256,
            altitude in 0u32..4096,
            temperature in -128i32..128,
            voltage in 0.0f64..25.5,
        ) {
            let codec = FrameCodec::standard().unwrap();
            let sample = TelemetrySample {
                flight_state,
                error_flags: ErrorFlags(flags),
                accel: Axes::new(ax, ay, az),
                gyro: Axes::new(gx.into(), gy.into(), gz.into()),
                attitude: Attitude::new(roll.into(), pitch.into(), yaw.into()),
                altitude: altitude.into(),
                temperature: temperature.into(),
                voltage,
            };

            let decoded = codec.decode_bytes(&codec.encode(&sample).unwrap().to_bytes()).unwrap();

            prop_assert_eq!(decoded.flight_state, flight_state);
            prop_assert_eq!(decoded.error_flags, ErrorFlags(flags));
            prop_assert!((decoded.accel.x - ax).abs() <= 0.05 + 1e-9);
            prop_assert!((decoded.accel.y - ay).abs() <= 0.05 + 1e-9);
            prop_assert!((decoded.accel.z - az).abs() <= 0.05 + 1e-9);
            prop_assert_eq!(decoded.gyro, sample.gyro);
            prop_assert_eq!(decoded.attitude, sample.attitude);
            prop_assert_eq!(decoded.altitude, sample.altitude);
            prop_assert_eq!(decoded.temperature, sample.temperature);
            prop_assert!((decoded.voltage - voltage).abs() <= 0.05 + 1e-9);
        }
    }
}

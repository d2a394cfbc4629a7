//! Core types shared by the codec and the link layer.
//!
//! - [`Accumulator`] packs and unpacks bitfields in a single 64-bit word
//! - [`Frame`] is the 18-byte wire unit: sync byte, two big-endian words, sync byte
//! - [`TelemetrySample`] is the sensor reading carried by a frame
//! - [`ReceivedPacket`] and [`NodePair`] describe what the radio hands up

mod bitfield;
mod frame;
mod packet;
mod sample;
mod update_rate;

pub use bitfield::{Accumulator, WORD_BITS};
pub use frame::{FRAME_LEN, Frame, PAYLOAD_LEN, SYNC_END, SYNC_START};
pub use packet::{FLIGHT_NODE_ID, GROUND_NODE_ID, NodePair, ReceivedPacket};
pub use sample::{Attitude, Axes, ErrorFlags, FieldValues, TelemetrySample, channel, error_flags};
pub use update_rate::UpdateRate;

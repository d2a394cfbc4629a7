//! Resynchronising frame scanner for byte streams.

use std::collections::VecDeque;

use tracing::trace;

use crate::types::{FRAME_LEN, Frame, SYNC_END, SYNC_START};

/// Recovers frames from an unframed byte stream.
///
/// Bytes are buffered until a start marker is followed, seventeen bytes later,
/// by an end marker. A candidate that fails the end-marker check costs one
/// byte and the search restarts at the next byte, so a corrupted frame never
/// hides the frame behind it.
#[derive(Debug, Default)]
pub struct FrameScanner {
    buffer: VecDeque<u8>,
    discarded: u64,
}

impl FrameScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete frame, or `None` until more bytes arrive.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            // Skip to the next start marker.
            let start = self.buffer.iter().position(|&b| b == SYNC_START);
            let skip = start.unwrap_or(self.buffer.len());
            if skip > 0 {
                self.drop_front(skip);
            }
            if self.buffer.len() < FRAME_LEN {
                return None;
            }

            if self.buffer[FRAME_LEN - 1] == SYNC_END {
                let bytes: Vec<u8> = self.buffer.drain(..FRAME_LEN).collect();
                match Frame::from_bytes(&bytes) {
                    Ok(frame) => return Some(frame),
                    Err(_) => self.discarded += FRAME_LEN as u64,
                }
            } else {
                self.drop_front(1);
            }
        }
    }

    /// Bytes dropped while searching for frame boundaries.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn drop_front(&mut self, count: usize) {
        trace!("Scanner discarding {} byte(s)", count);
        self.buffer.drain(..count);
        self.discarded += count as u64;
    }
}

impl Iterator for FrameScanner {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.next_frame()
    }
}

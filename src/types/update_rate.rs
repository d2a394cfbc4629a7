//! Delivery rate for ground-station subscriptions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often a subscriber wants decoded samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every sample, as fast as frames arrive.
    #[default]
    Native,

    /// At most this many samples per second, latest wins.
    ///
    /// A rate at or above the downlink frame rate is the same as `Native`.
    Max(u32),
}

impl UpdateRate {
    /// Resolve the requested rate against the downlink frame rate.
    pub fn normalize(self, frame_hz: f64) -> Self {
        match self {
            UpdateRate::Native => UpdateRate::Native,
            UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if f64::from(hz) >= frame_hz => UpdateRate::Native,
            UpdateRate::Max(hz) => UpdateRate::Max(hz),
        }
    }

    /// Throttle period to apply, if any.
    pub fn throttle_interval(self, frame_hz: f64) -> Option<Duration> {
        match self.normalize(frame_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        }
    }

    /// Downlink frame rate implied by a transmit interval.
    pub fn frame_hz(tx_interval: Duration) -> f64 {
        if tx_interval.is_zero() { f64::INFINITY } else { 1.0 / tx_interval.as_secs_f64() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_at_or_above_frame_rate_are_native() {
        assert_eq!(UpdateRate::Max(1).normalize(1.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(10).normalize(1.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(0).normalize(1.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(2).normalize(20.0), UpdateRate::Max(2));
    }

    #[test]
    fn throttle_interval_follows_requested_rate() {
        assert_eq!(UpdateRate::Native.throttle_interval(50.0), None);
        assert_eq!(UpdateRate::Max(4).throttle_interval(50.0), Some(Duration::from_millis(250)));
    }

    #[test]
    fn frame_rate_from_interval() {
        assert_eq!(UpdateRate::frame_hz(Duration::from_millis(1000)), 1.0);
        assert_eq!(UpdateRate::frame_hz(Duration::from_millis(100)), 10.0);
        assert!(UpdateRate::frame_hz(Duration::ZERO).is_infinite());
    }
}

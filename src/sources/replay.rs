//! Replay source for recorded samples.

use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::source::SampleSource;
use crate::types::TelemetrySample;
use crate::{Result, TelemetryError};

/// Yields samples from memory or a YAML recording, in order.
///
/// A recording file is a YAML sequence of samples; any channel left out of an
/// entry reads as zero.
#[derive(Debug)]
pub struct ReplaySource {
    samples: VecDeque<TelemetrySample>,
    /// Pacing between samples, none for as fast as polled.
    interval: Option<Interval>,
    delivered: u64,
}

impl ReplaySource {
    /// Create an unpaced source over in-memory samples.
    pub fn new(samples: impl IntoIterator<Item = TelemetrySample>) -> Self {
        Self { samples: samples.into_iter().collect(), interval: None, delivered: 0 }
    }

    /// Load a recording from a YAML file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::config_error(path, format!("cannot read recording: {}", e)))?;
        let samples: Vec<TelemetrySample> = serde_yaml_ng::from_str(&text)
            .map_err(|e| TelemetryError::config_error(path, e.to_string()))?;

        info!("Opened recording {}: {} samples", path.display(), samples.len());
        Ok(Self::new(samples))
    }

    /// Pace delivery to one sample per `period`.
    pub fn paced(mut self, period: Duration) -> Self {
        if period.is_zero() {
            self.interval = None;
        } else {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(ticker);
        }
        debug!("Replay pacing set to {:?}", period);
        self
    }

    /// Samples not yet delivered.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait::async_trait]
impl SampleSource for ReplaySource {
    async fn next_sample(&mut self) -> Result<Option<TelemetrySample>> {
        if self.samples.is_empty() {
            debug!("Reached end of replay after {} samples", self.delivered);
            return Ok(None);
        }

        if let Some(ticker) = self.interval.as_mut() {
            ticker.tick().await;
        }

        let sample = self.samples.pop_front();
        if sample.is_some() {
            self.delivered += 1;
            trace!("Sample {} delivered, {} remaining", self.delivered, self.samples.len());
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn yields_samples_then_ends() {
        let mut source = ReplaySource::new([
            TelemetrySample { flight_state: 1, ..Default::default() },
            TelemetrySample { flight_state: 2, ..Default::default() },
        ]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_sample().await.unwrap().unwrap().flight_state, 1);
        assert_eq!(source.next_sample().await.unwrap().unwrap().flight_state, 2);
        assert!(source.next_sample().await.unwrap().is_none());
        assert!(source.next_sample().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spaces_samples() {
        let mut source =
            ReplaySource::new(vec![TelemetrySample::default(); 3]).paced(Duration::from_millis(100));
        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            source.next_sample().await.unwrap().unwrap();
        }
        // First tick is immediate.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn loads_yaml_recording() {
        let path = std::env::temp_dir().join(format!("tecs-replay-{}.yaml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "- flight_state: 1\n  altitude: 10.0\n- flight_state: 2\n  voltage: 12.5").unwrap();
        drop(file);

        let source = ReplaySource::open(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.samples[0].altitude, 10.0);
        assert_eq!(source.samples[1].voltage, 12.5);
    }

    #[test]
    fn missing_recording_is_config_error() {
        assert!(matches!(
            ReplaySource::open("/nonexistent/flight.yaml"),
            Err(TelemetryError::Config { .. })
        ));
    }
}

//! Sample source trait for the flight side.

use crate::Result;
use crate::types::TelemetrySample;

/// Supplies telemetry samples to the flight loop.
///
/// Sources hide the sensor hardware (or a recording standing in for it) and
/// handle their own timing: `next_sample` may wait for the next reading.
#[async_trait::async_trait]
pub trait SampleSource: Send + 'static {
    /// Get the next sample
    ///
    /// Returns:
    /// - `Ok(Some(sample))` - New reading available
    /// - `Ok(None)` - Source exhausted (normal termination)
    /// - `Err(e)` - Error occurred
    async fn next_sample(&mut self) -> Result<Option<TelemetrySample>>;
}

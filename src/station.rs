//! Ground station: the ground loop on a task, with sample subscriptions.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::driver::run_ground_loop;
use crate::link::{LinkSummary, LinkValidator, ValidationMode};
use crate::stream::ThrottleExt;
use crate::transport::FrameTransport;
use crate::types::{TelemetrySample, UpdateRate};
use crate::{Result, TelemetryError};

/// Running ground station.
///
/// Owns the receive task. Decoded samples are published on a watch channel,
/// so a slow subscriber only ever sees the most recent sample. Dropping the
/// station cancels the task.
pub struct GroundStation {
    samples: watch::Receiver<Option<Arc<TelemetrySample>>>,
    frame_hz: f64,
    cancel: CancellationToken,
    task: Option<JoinHandle<LinkSummary>>,
}

impl GroundStation {
    /// Start receiving on `transport`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the validator cannot be built.
    pub fn spawn<T>(transport: T, config: &LinkConfig, mode: ValidationMode) -> Result<Self>
    where
        T: FrameTransport,
    {
        config.validate()?;
        let validator = LinkValidator::new(config.nodes, mode)?;
        Ok(Self::spawn_with(transport, validator, UpdateRate::frame_hz(config.tx_interval())))
    }

    /// Start receiving with a prepared validator.
    pub fn spawn_with<T>(mut transport: T, mut validator: LinkValidator, frame_hz: f64) -> Self
    where
        T: FrameTransport,
    {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            run_ground_loop(&mut transport, &mut validator, &tx, &task_cancel).await
        });

        info!("Ground station started ({}Hz downlink)", frame_hz);
        Self { samples: rx, frame_hz, cancel, task: Some(task) }
    }

    /// Stream of decoded samples at the requested rate.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<TelemetrySample>> + 'static {
        let samples = WatchStream::from_changes(self.samples.clone()).filter_map(|opt| async move { opt });

        match rate.throttle_interval(self.frame_hz) {
            None => samples.boxed(),
            Some(period) => samples.throttle(period).boxed(),
        }
    }

    /// Most recent decoded sample.
    pub fn latest(&self) -> Option<Arc<TelemetrySample>> {
        self.samples.borrow().clone()
    }

    /// Downlink frame rate the station expects.
    pub fn frame_hz(&self) -> f64 {
        self.frame_hz
    }

    /// Stop receiving and return the session summary.
    pub async fn shutdown(mut self) -> Result<LinkSummary> {
        self.cancel.cancel();
        let task = self
            .task
            .take()
            .ok_or_else(|| TelemetryError::transport_failed("ground station already stopped"))?;
        let summary = task.await.map_err(|e| {
            warn!("Ground station task failed: {}", e);
            TelemetryError::transport_failed_with_source("ground station task failed", Box::new(e))
        })?;
        info!("Ground station stopped\n{}", summary);
        Ok(summary)
    }
}

impl Drop for GroundStation {
    fn drop(&mut self) {
        debug!("Dropping ground station");
        self.cancel.cancel();
    }
}

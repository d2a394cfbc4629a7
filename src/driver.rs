//! Control loops for both ends of the link.
//!
//! Each loop does one unit of work per iteration (one sample encoded and sent,
//! or one packet received and classified) and checks its cancellation token
//! between iterations. A blocking wait on the source or transport is raced
//! against the token, so cancellation never waits on the link, but work that
//! has started always finishes.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::codec::FrameCodec;
use crate::config::{LinkConfig, RetryPolicy};
use crate::link::{LinkSummary, LinkValidator};
use crate::source::SampleSource;
use crate::transport::FrameTransport;
use crate::types::TelemetrySample;
use crate::{Result, TelemetryError};

/// Consecutive source or receive errors tolerated before a loop gives up.
const MAX_ERRORS: u32 = 10;

/// What the flight loop did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightReport {
    pub samples_read: u64,
    pub frames_sent: u64,
    /// Sends that needed more than one attempt count once per extra attempt.
    pub send_retries: u64,
}

/// Send one packet under the retry policy.
///
/// Returns the number of retries used, or `None` if `cancel` fired while
/// backing off. Errors that are not retryable are returned at once; retryable
/// ones are retried with exponential backoff until the policy gives up with
/// [`TelemetryError::RetriesExhausted`].
pub async fn send_with_retry<T>(
    transport: &mut T,
    bytes: &[u8],
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Option<u32>>
where
    T: FrameTransport + ?Sized,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let err = match transport.send(bytes).await {
            Ok(()) => return Ok(Some(attempt - 1)),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        if attempt >= policy.max_attempts {
            error!("Send failed after {} attempts: {}", attempt, err);
            return Err(TelemetryError::RetriesExhausted { attempts: attempt, last: Box::new(err) });
        }

        let backoff = policy.backoff(attempt);
        warn!("Send failed ({}/{}): {}; retrying in {:?}", attempt, policy.max_attempts, err, backoff);
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Send abandoned after {} attempts, cancelled during backoff", attempt);
                return Ok(None);
            }
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}

/// Flight side: read samples, encode them and send one frame per transmit interval.
///
/// Runs until the source ends or `cancel` fires. A send that exhausts the retry
/// policy ends the loop with [`TelemetryError::RetriesExhausted`].
pub async fn run_flight_loop<S, T>(
    source: &mut S,
    transport: &mut T,
    codec: &FrameCodec,
    config: &LinkConfig,
    cancel: &CancellationToken,
) -> Result<FlightReport>
where
    S: SampleSource + ?Sized,
    T: FrameTransport + ?Sized,
{
    info!("Flight loop started ({:?} interval)", config.tx_interval());
    let mut report = FlightReport::default();
    let mut error_count = 0u32;
    let mut ticker = interval(config.tx_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if cancel.is_cancelled() {
            info!("Flight loop cancelled");
            break;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Flight loop cancelled while waiting for a sample");
                break;
            }
            result = source.next_sample() => result,
        };

        let sample = match result {
            Ok(Some(sample)) => {
                error_count = 0;
                report.samples_read += 1;
                sample
            }
            Ok(None) => {
                info!("Sample source ended after {} samples", report.samples_read);
                break;
            }
            Err(e) => {
                error_count += 1;
                error!("Sample source error ({}/{}): {}", error_count, MAX_ERRORS, e);
                if error_count >= MAX_ERRORS {
                    error!("Too many sample source errors, stopping flight loop");
                    return Err(e);
                }
                let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                tokio::time::sleep(backoff).await;
                continue;
            }
        };

        let frame = codec.encode(&sample)?;

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Flight loop cancelled while pacing");
                break;
            }
            _ = ticker.tick() => {}
        }

        let Some(retries) = send_with_retry(transport, &frame.to_bytes(), &config.retry, cancel).await?
        else {
            info!("Flight loop cancelled while retrying a send");
            break;
        };
        report.frames_sent += 1;
        report.send_retries += u64::from(retries);
        trace!("Frame {} sent: {:?}", report.frames_sent, frame);
    }

    info!(
        "Flight loop ended: {} samples read, {} frames sent, {} retries",
        report.samples_read, report.frames_sent, report.send_retries
    );
    Ok(report)
}

/// Link-test transmitter: send the configured test pattern every interval.
///
/// Stops after `limit` packets when given, or when `cancel` fires. Returns
/// the number of packets sent.
pub async fn run_link_test_tx<T>(
    transport: &mut T,
    config: &LinkConfig,
    cancel: &CancellationToken,
    limit: Option<u64>,
) -> Result<u64>
where
    T: FrameTransport + ?Sized,
{
    let payload = config.test_pattern.as_bytes();
    let mut ticker = interval(config.tx_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sent = 0u64;

    while limit.is_none_or(|limit| sent < limit) {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Link test cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        if send_with_retry(transport, payload, &config.retry, cancel).await?.is_none() {
            info!("Link test cancelled while retrying a send");
            break;
        }
        sent += 1;
        info!("SEND (#{}) [{} b]", sent, payload.len());
    }

    Ok(sent)
}

/// Ground side: receive, classify and publish until cancelled or the transport closes.
///
/// Good telemetry samples are published on `samples`. Receive timeouts are
/// logged and the loop keeps listening; other receive errors back off and end
/// the loop after too many in a row.
pub async fn run_ground_loop<T>(
    transport: &mut T,
    validator: &mut LinkValidator,
    samples: &watch::Sender<Option<Arc<TelemetrySample>>>,
    cancel: &CancellationToken,
) -> LinkSummary
where
    T: FrameTransport + ?Sized,
{
    info!("Ground loop started ({:?})", validator.mode());
    let mut error_count = 0u32;

    loop {
        if cancel.is_cancelled() {
            info!("Ground loop cancelled");
            break;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Ground loop cancelled during receive");
                break;
            }
            result = transport.receive() => result,
        };

        match result {
            Ok(Some(packet)) => {
                error_count = 0;
                let Some(seen) = validator.observe(&packet) else { continue };
                if let Some(sample) = seen.sample {
                    // send_replace keeps the latest value even with no subscribers.
                    samples.send_replace(Some(Arc::new(sample)));
                }
            }
            Ok(None) => {
                info!("Transport closed");
                break;
            }
            Err(TelemetryError::Timeout { duration }) => {
                debug!("No packet within {:?}", duration);
            }
            Err(e) => {
                error_count += 1;
                error!("Receive error ({}/{}): {}", error_count, MAX_ERRORS, e);
                if error_count >= MAX_ERRORS {
                    error!("Too many receive errors, stopping ground loop");
                    break;
                }
                let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                tokio::time::sleep(backoff).await;
            }
        }
    }

    let summary = validator.summary();
    info!(
        "Ground loop ended: {} good / {} total ({} malformed)",
        summary.counters.good, summary.counters.total, summary.malformed
    );
    summary
}

//! Error types for the telemetry link.
//!
//! Every fallible operation in the crate returns [`TelemetryError`]. Errors carry
//! structured context so callers can decide whether to drop a frame, retry a
//! transport operation, or abort startup.
//!
//! ## Error Categories
//!
//! - **Layout Errors**: a frame layout declares more bits than a 64-bit word holds,
//!   a field width outside `1..=64`, or inconsistent field names. These are fatal
//!   at codec construction.
//! - **Frame Errors**: a received frame has a wrong sync byte or wrong length.
//!   These are recoverable: the frame is dropped and the loop continues.
//! - **Transport Errors**: the send/receive primitive failed. These are retried
//!   under a [`RetryPolicy`](crate::RetryPolicy) until it gives up.
//! - **Configuration Errors**: a configuration file could not be read or holds
//!   inconsistent values.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use tecs::TelemetryError;
//!
//! let error = TelemetryError::transport_failed("radio did not acknowledge");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Field overflow in {word}: {declared_bits} bits declared, capacity is {capacity}")]
    FieldOverflow { word: String, declared_bits: u32, capacity: u32 },

    #[error("Invalid frame layout: {details}")]
    InvalidLayout { details: String },

    #[error("Invalid bit width {width} ({available} bits available)")]
    InvalidWidth { width: u32, available: u32 },

    #[error("Bad sync byte at offset {position}: expected {expected:#04x}, found {found:#04x}")]
    BadSync { position: usize, expected: u8, found: u8 },

    #[error("Bad frame length: expected {expected} bytes, found {found}")]
    BadLength { expected: usize, found: usize },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport gave up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<TelemetryError>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Configuration error in {path}: {details}")]
    Config { path: PathBuf, details: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Transport { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::FieldOverflow { .. } => false,
            TelemetryError::InvalidLayout { .. } => false,
            TelemetryError::InvalidWidth { .. } => false,
            TelemetryError::BadSync { .. } => false,
            TelemetryError::BadLength { .. } => false,
            TelemetryError::RetriesExhausted { .. } => false,
            TelemetryError::Config { .. } => false,
        }
    }

    /// Returns whether a receive loop should drop the offending frame and keep going.
    pub fn is_malformed_frame(&self) -> bool {
        matches!(self, TelemetryError::BadSync { .. } | TelemetryError::BadLength { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::FieldOverflow { .. } => vec![
                "Reduce field widths so each word sums to at most 64 bits",
                "Move trailing fields into another word",
            ],
            TelemetryError::InvalidLayout { .. } => vec![
                "Give every field a unique name or a distinct bit slice",
                "Keep split channels within 64 bits in total",
            ],
            TelemetryError::InvalidWidth { .. } => vec![
                "Use field widths between 1 and 64 bits",
                "Pop no more bits than were pushed",
            ],
            TelemetryError::BadSync { .. } => vec![
                "Check the byte stream is aligned on frame boundaries",
                "Feed raw streams through a frame scanner",
            ],
            TelemetryError::BadLength { .. } => vec![
                "Check the transport delivers whole frames",
                "Verify both ends use the same frame layout",
            ],
            TelemetryError::Transport { .. } => vec![
                "Check the radio or network link is up",
                "Verify the configured ground endpoint",
                "Retry the operation",
            ],
            TelemetryError::RetriesExhausted { .. } => vec![
                "Inspect the last transport error",
                "Increase the retry budget in the link configuration",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase the receive timeout",
                "Check the transmitter is running",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the configuration file exists and is valid YAML",
                "Compare values against the documented defaults",
            ],
        }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        TelemetryError::Config { path: path.into(), details: details.into() }
    }

    /// Helper constructor for layout consistency errors.
    pub fn invalid_layout(details: impl Into<String>) -> Self {
        TelemetryError::InvalidLayout { details: details.into() }
    }

    /// Helper constructor for layout overflow errors.
    pub fn field_overflow(word: impl Into<String>, declared_bits: u32, capacity: u32) -> Self {
        TelemetryError::FieldOverflow { word: word.into(), declared_bits, capacity }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Transport { reason: err.to_string(), source: Some(Box::new(err)) }
    }
}

//! Downlink validation.
//!
//! The [`LinkValidator`] watches received packets and sorts each one into one
//! of four outcomes by checking its addressing and its content. Counters are
//! cumulative for the session and reported as a [`LinkSummary`] at the end.

mod summary;
mod validator;

pub use summary::{LinkCounters, LinkSummary};
pub use validator::{DEFAULT_TEST_PATTERN, LinkOutcome, LinkValidator, Observation, ValidationMode};

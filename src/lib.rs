//! Telemetry frame codec and link validation for a rocket downlink.
//!
//! `tecs` packs flight telemetry into fixed 18-byte frames, carries them over a
//! radio or UDP link, and checks on the ground that what arrives is what was
//! sent.
//!
//! # Features
//!
//! - **Bit-exact frames**: two big-endian 64-bit words between `0x5E` and `0xD5`
//! - **Checked layouts**: a layout that oversubscribes a word is refused at startup
//! - **Link validation**: every packet classified good, bad address, bad data or garbage
//! - **Async loops**: flight and ground loops on tokio with cooperative cancellation
//!
//! # Example (encode and decode)
//!
//! ```rust
//! use tecs::{FrameCodec, TelemetrySample};
//!
//! # fn main() -> tecs::Result<()> {
//! let codec = FrameCodec::standard()?;
//! let sample = TelemetrySample { altitude: 812.0, voltage: 12.6, ..Default::default() };
//!
//! let wire = codec.encode(&sample)?.to_bytes();
//! let back = codec.decode_bytes(&wire)?;
//! assert_eq!(back.altitude, 812.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Example (ground station over UDP)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tecs::{GroundStation, LinkConfig, UdpTransport, UpdateRate, ValidationMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LinkConfig::load("link.yaml")?;
//!     let flight = std::net::SocketAddr::from(([127, 0, 0, 1], config.flight_port));
//!     let transport = UdpTransport::ground(&config, flight).await?;
//!
//!     let station = GroundStation::spawn(transport, &config, ValidationMode::Telemetry)?;
//!     let mut samples = station.subscribe(UpdateRate::Max(2));
//!     while let Some(sample) = samples.next().await {
//!         println!("{}\n", sample);
//!     }
//!
//!     println!("{}", station.shutdown().await?);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod driver;
mod error;
pub mod link;
pub mod source;
pub mod sources;
pub mod station;
pub mod stream;
pub mod transport;
pub mod transports;
pub mod types;

pub use error::*;
pub use types::*;

pub use codec::{FieldSpec, FrameCodec, FrameLayout, FrameScanner, WordLayout};
pub use config::{LinkConfig, RetryPolicy};
pub use driver::{FlightReport, run_flight_loop, run_ground_loop, run_link_test_tx, send_with_retry};
pub use link::{LinkCounters, LinkOutcome, LinkSummary, LinkValidator, Observation, ValidationMode};
pub use source::SampleSource;
pub use sources::ReplaySource;
pub use station::GroundStation;
pub use transport::FrameTransport;
pub use transports::{LoopbackTransport, UdpTransport};

//! Built-in transports.

pub mod loopback;
pub mod udp;

pub use loopback::{FaultInjector, LoopbackTransport};
pub use udp::UdpTransport;

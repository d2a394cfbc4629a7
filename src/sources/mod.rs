//! Built-in sample sources.

pub mod replay;

pub use replay::ReplaySource;

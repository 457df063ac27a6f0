//! Delivery of command streams to the printer.
//!
//! This module contains:
//! - Host link profiles (chunk size and pacing)
//! - The bounded retry policy used for each write
//! - The chunked writer itself

pub mod profile;
pub mod retry;
pub mod writer;

pub use profile::{HostClass, TransportProfile};
pub use retry::{Backoff, Exhausted, RetryPolicy};
pub use writer::{ChunkSink, TransportWriter};

//! Print session configuration.

use std::time::Duration;

use crate::transport::profile::{HostClass, TransportProfile};
use crate::transport::retry::RetryPolicy;
use crate::utils::CurrencyFormat;

/// Default maximum logo width in dots.
pub const DEFAULT_LOGO_WIDTH: u32 = 256;

/// Default pause between the receipt body and the cut.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Settings for a [`PrinterSession`](crate::printer::PrinterSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Chunk size and pacing of characteristic writes.
    pub transport: TransportProfile,
    /// Retry policy applied to each chunk.
    pub chunk_retry: RetryPolicy,
    /// Maximum logo width in dots.
    pub logo_width: u32,
    /// Pause after the body so the printer drains its buffer before cutting.
    pub settle_delay: Duration,
    /// How amounts are printed.
    pub currency: CurrencyFormat,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            transport: TransportProfile::default(),
            chunk_retry: RetryPolicy::CHUNK_WRITE,
            logo_width: DEFAULT_LOGO_WIDTH,
            settle_delay: DEFAULT_SETTLE_DELAY,
            currency: CurrencyFormat::default(),
        }
    }
}

impl PrinterConfig {
    /// Configuration tuned for a host class.
    pub fn for_host(host: HostClass) -> Self {
        Self::default().with_transport(TransportProfile::for_host(host))
    }

    /// Set the transport profile.
    pub fn with_transport(mut self, transport: TransportProfile) -> Self {
        self.transport = transport;
        self
    }

    /// Set the per-chunk retry policy.
    pub fn with_chunk_retry(mut self, retry: RetryPolicy) -> Self {
        self.chunk_retry = retry;
        self
    }

    /// Set the maximum logo width in dots.
    pub fn with_logo_width(mut self, width: u32) -> Self {
        self.logo_width = width;
        self
    }

    /// Set the pause before the cut.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the currency format.
    pub fn with_currency(mut self, currency: CurrencyFormat) -> Self {
        self.currency = currency;
        self
    }
}

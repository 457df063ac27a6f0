//! Link tuning profiles.
//!
//! BLE printers buffer very little, and how much a host can push per write
//! depends on its BLE stack. The host integration picks a [`HostClass`] once
//! at startup and the matching [`TransportProfile`] is injected into the
//! printer session.

use std::time::Duration;

/// Coarse classification of the host's BLE stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostClass {
    /// Mobile or embedded hosts with small negotiated MTUs.
    Constrained,
    /// Desktop hosts.
    #[default]
    Unconstrained,
}

/// Chunk size and pacing for writes to the printer characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportProfile {
    /// Maximum bytes per characteristic write.
    pub chunk_size: usize,
    /// Pause after each successful write.
    pub chunk_delay: Duration,
}

impl TransportProfile {
    /// Profile for constrained hosts: 50-byte writes, 60 ms apart.
    pub const CONSTRAINED: Self = Self {
        chunk_size: 50,
        chunk_delay: Duration::from_millis(60),
    };

    /// Profile for unconstrained hosts: 100-byte writes, 40 ms apart.
    pub const UNCONSTRAINED: Self = Self {
        chunk_size: 100,
        chunk_delay: Duration::from_millis(40),
    };

    /// Look up the profile for a host class.
    pub const fn for_host(host: HostClass) -> Self {
        match host {
            HostClass::Constrained => Self::CONSTRAINED,
            HostClass::Unconstrained => Self::UNCONSTRAINED,
        }
    }

    /// A custom profile. A chunk size of zero is raised to one byte.
    pub fn new(chunk_size: usize, chunk_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_delay,
        }
    }
}

impl Default for TransportProfile {
    fn default() -> Self {
        Self::for_host(HostClass::default())
    }
}

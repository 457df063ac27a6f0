//! Chunked writes to the printer characteristic.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::transport::profile::TransportProfile;
use crate::transport::retry::RetryPolicy;

/// Anything a payload slice can be written to.
///
/// Implemented by the active BLE link; tests substitute mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Write one slice. The slice never exceeds the profile's chunk size.
    async fn write_chunk(&self, chunk: &[u8]) -> Result<()>;
}

/// Splits payloads into slices and delivers them in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportWriter {
    profile: TransportProfile,
    retry: RetryPolicy,
}

impl TransportWriter {
    /// Create a writer with the given pacing and per-slice retry policy.
    pub fn new(profile: TransportProfile, retry: RetryPolicy) -> Self {
        Self { profile, retry }
    }

    /// The pacing profile.
    pub fn profile(&self) -> TransportProfile {
        self.profile
    }

    /// The per-slice retry policy.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Write `data` to `sink` in slices of at most `chunk_size` bytes.
    ///
    /// Each slice is retried independently. The writer pauses for
    /// `chunk_delay` after every slice except the last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChunkWriteFailed`] for the first slice whose retry
    /// budget is exhausted. Nothing after it is written.
    pub async fn write_chunked(&self, sink: &dyn ChunkSink, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let chunk_size = self.profile.chunk_size.max(1);
        let total = data.chunks(chunk_size).len();
        debug!(
            "Writing {} bytes in {} chunks of up to {} bytes",
            data.len(),
            total,
            chunk_size
        );

        for (index, slice) in data.chunks(chunk_size).enumerate() {
            let offset = index * chunk_size;

            self.retry
                .run("chunk write", |_| sink.write_chunk(slice))
                .await
                .map_err(|exhausted| Error::ChunkWriteFailed {
                    offset,
                    attempts: exhausted.attempts,
                    reason: exhausted.error.to_string(),
                })?;

            trace!("Wrote chunk {}/{} ({} bytes)", index + 1, total, slice.len());

            if index + 1 < total && !self.profile.chunk_delay.is_zero() {
                tokio::time::sleep(self.profile.chunk_delay).await;
            }
        }

        Ok(())
    }
}

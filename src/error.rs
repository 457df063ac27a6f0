//! Error types for the thermal-printer-ble crate.

use thiserror::Error;

/// Message fragments that identify a lost BLE link, regardless of which layer
/// reported the failure.
const LINK_LOST_SIGNATURES: &[&str] = &[
    "disconnected",
    "not connected",
    "connection lost",
    "gatt server",
    "device not found",
    "link lost",
];

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// The host has no usable BLE central (no adapter, or the stack refused to start).
    #[error("Bluetooth Low Energy is not supported on this platform")]
    UnsupportedPlatform,

    /// The device selector returned without choosing a printer.
    #[error("Printer selection was cancelled")]
    DeviceSelectionCancelled,

    /// Failed to open the link or discover a writable characteristic.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Operation requires a connection but no printer is connected.
    #[error("Printer not connected")]
    NotConnected,

    /// Another print job currently holds the printer.
    #[error("Printer is busy with another job")]
    PrinterBusy,

    /// A slice of a payload could not be written after exhausting its retries.
    #[error("Write failed at byte {offset} after {attempts} attempts: {reason}")]
    ChunkWriteFailed {
        /// Offset of the failing slice within the payload.
        offset: usize,
        /// Number of attempts made for the slice.
        attempts: u32,
        /// The last underlying failure.
        reason: String,
    },

    /// The logo image could not be loaded or decoded.
    #[error("Image decode error: {reason}")]
    ImageDecode {
        /// Description of what went wrong.
        reason: String,
    },

    /// The link to the printer dropped.
    #[error("Connection to printer lost")]
    LinkLost,

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },
}

impl Error {
    /// Whether this error means the BLE link is gone.
    ///
    /// Besides the explicit [`Error::LinkLost`] and [`Error::NotConnected`]
    /// variants, platform errors are matched on their message, since each BLE
    /// backend words a dropped GATT connection differently.
    pub fn is_link_lost(&self) -> bool {
        match self {
            Self::LinkLost | Self::NotConnected => true,
            Self::PrinterBusy | Self::DeviceSelectionCancelled | Self::UnsupportedPlatform => false,
            other => {
                let message = other.to_string().to_lowercase();
                LINK_LOST_SIGNATURES
                    .iter()
                    .any(|signature| message.contains(signature))
            }
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # thermal-printer-ble
//!
//! A cross-platform Rust driver for ESC/POS thermal receipt printers
//! reachable over Bluetooth Low Energy.
//!
//! ## Features
//!
//! - **Printer Discovery**: Scan for printers advertising a known print service
//! - **Silent Reconnect**: Relink to the last used printer without prompting
//! - **Receipt Layout**: 32 and 48 column receipts with totals and loyalty points
//! - **Logos**: Load a logo from a URL, `data:` URI or file and print it as a raster
//! - **Paced Delivery**: Chunked, retried writes sized for the host's BLE stack
//! - **Virtual Printing**: Render receipts as text when no printer is linked
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use thermal_printer_ble::{
//!     ConnectionManager, PrinterConfig, PrinterSession, Result, StoreConfig, StrongestSignal,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = Arc::new(ConnectionManager::with_system_adapter().await);
//!
//!     if manager.auto_connect().await.is_none() {
//!         let name = manager.connect(&StrongestSignal).await?;
//!         println!("Connected to {}", name);
//!     }
//!
//!     let session = PrinterSession::new(manager, PrinterConfig::default());
//!     session.print_test_receipt(&StoreConfig::new("Corner Cafe")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod imaging;
pub mod printer;
pub mod protocol;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use ble::connection::{CallbackHandle, ConnectionEvent, ConnectionManager, ConnectionState};
pub use ble::device::{DeviceSelector, DiscoveredPrinter, StrongestSignal};
pub use config::PrinterConfig;
pub use data::{LineItem, PaperWidth, PaymentMethod, PrintJob, StoreConfig, Transaction};
pub use error::{Error, Result};
pub use printer::{PrintOutcome, PrintStage, PrinterSession};
pub use protocol::{CommandStream, RasterImage};
pub use transport::{HostClass, TransportProfile};
pub use utils::CurrencyFormat;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<ConnectionManager>();
        let _ = std::any::TypeId::of::<PrinterSession>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<Transaction>();
        let _ = std::any::TypeId::of::<StoreConfig>();
        let _ = std::any::TypeId::of::<RasterImage>();
        let _ = std::any::TypeId::of::<PrinterConfig>();
    }
}

//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy side of the driver:
//! discovering printers, holding the link and picking the characteristic
//! print data is written to.

pub mod characteristics;
pub mod connection;
pub mod device;
pub mod platform;
pub mod scanner;
pub mod uuids;

pub use characteristics::{select_writable, CharacteristicInfo, WritableCharacteristic, WriteMode};
pub use connection::{
    ActiveLink, CallbackHandle, ConnectionEvent, ConnectionManager, ConnectionState, JobGuard,
};
pub use device::{DeviceSelector, DiscoveredPrinter, PrinterCentral, PrinterPeripheral, StrongestSignal};
pub use platform::BtlePeripheral;
pub use scanner::BleScanner;
pub use uuids::*;

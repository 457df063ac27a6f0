//! BLE Service and Characteristic UUIDs.
//!
//! Contains the UUIDs under which common ESC/POS receipt printers expose
//! their print channel.

use uuid::Uuid;

// Generic printer service (16-bit 0x18F0)
/// Printer service UUID advertised by most BLE receipt printers.
pub const PRINTER_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_18f0_0000_1000_8000_00805f9b34fb);
/// Print data characteristic within [`PRINTER_SERVICE_UUID`].
pub const PRINTER_WRITE_UUID: Uuid = Uuid::from_u128(0x0000_2af1_0000_1000_8000_00805f9b34fb);

// Vendor services seen on cheaper printers
/// Vendor service (16-bit 0xFF00).
pub const VENDOR_FF00_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_ff00_0000_1000_8000_00805f9b34fb);
/// Write characteristic within [`VENDOR_FF00_SERVICE_UUID`].
pub const VENDOR_FF02_WRITE_UUID: Uuid = Uuid::from_u128(0x0000_ff02_0000_1000_8000_00805f9b34fb);
/// 128-bit vendor print service.
pub const VENDOR_E781_SERVICE_UUID: Uuid =
    Uuid::from_u128(0xe781_0a71_73ae_499d_8c15_faa9aef0c3f2);

/// Services scanned for by default, most common first.
pub const PRINTER_SERVICES: [Uuid; 3] = [
    PRINTER_SERVICE_UUID,
    VENDOR_FF00_SERVICE_UUID,
    VENDOR_E781_SERVICE_UUID,
];

/// Check if a service UUID is one printers advertise.
pub fn is_printer_service(uuid: &Uuid) -> bool {
    PRINTER_SERVICES.contains(uuid)
}

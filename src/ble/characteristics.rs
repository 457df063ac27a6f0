//! GATT characteristic selection.
//!
//! A printer exposes one or more characteristics; exactly one is chosen to
//! carry print data for the lifetime of a link.

use tracing::{debug, warn};
use uuid::Uuid;

/// How a characteristic accepts writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// The peripheral acknowledges each write.
    WithResponse,
    /// Fire-and-forget writes.
    WithoutResponse,
}

/// A characteristic as enumerated from the peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicInfo {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// UUID of the service that owns it.
    pub service_uuid: Uuid,
    /// Supports write-with-response.
    pub write: bool,
    /// Supports write-without-response.
    pub write_without_response: bool,
}

impl CharacteristicInfo {
    /// Whether the characteristic is flagged writable at all.
    pub fn is_writable(&self) -> bool {
        self.write || self.write_without_response
    }
}

/// The characteristic print data is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritableCharacteristic {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// UUID of the owning service.
    pub service_uuid: Uuid,
    /// Write type to use.
    pub mode: WriteMode,
    /// The characteristic was not flagged writable and was picked as a
    /// last resort.
    pub degraded: bool,
}

/// Pick the characteristic to print through.
///
/// Preference order: the first flagged write-with-response, then the first
/// flagged write-without-response, then the first enumerated characteristic.
/// Returns `None` only when `characteristics` is empty.
pub fn select_writable(characteristics: &[CharacteristicInfo]) -> Option<WritableCharacteristic> {
    let pick = |info: &CharacteristicInfo, mode, degraded| WritableCharacteristic {
        uuid: info.uuid,
        service_uuid: info.service_uuid,
        mode,
        degraded,
    };

    if let Some(info) = characteristics.iter().find(|c| c.write) {
        debug!("Using characteristic {} (write with response)", info.uuid);
        return Some(pick(info, WriteMode::WithResponse, false));
    }

    if let Some(info) = characteristics.iter().find(|c| c.write_without_response) {
        debug!("Using characteristic {} (write without response)", info.uuid);
        return Some(pick(info, WriteMode::WithoutResponse, false));
    }

    let first = characteristics.first()?;
    warn!(
        "No characteristic is flagged writable; falling back to {}",
        first.uuid
    );
    Some(pick(first, WriteMode::WithResponse, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::{PRINTER_SERVICE_UUID, PRINTER_WRITE_UUID};

    fn info(n: u128, write: bool, without: bool) -> CharacteristicInfo {
        CharacteristicInfo {
            uuid: Uuid::from_u128(n),
            service_uuid: PRINTER_SERVICE_UUID,
            write,
            write_without_response: without,
        }
    }

    #[test]
    fn test_prefers_write_with_response() {
        let chars = [info(1, false, true), info(2, true, true), info(3, true, false)];
        let selected = select_writable(&chars).unwrap();
        assert_eq!(selected.uuid, Uuid::from_u128(2));
        assert_eq!(selected.mode, WriteMode::WithResponse);
        assert!(!selected.degraded);
    }

    #[test]
    fn test_falls_back_to_without_response() {
        let chars = [info(1, false, false), info(2, false, true)];
        let selected = select_writable(&chars).unwrap();
        assert_eq!(selected.uuid, Uuid::from_u128(2));
        assert_eq!(selected.mode, WriteMode::WithoutResponse);
    }

    #[test]
    fn test_degraded_first_enumerated() {
        let chars = [
            CharacteristicInfo {
                uuid: PRINTER_WRITE_UUID,
                service_uuid: PRINTER_SERVICE_UUID,
                write: false,
                write_without_response: false,
            },
            info(9, false, false),
        ];
        let selected = select_writable(&chars).unwrap();
        assert_eq!(selected.uuid, PRINTER_WRITE_UUID);
        assert!(selected.degraded);
    }

    #[test]
    fn test_empty() {
        assert!(select_writable(&[]).is_none());
    }
}

//! btleplug-backed printer peripheral.

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Peripheral as _, WriteType,
};
use btleplug::platform::{Adapter, Peripheral};
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, trace};

use crate::ble::characteristics::{CharacteristicInfo, WritableCharacteristic, WriteMode};
use crate::ble::device::PrinterPeripheral;
use crate::ble::uuids::is_printer_service;
use crate::error::{Error, Result};

/// A printer reachable through a btleplug adapter.
#[derive(Debug, Clone)]
pub struct BtlePeripheral {
    peripheral: Peripheral,
    adapter: Adapter,
    name: Option<String>,
}

impl BtlePeripheral {
    /// Wrap a btleplug peripheral found on `adapter`.
    pub fn new(peripheral: Peripheral, adapter: Adapter, name: Option<String>) -> Self {
        Self {
            peripheral,
            adapter,
            name,
        }
    }

    /// The underlying btleplug peripheral.
    pub fn inner(&self) -> &Peripheral {
        &self.peripheral
    }

    fn find_characteristic(&self, target: &WritableCharacteristic) -> Result<Characteristic> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == target.uuid && c.service_uuid == target.service_uuid)
            .ok_or_else(|| Error::ConnectionFailed {
                reason: format!("characteristic {} is gone; printer not connected", target.uuid),
            })
    }
}

#[async_trait]
impl PrinterPeripheral for BtlePeripheral {
    fn id(&self) -> String {
        self.peripheral.id().to_string()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn connect(&self) -> Result<()> {
        if self.peripheral.is_connected().await.unwrap_or(false) {
            debug!("Peripheral already connected at BLE level");
            return Ok(());
        }
        self.peripheral.connect().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn characteristics(&self) -> Result<Vec<CharacteristicInfo>> {
        self.peripheral.discover_services().await?;

        let mut printer_first = Vec::new();
        let mut others = Vec::new();

        for service in self.peripheral.services() {
            for characteristic in service.characteristics {
                debug!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid, service.uuid
                );
                let info = CharacteristicInfo {
                    uuid: characteristic.uuid,
                    service_uuid: service.uuid,
                    write: characteristic.properties.contains(CharPropFlags::WRITE),
                    write_without_response: characteristic
                        .properties
                        .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
                };
                if is_printer_service(&service.uuid) {
                    printer_first.push(info);
                } else {
                    others.push(info);
                }
            }
        }

        printer_first.extend(others);
        Ok(printer_first)
    }

    async fn write(&self, characteristic: &WritableCharacteristic, data: &[u8]) -> Result<()> {
        let target = self.find_characteristic(characteristic)?;
        let write_type = match characteristic.mode {
            WriteMode::WithResponse => WriteType::WithResponse,
            WriteMode::WithoutResponse => WriteType::WithoutResponse,
        };

        self.peripheral.write(&target, data, write_type).await?;
        trace!("Wrote {} bytes to {}", data.len(), characteristic.uuid);
        Ok(())
    }

    async fn disconnect_events(&self) -> Result<BoxStream<'static, ()>> {
        let events = self.adapter.events().await?;
        let id = self.peripheral.id();

        let stream = events.filter_map(move |event| {
            let hit = matches!(event, CentralEvent::DeviceDisconnected(ref d) if *d == id);
            futures::future::ready(hit.then_some(()))
        });
        Ok(stream.boxed())
    }
}

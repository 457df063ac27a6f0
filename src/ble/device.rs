//! Platform seam for the BLE central and peripherals.
//!
//! The connection manager only talks to these traits. The btleplug-backed
//! implementations live in [`crate::ble::scanner`] and
//! [`crate::ble::platform`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::ble::characteristics::{CharacteristicInfo, WritableCharacteristic};
use crate::error::Result;

/// One BLE peripheral that may be a printer.
#[async_trait]
pub trait PrinterPeripheral: Send + Sync {
    /// Stable identifier of the peripheral on this host.
    fn id(&self) -> String;

    /// Advertised name, if known.
    fn name(&self) -> Option<String>;

    /// Open the link.
    async fn connect(&self) -> Result<()>;

    /// Close the link.
    async fn disconnect(&self) -> Result<()>;

    /// Live link state as reported by the BLE stack.
    async fn is_connected(&self) -> bool;

    /// Discover services and list every characteristic.
    async fn characteristics(&self) -> Result<Vec<CharacteristicInfo>>;

    /// Write one payload to a characteristic.
    async fn write(&self, characteristic: &WritableCharacteristic, data: &[u8]) -> Result<()>;

    /// Stream that yields once for every disconnect of this peripheral.
    async fn disconnect_events(&self) -> Result<BoxStream<'static, ()>>;
}

/// The host's BLE central role.
#[async_trait]
pub trait PrinterCentral: Send + Sync {
    /// Scan for `window` and return peripherals advertising any of `services`.
    async fn discover(&self, services: &[Uuid], window: Duration) -> Result<Vec<DiscoveredPrinter>>;

    /// Peripherals the host already knows about that advertise any of
    /// `services`, without prompting.
    async fn authorized_devices(&self, services: &[Uuid]) -> Result<Vec<DiscoveredPrinter>>;
}

/// A candidate printer found by the central.
#[derive(Clone)]
pub struct DiscoveredPrinter {
    /// The peripheral handle.
    pub peripheral: Arc<dyn PrinterPeripheral>,
    /// Advertised name.
    pub name: Option<String>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

impl DiscoveredPrinter {
    /// Wrap a peripheral, taking its name from the handle.
    pub fn new(peripheral: Arc<dyn PrinterPeripheral>) -> Self {
        let name = peripheral.name();
        Self {
            peripheral,
            name,
            rssi: None,
        }
    }

    /// Set the signal strength.
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Peripheral identifier.
    pub fn id(&self) -> String {
        self.peripheral.id()
    }

    /// Name to show for this printer, falling back to its identifier.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id())
    }
}

impl fmt::Debug for DiscoveredPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredPrinter")
            .field("id", &self.id())
            .field("name", &self.name)
            .field("rssi", &self.rssi)
            .finish()
    }
}

/// Chooses one printer among the candidates of a scan.
///
/// Stands in for the user-facing picker. Returning `None` cancels the
/// connection attempt.
#[async_trait]
pub trait DeviceSelector: Send + Sync {
    /// Index into `candidates` of the chosen printer.
    async fn select(&self, candidates: &[DiscoveredPrinter]) -> Option<usize>;
}

#[async_trait]
impl<F> DeviceSelector for F
where
    F: Fn(&[DiscoveredPrinter]) -> Option<usize> + Send + Sync,
{
    async fn select(&self, candidates: &[DiscoveredPrinter]) -> Option<usize> {
        self(candidates)
    }
}

/// Picks the candidate with the strongest signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrongestSignal;

#[async_trait]
impl DeviceSelector for StrongestSignal {
    async fn select(&self, candidates: &[DiscoveredPrinter]) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .max_by_key(|(index, c)| (c.rssi.unwrap_or(i16::MIN), std::cmp::Reverse(*index)))
            .map(|(index, _)| index)
    }
}

//! BLE scanning functionality.
//!
//! Provides the btleplug central used to discover printers.

use async_trait::async_trait;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::device::{DiscoveredPrinter, PrinterCentral};
use crate::ble::platform::BtlePeripheral;
use crate::error::{Error, Result};

/// BLE scanner for discovering printers.
#[derive(Debug, Clone)]
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a scanner on the first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::UnsupportedPlatform)?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|_e| Error::UnsupportedPlatform)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::UnsupportedPlatform)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Create a scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Peripherals known to the adapter that advertise one of `services`.
    async fn printers(&self, services: &[Uuid]) -> Result<Vec<DiscoveredPrinter>> {
        let mut printers = Vec::new();

        for peripheral in self.adapter.peripherals().await? {
            let properties = match peripheral.properties().await {
                Ok(Some(p)) => p,
                _ => continue,
            };

            if !properties.services.iter().any(|s| services.contains(s)) {
                trace!("Skipping non-printer {:?}", properties.local_name);
                continue;
            }

            debug!(
                "Printer candidate: {:?} ({}) rssi {:?}",
                properties.local_name,
                peripheral.id(),
                properties.rssi
            );

            let name = properties.local_name.clone();
            printers.push(DiscoveredPrinter {
                peripheral: Arc::new(BtlePeripheral::new(
                    peripheral,
                    self.adapter.clone(),
                    name.clone(),
                )),
                name,
                rssi: properties.rssi,
            });
        }

        Ok(printers)
    }
}

#[async_trait]
impl PrinterCentral for BleScanner {
    async fn discover(&self, services: &[Uuid], window: Duration) -> Result<Vec<DiscoveredPrinter>> {
        info!("Starting BLE scan for printers");

        self.adapter
            .start_scan(ScanFilter {
                services: services.to_vec(),
            })
            .await?;

        tokio::time::sleep(window).await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        self.printers(services).await
    }

    async fn authorized_devices(&self, services: &[Uuid]) -> Result<Vec<DiscoveredPrinter>> {
        self.printers(services).await
    }
}

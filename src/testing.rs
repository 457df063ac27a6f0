//! In-memory BLE fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::ble::characteristics::{CharacteristicInfo, WritableCharacteristic};
use crate::ble::device::{DiscoveredPrinter, PrinterCentral, PrinterPeripheral};
use crate::ble::uuids::{PRINTER_SERVICE_UUID, PRINTER_WRITE_UUID};
use crate::error::{Error, Result};

/// Errors returned once `after` writes have succeeded.
#[derive(Default)]
struct WriteFailures {
    after: usize,
    errors: VecDeque<Error>,
}

/// A peripheral that records every write.
pub struct FakePeripheral {
    id: String,
    name: Option<String>,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    fail_connect: AtomicBool,
    characteristics: Vec<CharacteristicInfo>,
    writes: Mutex<Vec<Vec<u8>>>,
    write_failures: Mutex<WriteFailures>,
    disconnect_tx: broadcast::Sender<()>,
}

impl FakePeripheral {
    /// A printer named `Printer {id}` with one write-with-response characteristic.
    pub fn new(id: &str) -> Self {
        let (disconnect_tx, _) = broadcast::channel(4);
        Self {
            id: id.to_string(),
            name: Some(format!("Printer {}", id)),
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            characteristics: vec![CharacteristicInfo {
                uuid: PRINTER_WRITE_UUID,
                service_uuid: PRINTER_SERVICE_UUID,
                write: true,
                write_without_response: true,
            }],
            writes: Mutex::new(Vec::new()),
            write_failures: Mutex::new(WriteFailures::default()),
            disconnect_tx,
        }
    }

    pub fn with_characteristics(mut self, characteristics: Vec<CharacteristicInfo>) -> Self {
        self.characteristics = characteristics;
        self
    }

    pub fn failing_connect(self) -> Self {
        self.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    /// Queue errors returned by the next writes, in order.
    pub fn fail_next_writes(&self, errors: impl IntoIterator<Item = Error>) {
        let index = self.writes.lock().len();
        self.fail_write_at(index, errors);
    }

    /// Queue errors returned once `index` writes have succeeded.
    ///
    /// Failed attempts are not recorded, so retries of the same chunk keep
    /// drawing from the queue until it is empty.
    pub fn fail_write_at(&self, index: usize, errors: impl IntoIterator<Item = Error>) {
        let mut failures = self.write_failures.lock();
        failures.after = index;
        failures.errors = errors.into_iter().collect();
    }

    /// Drop the link as if the printer powered off.
    pub fn simulate_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.disconnect_tx.send(());
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.writes.lock().concat()
    }
}

#[async_trait]
impl PrinterPeripheral for FakePeripheral {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn connect(&self) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailed {
                reason: "peripheral refused the connection".to_string(),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn characteristics(&self) -> Result<Vec<CharacteristicInfo>> {
        Ok(self.characteristics.clone())
    }

    async fn write(&self, _characteristic: &WritableCharacteristic, data: &[u8]) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailed {
                reason: "GATT Server is disconnected".to_string(),
            });
        }
        let mut writes = self.writes.lock();
        let mut failures = self.write_failures.lock();
        if writes.len() >= failures.after {
            if let Some(error) = failures.errors.pop_front() {
                return Err(error);
            }
        }
        writes.push(data.to_vec());
        Ok(())
    }

    async fn disconnect_events(&self) -> Result<BoxStream<'static, ()>> {
        let rx = self.disconnect_tx.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.ok().map(|()| ((), rx))
        });
        Ok(stream.boxed())
    }
}

/// A central returning a fixed set of printers.
#[derive(Default)]
pub struct FakeCentral {
    discovered: Vec<Arc<FakePeripheral>>,
    authorized: Vec<Arc<FakePeripheral>>,
    scans: AtomicUsize,
}

impl FakeCentral {
    pub fn with_printers(printers: Vec<Arc<FakePeripheral>>) -> Self {
        Self {
            discovered: printers.clone(),
            authorized: printers,
            scans: AtomicUsize::new(0),
        }
    }

    pub fn with_authorized(mut self, printers: Vec<Arc<FakePeripheral>>) -> Self {
        self.authorized = printers;
        self
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

fn as_candidates(printers: &[Arc<FakePeripheral>]) -> Vec<DiscoveredPrinter> {
    printers
        .iter()
        .map(|p| DiscoveredPrinter::new(p.clone() as Arc<dyn PrinterPeripheral>))
        .collect()
}

#[async_trait]
impl PrinterCentral for FakeCentral {
    async fn discover(&self, _services: &[Uuid], _window: Duration) -> Result<Vec<DiscoveredPrinter>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(as_candidates(&self.discovered))
    }

    async fn authorized_devices(&self, _services: &[Uuid]) -> Result<Vec<DiscoveredPrinter>> {
        Ok(as_candidates(&self.authorized))
    }
}

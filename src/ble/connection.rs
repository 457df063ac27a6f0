//! BLE connection management.
//!
//! Discovers, connects to and tracks exactly one printer. The active link
//! pairs the peripheral with the characteristic print data is written to;
//! both are dropped together when the link goes away.

use async_trait::async_trait;
use futures::stream::StreamExt;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::ble::characteristics::{select_writable, WritableCharacteristic};
use crate::ble::device::{DeviceSelector, DiscoveredPrinter, PrinterCentral, PrinterPeripheral};
use crate::ble::uuids::PRINTER_SERVICES;
use crate::error::{Error, Result};
use crate::transport::retry::RetryPolicy;
use crate::transport::writer::ChunkSink;

/// Default scan duration for [`ConnectionManager::connect`].
pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(5);

/// Connection state for the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No printer linked.
    #[default]
    Disconnected,
    /// Scanning for or opening a link.
    Connecting,
    /// A printer is linked.
    Connected,
    /// Tearing the link down.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Event for connection state changes.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    /// Identifier of the peripheral, empty when none was involved.
    pub identifier: String,
    /// The new connection state.
    pub state: ConnectionState,
    /// The peripheral dropped the link on its own.
    pub link_lost: bool,
}

/// Handle for a registered callback.
///
/// The callback stays registered until the handle is dropped or
/// [`unregister`](Self::unregister) is called.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

impl std::fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandle").field("id", &self.id).finish()
    }
}

/// A linked printer and the characteristic selected for writes.
pub struct ActiveLink {
    peripheral: Arc<dyn PrinterPeripheral>,
    characteristic: WritableCharacteristic,
}

impl ActiveLink {
    /// The peripheral handle.
    pub fn peripheral(&self) -> &Arc<dyn PrinterPeripheral> {
        &self.peripheral
    }

    /// The characteristic print data goes to.
    pub fn characteristic(&self) -> &WritableCharacteristic {
        &self.characteristic
    }

    /// Identifier of the linked peripheral.
    pub fn id(&self) -> String {
        self.peripheral.id()
    }
}

impl std::fmt::Debug for ActiveLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveLink")
            .field("id", &self.id())
            .field("characteristic", &self.characteristic)
            .finish()
    }
}

#[async_trait]
impl ChunkSink for ActiveLink {
    async fn write_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.peripheral.write(&self.characteristic, chunk).await
    }
}

/// Exclusive claim on the link for one print job.
///
/// Released when dropped.
pub struct JobGuard<'a> {
    active: &'a AtomicBool,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for JobGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobGuard").finish()
    }
}

/// State shared with the disconnect watcher task.
struct Shared {
    state: RwLock<ConnectionState>,
    link: RwLock<Option<Arc<ActiveLink>>>,
    device_name: RwLock<Option<String>>,
    last_device_id: RwLock<Option<String>>,
    event_tx: broadcast::Sender<ConnectionEvent>,
}

impl Shared {
    fn set_state(&self, new_state: ConnectionState, identifier: &str, link_lost: bool) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };

        if old_state != new_state || link_lost {
            debug!("Connection state changed: {} -> {}", old_state, new_state);

            let _ = self.event_tx.send(ConnectionEvent {
                identifier: identifier.to_string(),
                state: new_state,
                link_lost,
            });
        }
    }

    /// Drop the link if it still belongs to `identifier`.
    fn link_lost(&self, identifier: &str) {
        let cleared = {
            let mut link = self.link.write();
            match link.as_ref() {
                Some(active) if active.id() == identifier => {
                    *link = None;
                    true
                }
                _ => false,
            }
        };

        if cleared {
            warn!("Printer {} disconnected", identifier);
            *self.device_name.write() = None;
            self.set_state(ConnectionState::Disconnected, identifier, true);
        }
    }
}

/// Manages the link to a single printer.
pub struct ConnectionManager {
    /// The host's BLE central, `None` when the platform has none.
    central: Option<Arc<dyn PrinterCentral>>,
    shared: Arc<Shared>,
    /// Disconnect watcher for the active link.
    watcher: Mutex<Option<JoinHandle<()>>>,
    /// Serializes connect attempts.
    connect_lock: tokio::sync::Mutex<()>,
    services: Vec<Uuid>,
    scan_window: Duration,
    connect_retry: RetryPolicy,
    callback_counter: AtomicU64,
    /// Set while a print job holds the link.
    job_active: AtomicBool,
}

impl ConnectionManager {
    /// Create a connection manager on top of a BLE central.
    pub fn new(central: Arc<dyn PrinterCentral>) -> Self {
        Self::with_central(Some(central))
    }

    /// Create a connection manager for a host without BLE.
    ///
    /// Every connect attempt fails with [`Error::UnsupportedPlatform`].
    pub fn unsupported() -> Self {
        Self::with_central(None)
    }

    /// Create a connection manager on the system's first Bluetooth adapter.
    ///
    /// Falls back to [`unsupported`](Self::unsupported) if no adapter can be
    /// opened, so the session can still render virtual receipts.
    pub async fn with_system_adapter() -> Self {
        match crate::ble::scanner::BleScanner::new().await {
            Ok(scanner) => Self::new(Arc::new(scanner)),
            Err(e) => {
                warn!("Bluetooth unavailable: {}", e);
                Self::unsupported()
            }
        }
    }

    fn with_central(central: Option<Arc<dyn PrinterCentral>>) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            central,
            shared: Arc::new(Shared {
                state: RwLock::new(ConnectionState::Disconnected),
                link: RwLock::new(None),
                device_name: RwLock::new(None),
                last_device_id: RwLock::new(None),
                event_tx,
            }),
            watcher: Mutex::new(None),
            connect_lock: tokio::sync::Mutex::new(()),
            services: PRINTER_SERVICES.to_vec(),
            scan_window: DEFAULT_SCAN_WINDOW,
            connect_retry: RetryPolicy::once(),
            callback_counter: AtomicU64::new(0),
            job_active: AtomicBool::new(false),
        }
    }

    /// Set the service UUIDs that identify a printer.
    pub fn with_services(mut self, services: Vec<Uuid>) -> Self {
        self.services = services;
        self
    }

    /// Set how long [`connect`](Self::connect) scans.
    pub fn with_scan_window(mut self, window: Duration) -> Self {
        self.scan_window = window;
        self
    }

    /// Set the retry policy for opening a link.
    pub fn with_connect_retry(mut self, policy: RetryPolicy) -> Self {
        self.connect_retry = policy;
        self
    }

    /// Remember a device to prefer in [`auto_connect`](Self::auto_connect).
    pub fn with_last_device(self, identifier: impl Into<String>) -> Self {
        *self.shared.last_device_id.write() = Some(identifier.into());
        self
    }

    /// Claim the link for a print job.
    ///
    /// Every session sharing this manager goes through the same flag, so at
    /// most one job writes to the printer at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrinterBusy`] while another guard is alive.
    pub fn try_begin_job(&self) -> Result<JobGuard<'_>> {
        self.job_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::PrinterBusy)?;
        Ok(JobGuard {
            active: &self.job_active,
        })
    }

    /// Check if a print job holds the link.
    pub fn is_job_active(&self) -> bool {
        self.job_active.load(Ordering::Acquire)
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Name of the linked printer.
    pub fn device_name(&self) -> Option<String> {
        self.shared.device_name.read().clone()
    }

    /// Identifier of the most recently linked printer.
    pub fn last_device_id(&self) -> Option<String> {
        self.shared.last_device_id.read().clone()
    }

    /// The active link, if any. Does not check the live state.
    pub fn active_link(&self) -> Option<Arc<ActiveLink>> {
        self.shared.link.read().clone()
    }

    /// Whether a link exists and the peripheral reports it connected.
    pub async fn is_connected(&self) -> bool {
        let link = self.active_link();
        match link {
            Some(link) => link.peripheral.is_connected().await,
            None => false,
        }
    }

    /// Scan for printers, let `selector` pick one and connect to it.
    ///
    /// Any existing link is closed first. Returns the printer's name.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPlatform`] if the host has no BLE central
    /// - [`Error::DeviceSelectionCancelled`] if the selector picks nothing
    /// - [`Error::ConnectionFailed`] if no printer is found or the link
    ///   cannot be opened
    pub async fn connect(&self, selector: &dyn DeviceSelector) -> Result<String> {
        let central = self.central.clone().ok_or(Error::UnsupportedPlatform)?;
        let _guard = self.connect_lock.lock().await;

        if self.active_link().is_some() {
            debug!("Closing existing link before connecting");
            if let Err(e) = self.disconnect().await {
                warn!("Failed to close previous link: {}", e);
            }
        }

        self.shared.set_state(ConnectionState::Connecting, "", false);
        info!("Scanning for printers ({:?})", self.scan_window);

        let result = async {
            let candidates = central
                .discover(&self.services, self.scan_window)
                .await
                .map_err(|e| match e {
                    Error::UnsupportedPlatform => e,
                    other => Error::ConnectionFailed {
                        reason: format!("scan failed: {}", other),
                    },
                })?;

            debug!("Found {} candidate printers", candidates.len());
            if candidates.is_empty() {
                return Err(Error::ConnectionFailed {
                    reason: "no printer found".to_string(),
                });
            }

            let index = selector
                .select(&candidates)
                .await
                .ok_or(Error::DeviceSelectionCancelled)?;
            let printer = candidates
                .get(index)
                .cloned()
                .ok_or(Error::DeviceSelectionCancelled)?;

            self.establish(printer).await
        }
        .await;

        if result.is_err() {
            self.shared.set_state(ConnectionState::Disconnected, "", false);
        }
        result
    }

    /// Silently reconnect to a printer the host already knows.
    ///
    /// The last linked printer is preferred. Never prompts and never fails;
    /// returns the printer's name on success.
    pub async fn auto_connect(&self) -> Option<String> {
        let Some(central) = self.central.clone() else {
            debug!("Auto-connect skipped: no BLE central");
            return None;
        };
        let _guard = self.connect_lock.lock().await;

        if self.is_connected().await {
            return self.device_name();
        }

        let known = match central.authorized_devices(&self.services).await {
            Ok(known) => known,
            Err(e) => {
                debug!("Auto-connect failed to list known printers: {}", e);
                return None;
            }
        };

        let last = self.last_device_id();
        let printer = known
            .iter()
            .find(|p| last.as_deref() == Some(p.id().as_str()))
            .or_else(|| known.first())
            .cloned();

        let Some(printer) = printer else {
            debug!("Auto-connect found no known printer");
            return None;
        };

        self.shared.set_state(ConnectionState::Connecting, &printer.id(), false);
        match self.establish(printer).await {
            Ok(name) => Some(name),
            Err(e) => {
                debug!("Auto-connect failed: {}", e);
                self.shared.set_state(ConnectionState::Disconnected, "", false);
                None
            }
        }
    }

    /// Close the link. Safe to call when already disconnected.
    pub async fn disconnect(&self) -> Result<()> {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.abort();
        }

        let link = self.shared.link.write().take();
        *self.shared.device_name.write() = None;

        let Some(link) = link else {
            self.shared.set_state(ConnectionState::Disconnected, "", false);
            return Ok(());
        };

        let identifier = link.id();
        self.shared
            .set_state(ConnectionState::Disconnecting, &identifier, false);

        let result = link.peripheral.disconnect().await;
        self.shared
            .set_state(ConnectionState::Disconnected, &identifier, false);

        match result {
            Ok(()) => {
                info!("Disconnected from printer {}", identifier);
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                Err(e)
            }
        }
    }

    /// Register a callback for links dropped by the peripheral.
    ///
    /// Receives the peripheral identifier. Explicit disconnects do not fire it.
    pub fn on_link_lost<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.link_lost => callback(&event.identifier),
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Open the link to `printer` and select its write characteristic.
    async fn establish(&self, printer: DiscoveredPrinter) -> Result<String> {
        let peripheral = printer.peripheral.clone();
        let identifier = peripheral.id();
        debug!("Connecting to {}", identifier);

        self.connect_retry
            .run("connect", |_| peripheral.connect())
            .await
            .map_err(|exhausted| Error::ConnectionFailed {
                reason: exhausted.error.to_string(),
            })?;

        let characteristic = match self.select_characteristic(&peripheral).await {
            Ok(characteristic) => characteristic,
            Err(e) => {
                let _ = peripheral.disconnect().await;
                return Err(e);
            }
        };

        let mut events = match peripheral.disconnect_events().await {
            Ok(events) => events,
            Err(e) => {
                let _ = peripheral.disconnect().await;
                return Err(Error::ConnectionFailed {
                    reason: format!("cannot observe disconnects: {}", e),
                });
            }
        };

        let name = printer.display_name();
        *self.shared.link.write() = Some(Arc::new(ActiveLink {
            peripheral,
            characteristic,
        }));
        *self.shared.device_name.write() = Some(name.clone());
        *self.shared.last_device_id.write() = Some(identifier.clone());

        let shared = self.shared.clone();
        let watched = identifier.clone();
        let watcher = tokio::spawn(async move {
            // A closed stream means the adapter went away; treat it like a drop.
            events.next().await;
            shared.link_lost(&watched);
        });
        if let Some(previous) = self.watcher.lock().replace(watcher) {
            previous.abort();
        }

        self.shared
            .set_state(ConnectionState::Connected, &identifier, false);
        info!("Connected to printer {} ({})", name, identifier);

        Ok(name)
    }

    async fn select_characteristic(
        &self,
        peripheral: &Arc<dyn PrinterPeripheral>,
    ) -> Result<WritableCharacteristic> {
        let characteristics =
            peripheral
                .characteristics()
                .await
                .map_err(|e| Error::ConnectionFailed {
                    reason: format!("service discovery failed: {}", e),
                })?;

        select_writable(&characteristics).ok_or_else(|| Error::ConnectionFailed {
            reason: "printer exposes no characteristics".to_string(),
        })
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::characteristics::{CharacteristicInfo, WriteMode};
    use crate::ble::device::StrongestSignal;
    use crate::testing::{FakeCentral, FakePeripheral};
    use std::sync::atomic::AtomicUsize;

    fn manager_with(printers: Vec<Arc<FakePeripheral>>) -> ConnectionManager {
        ConnectionManager::new(Arc::new(FakeCentral::with_printers(printers)))
    }

    async fn next_state(rx: &mut broadcast::Receiver<ConnectionEvent>, state: ConnectionState) -> ConnectionEvent {
        loop {
            let event = rx.recv().await.unwrap();
            if event.state == state {
                return event;
            }
        }
    }

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());

        assert!(ConnectionState::Connecting.is_transitioning());
        assert!(ConnectionState::Disconnecting.is_transitioning());
        assert!(!ConnectionState::Connected.is_transitioning());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(format!("{}", ConnectionState::Connected), "Connected");
        assert_eq!(format!("{}", ConnectionState::Disconnected), "Disconnected");
    }

    #[test]
    fn test_job_guard_is_exclusive() {
        let manager = ConnectionManager::unsupported();

        let guard = manager.try_begin_job().unwrap();
        assert!(manager.is_job_active());
        assert!(matches!(manager.try_begin_job(), Err(Error::PrinterBusy)));

        drop(guard);
        assert!(!manager.is_job_active());
        assert!(manager.try_begin_job().is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let manager = ConnectionManager::unsupported();
        let err = manager.connect(&StrongestSignal).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform));
        assert_eq!(manager.auto_connect().await, None);
    }

    #[tokio::test]
    async fn test_connect_selects_and_links() {
        let printer = Arc::new(FakePeripheral::new("AA:01"));
        let manager = manager_with(vec![printer.clone()]);

        let name = manager.connect(&StrongestSignal).await.unwrap();

        assert_eq!(name, "Printer AA:01");
        assert!(manager.is_connected().await);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.device_name().as_deref(), Some("Printer AA:01"));
        let link = manager.active_link().unwrap();
        assert_eq!(link.characteristic().mode, WriteMode::WithResponse);
        assert_eq!(printer.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_selection_cancelled() {
        let manager = manager_with(vec![Arc::new(FakePeripheral::new("AA:01"))]);
        let cancel = |_: &[DiscoveredPrinter]| -> Option<usize> { None };

        let err = manager.connect(&cancel).await.unwrap_err();

        assert!(matches!(err, Error::DeviceSelectionCancelled));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.active_link().is_none());
    }

    #[tokio::test]
    async fn test_no_printer_found() {
        let manager = manager_with(vec![]);
        let err = manager.connect(&StrongestSignal).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_refused_link_is_connection_failed() {
        let printer = Arc::new(FakePeripheral::new("AA:01").failing_connect());
        let manager = manager_with(vec![printer.clone()]);

        let err = manager.connect(&StrongestSignal).await.unwrap_err();

        assert!(matches!(err, Error::ConnectionFailed { .. }));
        assert!(!manager.is_connected().await);
        assert_eq!(printer.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_degraded_characteristic_still_links() {
        let printer = Arc::new(FakePeripheral::new("AA:01").with_characteristics(vec![
            CharacteristicInfo {
                uuid: Uuid::from_u128(7),
                service_uuid: Uuid::from_u128(1),
                write: false,
                write_without_response: false,
            },
        ]));
        let manager = manager_with(vec![printer]);

        manager.connect(&StrongestSignal).await.unwrap();

        assert!(manager.active_link().unwrap().characteristic().degraded);
    }

    #[tokio::test]
    async fn test_disconnect_event_clears_state() {
        let printer = Arc::new(FakePeripheral::new("AA:01"));
        let manager = manager_with(vec![printer.clone()]);
        manager.connect(&StrongestSignal).await.unwrap();
        let mut rx = manager.subscribe();

        printer.simulate_disconnect();

        // The live check already fails before the watcher runs.
        assert!(!manager.is_connected().await);

        let event = next_state(&mut rx, ConnectionState::Disconnected).await;
        assert!(event.link_lost);
        assert_eq!(event.identifier, "AA:01");
        assert!(manager.active_link().is_none());
        assert_eq!(manager.device_name(), None);
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let printer = Arc::new(FakePeripheral::new("AA:01"));
        let manager = manager_with(vec![printer]);
        manager.connect(&StrongestSignal).await.unwrap();

        manager.disconnect().await.unwrap();
        manager.disconnect().await.unwrap();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.device_name(), None);
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_auto_connect_prefers_last_device() {
        let first = Arc::new(FakePeripheral::new("AA:01"));
        let last = Arc::new(FakePeripheral::new("AA:02"));
        let central = FakeCentral::with_printers(vec![]).with_authorized(vec![first.clone(), last.clone()]);
        let manager = ConnectionManager::new(Arc::new(central)).with_last_device("AA:02");

        let name = manager.auto_connect().await;

        assert_eq!(name.as_deref(), Some("Printer AA:02"));
        assert_eq!(first.connect_calls(), 0);
        assert_eq!(last.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_auto_connect_without_known_devices() {
        let central = Arc::new(FakeCentral::with_printers(vec![]));
        let manager = ConnectionManager::new(central.clone());

        assert_eq!(manager.auto_connect().await, None);
        assert_eq!(central.scans(), 0);
    }

    #[tokio::test]
    async fn test_on_link_lost_callback() {
        let printer = Arc::new(FakePeripheral::new("AA:01"));
        let manager = manager_with(vec![printer.clone()]);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let handle = manager.on_link_lost(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.connect(&StrongestSignal).await.unwrap();
        let mut rx = manager.subscribe();

        printer.simulate_disconnect();
        next_state(&mut rx, ConnectionState::Disconnected).await;
        for _ in 0..10 {
            if fired.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        handle.unregister();
    }
}

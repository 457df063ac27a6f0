//! Print job orchestration.
//!
//! A [`PrinterSession`] owns everything one receipt printer needs: the
//! connection, the transport settings and the logo loader. A job moves
//! through [`PrintStage`]s strictly in order:
//!
//! ```text
//! Idle -> DrawerKick -> Logo? -> Body -> Cut -> Idle
//! ```
//!
//! Only one job runs at a time per printer, even across sessions sharing a
//! [`ConnectionManager`]. A second request while one is in flight is
//! rejected with [`Error::PrinterBusy`], never queued.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::ble::connection::{ActiveLink, CallbackHandle, ConnectionManager, JobGuard};
use crate::config::PrinterConfig;
use crate::data::{PrintJob, StoreConfig, Transaction};
use crate::error::{Error, Result};
use crate::imaging::LogoLoader;
use crate::protocol::commands::{self, Align, CommandStream};
use crate::protocol::receipt::ReceiptLayout;
use crate::protocol::transcript::render_transcript;
use crate::transport::writer::TransportWriter;

/// Lines fed after the logo.
const LOGO_FEED_LINES: u8 = 1;

/// Where a print job currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrintStage {
    /// No job running.
    #[default]
    Idle,
    /// Opening the cash drawer.
    DrawerKick,
    /// Printing the store logo.
    Logo,
    /// Printing the receipt text.
    Body,
    /// Feeding and cutting the paper.
    Cut,
}

impl std::fmt::Display for PrintStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::DrawerKick => write!(f, "DrawerKick"),
            Self::Logo => write!(f, "Logo"),
            Self::Body => write!(f, "Body"),
            Self::Cut => write!(f, "Cut"),
        }
    }
}

/// Result of a successful print request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    /// The receipt went to the printer.
    Printed,
    /// No printer was connected; the receipt was rendered as text instead.
    Virtual {
        /// Human-readable rendering of the command stream.
        transcript: String,
    },
}

impl PrintOutcome {
    /// Check if paper was actually printed.
    pub fn is_printed(&self) -> bool {
        matches!(self, Self::Printed)
    }
}

/// Holds the link for one job and resets the stage when the job ends,
/// however it ends.
struct StageGuard<'a> {
    _job: JobGuard<'a>,
    stage: &'a RwLock<PrintStage>,
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        *self.stage.write() = PrintStage::Idle;
    }
}

/// One logical session with one receipt printer.
pub struct PrinterSession {
    connection: Arc<ConnectionManager>,
    config: PrinterConfig,
    writer: TransportWriter,
    logos: LogoLoader,
    stage: RwLock<PrintStage>,
    links_lost: Arc<AtomicU64>,
    _link_watch: CallbackHandle,
}

impl PrinterSession {
    /// Create a session on top of a connection manager.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(connection: Arc<ConnectionManager>, config: PrinterConfig) -> Self {
        Self::with_logo_loader(connection, config, LogoLoader::new())
    }

    /// Create a session that loads logos with a specific loader.
    pub fn with_logo_loader(
        connection: Arc<ConnectionManager>,
        config: PrinterConfig,
        logos: LogoLoader,
    ) -> Self {
        let links_lost = Arc::new(AtomicU64::new(0));
        let counter = links_lost.clone();
        let link_watch = connection.on_link_lost(move |identifier| {
            counter.fetch_add(1, Ordering::SeqCst);
            info!(
                "Printer {} dropped the link; reconnect before the next print",
                identifier
            );
        });

        Self {
            writer: TransportWriter::new(config.transport, config.chunk_retry),
            connection,
            config,
            logos,
            stage: RwLock::new(PrintStage::Idle),
            links_lost,
            _link_watch: link_watch,
        }
    }

    /// The connection manager.
    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    /// The session configuration.
    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Stage of the job in flight.
    pub fn stage(&self) -> PrintStage {
        *self.stage.read()
    }

    /// Check if a job is in flight on this session's printer.
    pub fn is_busy(&self) -> bool {
        self.connection.is_job_active()
    }

    /// Number of times the printer dropped the link during this session.
    pub fn links_lost(&self) -> u64 {
        self.links_lost.load(Ordering::SeqCst)
    }

    /// Print a receipt for `transaction`.
    ///
    /// # Errors
    ///
    /// - [`Error::PrinterBusy`] if another job is running
    /// - [`Error::NotConnected`] if no printer is linked
    /// - [`Error::ChunkWriteFailed`] if a write exhausts its retries
    ///
    /// Logo failures are not errors; the receipt prints without it. When an
    /// error indicates the link is gone the session disconnects before
    /// returning it.
    pub async fn print_receipt(
        &self,
        transaction: &Transaction,
        store: &StoreConfig,
    ) -> Result<PrintOutcome> {
        let _guard = self.acquire()?;
        self.print_locked(transaction, store).await
    }

    /// Print a fixed sample receipt.
    ///
    /// Without a connected printer the receipt is rendered with
    /// [`print_virtual`](Self::print_virtual) instead.
    pub async fn print_test_receipt(&self, store: &StoreConfig) -> Result<PrintOutcome> {
        let _guard = self.acquire()?;
        let sample = Transaction::sample();

        if !self.connection.is_connected().await {
            info!("No printer connected; rendering test receipt virtually");
            let stream = self.render_receipt(&sample, store);
            return Ok(self.print_virtual(stream.as_bytes()));
        }

        self.print_locked(&sample, store).await
    }

    /// Render an ESC/POS stream as text and log it.
    pub fn print_virtual(&self, commands: &[u8]) -> PrintOutcome {
        let transcript = render_transcript(commands);
        info!("Virtual receipt:\n{}", transcript);
        PrintOutcome::Virtual { transcript }
    }

    /// The full command stream for a receipt, without the logo.
    ///
    /// Drawer kick, body, then feed-and-cut, exactly as they would be sent.
    pub fn render_receipt(&self, transaction: &Transaction, store: &StoreConfig) -> CommandStream {
        let mut stream = CommandStream::new();
        stream.drawer_kick();
        stream.raw(self.layout(store).render(PrintJob::new(transaction, store)).as_bytes());
        stream.feed_and_cut();
        stream
    }

    fn layout(&self, store: &StoreConfig) -> ReceiptLayout {
        ReceiptLayout::new(store.paper_width, self.config.currency)
    }

    fn acquire(&self) -> Result<StageGuard<'_>> {
        let job = match self.connection.try_begin_job() {
            Ok(job) => job,
            Err(e) => {
                debug!("Print rejected: another job is in flight");
                return Err(e);
            }
        };
        Ok(StageGuard {
            _job: job,
            stage: &self.stage,
        })
    }

    fn set_stage(&self, stage: PrintStage) {
        debug!("Print stage: {}", stage);
        *self.stage.write() = stage;
    }

    async fn print_locked(
        &self,
        transaction: &Transaction,
        store: &StoreConfig,
    ) -> Result<PrintOutcome> {
        match self.run_job(transaction, store).await {
            Ok(()) => {
                info!("Printed receipt {}", transaction.id);
                Ok(PrintOutcome::Printed)
            }
            Err(e) => {
                warn!("Print failed during {}: {}", self.stage(), e);
                if e.is_link_lost() {
                    if let Err(teardown) = self.connection.disconnect().await {
                        error!("Failed to tear down lost link: {}", teardown);
                    }
                }
                Err(e)
            }
        }
    }

    async fn run_job(&self, transaction: &Transaction, store: &StoreConfig) -> Result<()> {
        let link = self.live_link().await?;

        self.set_stage(PrintStage::DrawerKick);
        self.send(&link, &commands::drawer_kick()).await?;

        if let Some(source) = store.logo_to_print() {
            self.set_stage(PrintStage::Logo);
            self.print_logo(&link, source).await;

            let mut reset = CommandStream::new();
            reset.init().align(Align::Left);
            self.send(&link, reset.as_bytes()).await?;
        }

        self.set_stage(PrintStage::Body);
        let body = self.layout(store).render(PrintJob::new(transaction, store));
        self.send(&link, body.as_bytes()).await?;

        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        self.set_stage(PrintStage::Cut);
        self.send(&link, &commands::feed_and_cut()).await
    }

    /// The active link, if the printer still reports it connected.
    ///
    /// A cached link whose peripheral is gone is torn down.
    async fn live_link(&self) -> Result<Arc<ActiveLink>> {
        let Some(link) = self.connection.active_link() else {
            return Err(Error::NotConnected);
        };

        if link.peripheral().is_connected().await {
            return Ok(link);
        }

        debug!("Cached link to {} is stale", link.id());
        if let Err(e) = self.connection.disconnect().await {
            error!("Failed to tear down stale link: {}", e);
        }
        Err(Error::NotConnected)
    }

    async fn print_logo(&self, link: &ActiveLink, source: &str) {
        let raster = match self.logos.process(source, self.config.logo_width).await {
            Ok(raster) => raster,
            Err(e) => {
                warn!("Skipping logo: {}", e);
                return;
            }
        };

        let mut stream = CommandStream::new();
        stream
            .align(Align::Center)
            .raster(&raster)
            .feed(LOGO_FEED_LINES);

        if let Err(e) = self.send(link, stream.as_bytes()).await {
            warn!("Logo transmission failed: {}", e);
        }
    }

    async fn send(&self, link: &ActiveLink, bytes: &[u8]) -> Result<()> {
        self.writer.write_chunked(link, bytes).await
    }
}

impl std::fmt::Debug for PrinterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterSession")
            .field("config", &self.config)
            .field("stage", &self.stage())
            .field("busy", &self.is_busy())
            .finish()
    }
}

//! Capture engine.
//!
//! [`CaptureEngine`] is the control boundary a host talks to. It owns the
//! configuration, the current [`DocumentIdentity`], a passive session fed by
//! change notifications between captures, and the last captured text.
//!
//! A capture borrows the engine immutably, so a second request made while one
//! is suspended in a settle wait can be observed and rejected:
//!
//! - [`start_capture`](CaptureEngine::start_capture) while active fails with
//!   [`Error::CaptureInProgress`] without touching the running session
//! - [`observe_change`](CaptureEngine::observe_change) while active is inert
//! - [`navigate`](CaptureEngine::navigate) to another document invalidates the
//!   running session, which then fails with [`Error::DocumentChanged`]
//!
//! The engine is single-threaded; the futures it returns are not `Send`.

pub mod driver;
pub mod extract;
pub mod fingerprint;
pub mod identity;
pub mod reconcile;
pub mod report;
pub mod session;
pub mod store;

use std::cell::{Cell, RefCell};

use chrono::Utc;
use uuid::Uuid;

use crate::assembler::DocumentAssembler;
use crate::config::CaptureConfig;
use crate::converters::BlockConverter;
use crate::error::{Error, Result};
use crate::tree::Viewport;

pub use driver::{CapturePhase, RevelationDriver};
pub use fingerprint::BlockId;
pub use identity::DocumentIdentity;
pub use report::{CaptureReport, CaptureStats, CaptureWarning};
pub use session::CaptureSession;
pub use store::{BlockStore, ContentUnit};

/// Resets the phase to idle when a capture ends, however it ends.
struct ActiveGuard<'a>(&'a Cell<CapturePhase>);

impl<'a> ActiveGuard<'a> {
    fn acquire(phase: &'a Cell<CapturePhase>) -> Result<Self> {
        if phase.get().is_active() {
            return Err(Error::CaptureInProgress);
        }
        phase.set(CapturePhase::Initializing);
        Ok(Self(phase))
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.set(CapturePhase::Idle);
    }
}

/// Reconstructs whole documents from a virtualizing [`Viewport`].
///
/// # Examples
///
/// ```
/// use vdom_capture::capture::{CaptureEngine, DocumentIdentity};
/// use vdom_capture::config::CaptureConfig;
/// use vdom_capture::snapshot::{DocumentSnapshot, SnapshotBlock};
/// use vdom_capture::tree::BlockMarker;
///
/// # fn main() -> vdom_capture::Result<()> {
/// let snapshot = DocumentSnapshot::new("https://notes.example/p/1", 300.0)
///     .with_block(SnapshotBlock::new(0.0, vec![BlockMarker::Heading(1)]).with_text("Title"))
///     .with_block(SnapshotBlock::new(48.0, vec![BlockMarker::Text]).with_text("Body"));
/// let mut document = snapshot.into_document();
///
/// let engine = CaptureEngine::new(
///     DocumentIdentity::new("https://notes.example/p/1"),
///     CaptureConfig::fast(),
/// )?;
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
/// let report = runtime.block_on(engine.start_capture(&mut document))?;
/// assert_eq!(report.text, "# Title\n\nBody");
/// # Ok(())
/// # }
/// ```
pub struct CaptureEngine {
    config: CaptureConfig,
    converter: BlockConverter,
    assembler: DocumentAssembler,
    identity: RefCell<DocumentIdentity>,
    generation: Cell<u64>,
    phase: Cell<CapturePhase>,
    passive: RefCell<CaptureSession>,
    passive_block_count: Cell<Option<usize>>,
    captured: RefCell<Option<String>>,
}

impl CaptureEngine {
    /// Create an engine targeting `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation.
    pub fn new(identity: DocumentIdentity, config: CaptureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            converter: BlockConverter::from_config(&config),
            assembler: DocumentAssembler::new(),
            config,
            identity: RefCell::new(identity),
            generation: Cell::new(0),
            phase: Cell::new(CapturePhase::Idle),
            passive: RefCell::new(CaptureSession::new()),
            passive_block_count: Cell::new(None),
            captured: RefCell::new(None),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Document the engine currently targets.
    pub fn identity(&self) -> DocumentIdentity {
        self.identity.borrow().clone()
    }

    /// Current state of the revelation loop.
    pub fn phase(&self) -> CapturePhase {
        self.phase.get()
    }

    /// Whether a capture is running.
    pub fn is_active(&self) -> bool {
        self.phase.get().is_active()
    }

    /// Text produced by the last successful capture of the current document.
    pub fn captured_text(&self) -> Option<String> {
        self.captured.borrow().clone()
    }

    /// Capture the whole document shown by `viewport`.
    ///
    /// Scrolls through the document, assembles every revealed block in
    /// document order and restores the viewport to where it was.
    ///
    /// # Errors
    ///
    /// - [`Error::CaptureInProgress`] if another capture is running
    /// - [`Error::DocumentChanged`] if [`navigate`](Self::navigate) switched
    ///   documents while this capture ran
    /// - [`Error::Assembly`] if the collected session is inconsistent
    pub async fn start_capture<V: Viewport>(&self, viewport: &mut V) -> Result<CaptureReport> {
        let _guard = match ActiveGuard::acquire(&self.phase) {
            Ok(guard) => guard,
            Err(e) => {
                log::warn!("Rejected capture request: {}", e);
                return Err(e);
            },
        };

        let session_id = Uuid::new_v4();
        let generation = self.generation.get();
        let started_on = self.identity();
        log::info!("Capture {} started on {}", session_id, started_on);

        let seed = self.passive.take();
        self.passive_block_count.set(None);

        let outcome =
            RevelationDriver::new(viewport, &self.config, &self.converter, &self.phase, seed)
                .run()
                .await;

        if self.generation.get() != generation {
            let now_on = self.identity();
            log::warn!("Capture {} discarded: document changed to {}", session_id, now_on);
            return Err(Error::DocumentChanged {
                from: started_on.to_string(),
                to: now_on.to_string(),
            });
        }

        let text = self.assembler.assemble(&outcome.session)?;
        for warning in &outcome.warnings {
            log::warn!("Capture {} degraded: {}", session_id, warning);
        }
        log::info!(
            "Capture {} finished: {} units, {} chars",
            session_id,
            outcome.stats.units,
            text.len()
        );

        *self.captured.borrow_mut() = Some(text.clone());
        Ok(CaptureReport {
            session_id,
            text,
            warnings: outcome.warnings,
            stats: outcome.stats,
            captured_at: Utc::now(),
        })
    }

    /// Passive extraction after the host reports a change in the content tree.
    ///
    /// Does nothing while a capture is running, or when the number of
    /// materialized blocks is unchanged since the last passive pass. Returns
    /// the number of newly stored units.
    pub fn observe_change<V: Viewport>(&self, viewport: &V) -> usize {
        if self.is_active() {
            log::trace!("Ignoring content change during capture");
            return 0;
        }

        let blocks = viewport.materialized();
        let mut passive = self.passive.borrow_mut();
        if self.passive_block_count.get() == Some(blocks.len()) && !passive.is_empty() {
            return 0;
        }
        self.passive_block_count.set(Some(blocks.len()));

        let scroll_top = viewport
            .scroll_metrics()
            .map(|metrics| metrics.scroll_top)
            .unwrap_or(0.0);
        let outcome = extract::extract_pass(
            &blocks,
            scroll_top,
            &mut passive,
            &self.converter,
            &self.config.fingerprint,
        );
        log::debug!("Passive pass stored {} new units", outcome.new_units);
        outcome.new_units
    }

    /// Switch to `identity`.
    ///
    /// Returns `true` if it is a different document. In that case the passive
    /// store and the captured text are discarded and a running capture will
    /// fail with [`Error::DocumentChanged`].
    pub fn navigate(&self, identity: DocumentIdentity) -> bool {
        if self.identity.borrow().same_document(&identity) {
            return false;
        }

        log::info!("Document changed: {} -> {}", self.identity.borrow(), identity);
        *self.identity.borrow_mut() = identity;
        self.generation.set(self.generation.get() + 1);
        *self.passive.borrow_mut() = CaptureSession::new();
        self.passive_block_count.set(None);
        *self.captured.borrow_mut() = None;
        true
    }
}

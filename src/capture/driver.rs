//! Scroll-driven revelation loop.
//!
//! The driver is an explicit state machine:
//!
//! ```text
//! Idle -> Initializing -+-> ExtractPass <-> Advancing
//!                       |        |
//!                       |        v
//!                       |   Finalizing -> Done
//!                       |
//!                       +-> FallbackExtract -> Done
//! ```
//!
//! The only suspension points are the settle waits after the initial reset,
//! after every advancing step and before the final extraction, so passes
//! never overlap.

use std::cell::Cell;
use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::extract::{extract_pass, ExtractOutcome};
use crate::capture::fingerprint::BlockId;
use crate::capture::report::{CaptureStats, CaptureWarning};
use crate::capture::session::CaptureSession;
use crate::config::CaptureConfig;
use crate::converters::BlockConverter;
use crate::tree::Viewport;

/// Named states of the revelation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// No capture running
    Idle,
    /// Locating the scroll region and resetting it to the top
    Initializing,
    /// One static pass over a document without a scroll region
    FallbackExtract,
    /// Extracting the current reveal window
    ExtractPass,
    /// Moving the viewport forward
    Advancing,
    /// Final pass at the maximum extent, then viewport restore
    Finalizing,
    /// Capture finished
    Done,
}

impl CapturePhase {
    /// Whether a capture is running in this phase.
    pub fn is_active(&self) -> bool {
        !matches!(self, CapturePhase::Idle)
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct DriverOutcome {
    /// Store and global order
    pub session: CaptureSession,
    /// Counters
    pub stats: CaptureStats,
    /// Degradation warnings
    pub warnings: Vec<CaptureWarning>,
}

/// Drives a [`Viewport`] until every block has been materialized once.
pub struct RevelationDriver<'a, V: Viewport> {
    viewport: &'a mut V,
    config: &'a CaptureConfig,
    converter: &'a BlockConverter,
    phase: &'a Cell<CapturePhase>,
    session: CaptureSession,
    stats: CaptureStats,
    warnings: Vec<CaptureWarning>,
    failed: HashSet<BlockId>,
}

impl<'a, V: Viewport> RevelationDriver<'a, V> {
    /// Create a driver.
    ///
    /// `phase` is updated on every transition so the owner can observe the
    /// loop while it is suspended. `session` seeds the store, so blocks stored
    /// earlier are not converted again.
    pub fn new(
        viewport: &'a mut V,
        config: &'a CaptureConfig,
        converter: &'a BlockConverter,
        phase: &'a Cell<CapturePhase>,
        session: CaptureSession,
    ) -> Self {
        Self {
            viewport,
            config,
            converter,
            phase,
            session,
            stats: CaptureStats::default(),
            warnings: Vec::new(),
            failed: HashSet::new(),
        }
    }

    /// Run the loop to completion.
    ///
    /// The viewport is left at the offset it had when the run started.
    pub async fn run(mut self) -> DriverOutcome {
        let mut state = CapturePhase::Initializing;
        let mut origin = 0.0;
        let mut delay = self.config.settle.initial();
        let mut idle_streak: u32 = 0;
        let mut previous_top: Option<f64> = None;

        loop {
            self.enter(state);
            state = match state {
                CapturePhase::Idle | CapturePhase::Initializing => {
                    match self.viewport.scroll_metrics() {
                        None => CapturePhase::FallbackExtract,
                        Some(metrics) => {
                            origin = metrics.scroll_top;
                            self.viewport.scroll_to(0.0);
                            self.viewport.settle(self.config.reset_delay()).await;
                            CapturePhase::ExtractPass
                        },
                    }
                },
                CapturePhase::FallbackExtract => {
                    log::warn!("No scrollable region found, extracting the static tree once");
                    self.warnings.push(CaptureWarning::NoScrollRegion);
                    self.extract();
                    CapturePhase::Done
                },
                CapturePhase::ExtractPass => {
                    let outcome = self.extract();
                    if self.stats.steps > 0 {
                        let discovered_new = outcome.new_units > 0;
                        idle_streak = if discovered_new { 0 } else { idle_streak + 1 };
                        delay = self.config.settle.next_delay(delay, discovered_new, idle_streak);
                    }
                    self.after_extract(&mut previous_top)
                },
                CapturePhase::Advancing => {
                    if let Some(metrics) = self.viewport.scroll_metrics() {
                        let target = metrics.scroll_top
                            + metrics.client_height * self.config.step_fraction;
                        self.viewport.scroll_to(target.min(metrics.max_offset()));
                    }
                    self.stats.steps += 1;
                    log::trace!("Step {} settling for {:?}", self.stats.steps, delay);
                    self.viewport.settle(delay).await;
                    CapturePhase::ExtractPass
                },
                CapturePhase::Finalizing => {
                    self.finalize(origin, delay).await;
                    CapturePhase::Done
                },
                CapturePhase::Done => break,
            };
        }

        self.stats.units = self.session.len();
        self.stats.dropped_units = self.failed.len();
        log::debug!(
            "Capture loop done: {} units in {} steps ({} passes, {} dropped)",
            self.stats.units,
            self.stats.steps,
            self.stats.passes,
            self.stats.dropped_units
        );

        DriverOutcome {
            session: self.session,
            stats: self.stats,
            warnings: self.warnings,
        }
    }

    fn enter(&self, state: CapturePhase) {
        if self.phase.get() != state {
            log::trace!("Capture phase {:?} -> {:?}", self.phase.get(), state);
            self.phase.set(state);
        }
    }

    /// Decide between another step and finalizing.
    fn after_extract(&mut self, previous_top: &mut Option<f64>) -> CapturePhase {
        let Some(metrics) = self.viewport.scroll_metrics() else {
            log::debug!("Scroll region disappeared, finalizing");
            return CapturePhase::Finalizing;
        };

        let unchanged = previous_top.is_some_and(|top| top == metrics.scroll_top);
        *previous_top = Some(metrics.scroll_top);

        if unchanged {
            log::debug!("Scroll position stuck at {:.1}, finalizing", metrics.scroll_top);
            CapturePhase::Finalizing
        } else if metrics.is_at_end(self.config.end_tolerance_px) {
            log::debug!("Reached the end at {:.1}", metrics.scroll_top);
            CapturePhase::Finalizing
        } else if self.stats.steps >= self.config.max_steps {
            log::warn!(
                "Step ceiling of {} reached, capture may be incomplete",
                self.config.max_steps
            );
            self.warnings.push(CaptureWarning::StepCeilingReached {
                steps: self.stats.steps,
            });
            CapturePhase::Finalizing
        } else {
            CapturePhase::Advancing
        }
    }

    async fn finalize(&mut self, origin: f64, delay: Duration) {
        if let Some(metrics) = self.viewport.scroll_metrics() {
            self.viewport.scroll_to(metrics.max_offset());
            self.viewport.settle(delay).await;
            self.extract();
        }
        self.viewport.scroll_to(origin);
    }

    fn extract(&mut self) -> ExtractOutcome {
        let scroll_top = self
            .viewport
            .scroll_metrics()
            .map(|metrics| metrics.scroll_top)
            .unwrap_or(0.0);
        let blocks = self.viewport.materialized();
        let outcome = extract_pass(
            &blocks,
            scroll_top,
            &mut self.session,
            self.converter,
            &self.config.fingerprint,
        );
        self.stats.passes += 1;
        self.failed.extend(outcome.dropped.iter().copied());
        log::debug!(
            "Pass {} at {:.1}: {} materialized, {} new, {} total",
            self.stats.passes,
            scroll_top,
            outcome.materialized,
            outcome.new_units,
            self.session.len()
        );
        outcome
    }
}

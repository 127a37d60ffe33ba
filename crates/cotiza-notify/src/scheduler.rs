//! # Scheduler
//!
//! The periodic loop that drives batch passes.
//!
//! ## Loop Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scheduler Loop                                    │
//! │                                                                         │
//! │  run()                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  interval(period)  ── first tick fires immediately ──► run_pass(now)   │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  tokio::select! {                                                       │
//! │      tick     ──► run_pass(Utc::now())   (errors logged, loop lives)   │
//! │      shutdown ──► break                                                 │
//! │  }                                                                      │
//! │                                                                         │
//! │  TIMING:                                                               │
//! │  • standard():   6 hours - production cadence                          │
//! │  • responsive(): 5 seconds - responsiveness testing, same semantics    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler owns no business state: every pass reads everything it
//! needs from the repositories, so stopping between passes is always safe.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info};

use cotiza_db::Database;

use crate::email::EmailSender;
use crate::error::{NotifyError, NotifyResult};
use crate::pass::run_pass;
use crate::selector::ProductPicker;

// =============================================================================
// Constants
// =============================================================================

/// Production pass period: 6 hours.
pub const STANDARD_PASS_PERIOD: Duration = Duration::from_secs(6 * 60 * 60);

/// Short period for responsiveness testing. Functionally identical to the
/// standard scheduler; only the wake period differs.
pub const RESPONSIVE_PASS_PERIOD: Duration = Duration::from_secs(5);

// =============================================================================
// Scheduler
// =============================================================================

/// Periodic pass runner.
pub struct Scheduler {
    db: Database,
    sender: Arc<dyn EmailSender>,
    picker: Arc<dyn ProductPicker>,
    period: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Triggers graceful shutdown. The current pass finishes first; the
    /// process may only be stopped between passes.
    pub async fn shutdown(&self) -> NotifyResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| NotifyError::Channel("Shutdown channel closed".into()))
    }
}

impl Scheduler {
    /// Creates a scheduler with an explicit period and returns a handle.
    pub fn new(
        db: Database,
        sender: Arc<dyn EmailSender>,
        picker: Arc<dyn ProductPicker>,
        period: Duration,
    ) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let scheduler = Scheduler {
            db,
            sender,
            picker,
            period,
            shutdown_rx,
        };

        (scheduler, SchedulerHandle { shutdown_tx })
    }

    /// Production scheduler: one pass every 6 hours.
    pub fn standard(
        db: Database,
        sender: Arc<dyn EmailSender>,
        picker: Arc<dyn ProductPicker>,
    ) -> (Self, SchedulerHandle) {
        Self::new(db, sender, picker, STANDARD_PASS_PERIOD)
    }

    /// Continuous-loop variant with a short wake period, for
    /// responsiveness testing.
    pub fn responsive(
        db: Database,
        sender: Arc<dyn EmailSender>,
        picker: Arc<dyn ProductPicker>,
    ) -> (Self, SchedulerHandle) {
        Self::new(db, sender, picker, RESPONSIVE_PASS_PERIOD)
    }

    /// Runs the scheduler loop.
    ///
    /// This should be spawned as a background task. The first pass runs
    /// immediately on startup; a pass failure is logged and the loop
    /// continues with the next tick.
    pub async fn run(mut self) {
        info!(period_secs = self.period.as_secs(), "Scheduler starting");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    match run_pass(&self.db, self.sender.as_ref(), self.picker.as_ref(), now).await {
                        Ok(summary) => {
                            info!(
                                stale_alerts = summary.stale_alerts,
                                promotions_sent = summary.promotions_sent,
                                failures = summary.failures,
                                "Scheduled pass finished"
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "Scheduled pass failed");
                        }
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }

        info!("Scheduler stopped");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

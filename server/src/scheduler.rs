//! Periodic sync driver.
//!
//! ```text
//! Idle ──▶ Running ⇄ Sleeping ──▶ Stopped
//!   └────▶ Disabled
//! ```
//!
//! After a warm-up delay the scheduler runs [`SyncService::run_all`], then
//! sleeps until one interval after the tick started. Cancellation is honoured
//! during warm-up, between platforms and sources, and while sleeping.

use crate::config::SyncSettings;
use crate::sync::SyncService;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Lifecycle of the scheduler task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Idle,
    Running,
    Sleeping,
    Stopped,
    Disabled,
}

pub struct Scheduler {
    service: Arc<SyncService>,
    settings: SyncSettings,
    cancel: CancellationToken,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(
        service: Arc<SyncService>,
        settings: SyncSettings,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            service,
            settings,
            cancel,
            state,
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drive scheduled runs until cancelled. Returns at once when disabled.
    pub async fn run(self) {
        if !self.settings.enabled {
            tracing::info!("Scheduled sync is disabled");
            self.state.send_replace(SchedulerState::Disabled);
            return;
        }

        tracing::info!(
            warmup_secs = self.settings.warmup.as_secs(),
            interval_secs = self.settings.interval.as_secs(),
            "Scheduler started"
        );

        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.stop();
                return;
            }
            _ = tokio::time::sleep(self.settings.warmup) => {}
        }

        loop {
            let tick_start = Instant::now();
            self.state.send_replace(SchedulerState::Running);

            match AssertUnwindSafe(self.service.run_all(&self.cancel))
                .catch_unwind()
                .await
            {
                Ok(report) => tracing::debug!(run_id = %report.run_id, "Scheduled run complete"),
                Err(_) => tracing::error!("Scheduled sync run panicked"),
            }

            if self.cancel.is_cancelled() {
                break;
            }

            self.state.send_replace(SchedulerState::Sleeping);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep_until(tick_start + self.settings.interval) => {}
            }
        }

        self.stop();
    }

    fn stop(&self) {
        tracing::info!("Scheduler stopped");
        self.state.send_replace(SchedulerState::Stopped);
    }
}

pub mod daily;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

use self::daily::{DailyPing, Tick};

/// Evaluate the daily ping twice a minute.
pub const LUNCH_PING_CRON: &str = "0,30 * * * * *";

/// Lets ticks run until closed; closing waits for ticks already inside.
#[derive(Clone, Default)]
pub struct TickGate {
    closed: Arc<RwLock<bool>>,
}

impl TickGate {
    /// Run `tick` unless the gate is closed. The gate stays open while it runs.
    pub async fn run<F: Future>(&self, tick: F) -> Option<F::Output> {
        let closed = self.closed.read().await;
        if *closed {
            return None;
        }
        Some(tick.await)
    }

    pub async fn close(&self) {
        *self.closed.write().await = true;
    }
}

/// One evaluation of the daily ping. A tick still sending holds the lock,
/// so an overlapping tick is skipped rather than queued.
pub async fn lunch_ping_tick(daily: &Mutex<DailyPing>, now: NaiveDateTime) -> Option<Tick> {
    let Ok(mut ping) = daily.try_lock() else {
        debug!("Previous lunch ping tick still running, skipping");
        return None;
    };
    let outcome = ping.tick(now).await;
    debug!(
        "Lunch ping tick at {}: {:?} (fired today: {})",
        now,
        outcome,
        ping.fired_today()
    );
    Some(outcome)
}

/// Cron-driven runner for the lunch ping.
pub struct Scheduler {
    inner: JobScheduler,
    gate: TickGate,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self {
            inner,
            gate: TickGate::default(),
        })
    }

    /// Tick `daily` on [`LUNCH_PING_CRON`] with the wall clock converted to `tz`.
    pub async fn add_lunch_ping(&self, daily: Arc<Mutex<DailyPing>>, tz: Tz) -> Result<()> {
        let gate = self.gate.clone();
        let job = Job::new_async(LUNCH_PING_CRON, move |_uuid, _lock| {
            let gate = gate.clone();
            let daily = daily.clone();
            Box::pin(async move {
                let ran = gate
                    .run(async {
                        let now = Utc::now().with_timezone(&tz).naive_local();
                        lunch_ping_tick(&daily, now).await
                    })
                    .await;
                if ran.is_none() {
                    debug!("Scheduler closed, lunch ping tick dropped");
                }
            })
        })
        .context("Failed to create lunch ping job")?;

        self.inner
            .add(job)
            .await
            .context("Failed to add lunch ping job")?;

        info!("Scheduled lunch ping with cron: {}", LUNCH_PING_CRON);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    /// Stop firing jobs, then wait for a tick that already started.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        self.gate.close().await;
        info!("Scheduler stopped");
        Ok(())
    }
}

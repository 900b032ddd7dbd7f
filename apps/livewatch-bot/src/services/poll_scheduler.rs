use crate::services::status_tracker::StatusTracker;
use anyhow::Result;
use livewatch_core::LivenessCheck;
use livewatch_db::repositories::TargetRepository;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub checked: usize,
    pub transitions: usize,
    pub unresolved: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle was still running.
    Skipped,
}

/// Periodically re-resolves every stored target. At most one cycle runs at a time.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    targets: TargetRepository,
    resolver: Arc<dyn LivenessCheck>,
    tracker: StatusTracker,
    pacing: Duration,
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PollScheduler {
    pub fn new(
        targets: TargetRepository,
        resolver: Arc<dyn LivenessCheck>,
        tracker: StatusTracker,
        pacing: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                targets,
                resolver,
                tracker,
                pacing,
                running: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub async fn start(self, period: Duration) {
        info!("Starting poll scheduler (every {:?}, pacing {:?})", period, self.inner.pacing);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let scheduler = self.clone();
            tokio::spawn(async move {
                match scheduler.try_run_cycle().await {
                    Ok(CycleOutcome::Completed(_)) => {}
                    Ok(CycleOutcome::Skipped) => {
                        info!("Previous poll cycle still running, skipping this tick")
                    }
                    Err(e) => error!("Poll cycle failed: {:#}", e),
                }
            });
        }
    }

    /// Runs one cycle unless one is already in progress.
    pub async fn try_run_cycle(&self) -> Result<CycleOutcome> {
        let running = &self.inner.running;
        if running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = RunningGuard(running);

        let report = self.run_cycle().await?;
        info!(
            "Poll cycle done: {} checked, {} transitions, {} unresolved, {} failed",
            report.checked, report.transitions, report.unresolved, report.failed
        );
        Ok(CycleOutcome::Completed(report))
    }

    async fn run_cycle(&self) -> Result<CycleReport> {
        let inner = &self.inner;
        let targets = inner.targets.list_all().await?;
        let mut report = CycleReport::default();

        for (i, target) in targets.iter().enumerate() {
            if i > 0 && !inner.pacing.is_zero() {
                tokio::time::sleep(inner.pacing).await;
            }
            report.checked += 1;

            let Some(resolution) = inner.resolver.resolve(&target.id, &target.url).await else {
                report.unresolved += 1;
                continue;
            };

            match inner.tracker.apply(&target.id, &target.url, &resolution).await {
                Ok(Some(_)) => report.transitions += 1,
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!("Failed to store result for {}: {:#}", target.id, e);
                }
            }
        }

        Ok(report)
    }
}

//! Round scheduler.
//!
//! Drives probe rounds against a destination set: fan out one probe task
//! per destination, wait for the round to settle, flush newly completed
//! rows to the sink, then pace the next round so consecutive starts are at
//! least the configured interval apart. Slow rounds already cover the gap
//! and start the next round immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep, timeout};

use crate::config::RunConfig;
use crate::probe::{DEFAULT_PROBE_TIMEOUT, Outcome, Prober};
use crate::render::{RenderSink, Renderer};
use crate::table::ResultTable;

/// Errors surfaced by [`Scheduler::run`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A run is already in progress on this scheduler.
    #[error("a run is already in progress")]
    AlreadyRunning,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Rounds completed and rendered.
    pub rounds: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Whether the run ended early on a stop signal.
    pub stopped: bool,
}

/// Clears the running flag when a run exits by any path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives rounds of concurrent probes and renders their results.
///
/// A scheduler executes at most one run at a time; overlapping calls to
/// [`run`](Self::run) are rejected with [`SchedulerError::AlreadyRunning`].
/// Every run starts from an empty result grid.
pub struct Scheduler<P> {
    prober: Arc<P>,
    probe_timeout: Duration,
    running: AtomicBool,
}

impl<P> std::fmt::Debug for Scheduler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("probe_timeout", &self.probe_timeout)
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<P: Prober> Scheduler<P> {
    /// Create a scheduler driving `prober`.
    pub fn new(prober: P) -> Self {
        Self {
            prober: Arc::new(prober),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            running: AtomicBool::new(false),
        }
    }

    /// Override the per-probe timeout.
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Execute a run: `config.iterations` rounds, or until `stop` signals,
    /// rendering every completed round to `sink`.
    ///
    /// Probes of a round run concurrently and each outcome is recorded in
    /// the round's row before its task completes, so a rendered row can
    /// never miss a finished probe. A stop signal ends the run at the next
    /// between-rounds point; the current round still completes and renders.
    /// Dropping the stop sender counts as a stop request.
    ///
    /// # Errors
    /// Returns [`SchedulerError::AlreadyRunning`] if another run is active
    /// on this scheduler.
    pub async fn run(
        &self,
        config: &RunConfig,
        sink: &mut dyn RenderSink,
        mut stop: watch::Receiver<()>,
    ) -> Result<RunSummary, SchedulerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let table = ResultTable::new(&config.destinations);
        let mut renderer = Renderer::new(config.thresholds);
        let run_start = Instant::now();
        let mut round = 0;
        let mut stopped = false;

        tracing::debug!(
            destinations = config.destinations.len(),
            iterations = %config.iterations,
            interval_ms = config.interval.as_millis(),
            "Run starting"
        );

        while !config.iterations.is_done(round) {
            let round_start = Instant::now();
            table.open_round(round);

            let mut probes = JoinSet::new();
            for destination in &config.destinations {
                let prober = Arc::clone(&self.prober);
                let writer = table.writer();
                let destination = destination.clone();
                let probe_timeout = self.probe_timeout;
                probes.spawn(async move {
                    let probe = prober.probe(&destination, probe_timeout);
                    let outcome = match timeout(probe_timeout, probe).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            tracing::warn!(
                                %destination,
                                timeout_ms = probe_timeout.as_millis(),
                                "Probe exceeded its timeout"
                            );
                            Outcome::Failed
                        }
                    };
                    // recorded before the task becomes joinable, so the
                    // rendered row cannot miss this outcome
                    writer.record(round, &destination, outcome);
                });
            }
            while let Some(joined) = probes.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(round, error = %e, "Probe task did not complete");
                }
            }

            let elapsed = round_start.elapsed();
            for event in renderer.drain(&table) {
                sink.emit(event);
            }
            tracing::debug!(round, elapsed_ms = elapsed.as_millis(), "Round complete");
            round += 1;

            if config.iterations.is_done(round) {
                break;
            }
            if elapsed < config.interval {
                tokio::select! {
                    _ = sleep(config.interval - elapsed) => {}
                    _ = stop.changed() => {
                        stopped = true;
                    }
                }
            } else if stop.has_changed().unwrap_or(true) {
                stopped = true;
            }
            if stopped {
                tracing::info!(rounds = round, "Stop requested, ending run between rounds");
                break;
            }
        }

        Ok(RunSummary {
            rounds: round,
            elapsed: run_start.elapsed(),
            stopped,
        })
    }
}

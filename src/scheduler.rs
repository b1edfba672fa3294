//! Background polling scheduler
//!
//! A tokio task that periodically walks the cached cities, asks the update
//! policy which ones need refreshing, and writes fresh payloads through the
//! store. Runs fixed-delay: each tick starts one full interval after the
//! previous tick began, so a slow tick delays the next rather than
//! overlapping it. Per-city failures are counted and logged, never fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::WeatherStore;
use crate::config::PollingConfig;
use crate::policy::should_update;
use crate::provider::WeatherProvider;

/// How long `stop()` waits for an in-flight tick before force-cancelling
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Counters for one polling tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    /// Cities whose cache entry was refreshed
    pub updated: usize,
    /// Cities where the fetch or cache write failed
    pub failed: usize,
    /// Cities the policy passed over, plus entries dropped for missing data
    pub skipped: usize,
}

/// Outcome of refreshing one city within a tick
enum CityOutcome {
    Updated,
    Failed,
    Skipped,
}

/// Lifecycle of the scheduler: Idle until started, Stopped is terminal
enum SchedulerState {
    Idle,
    Running {
        shutdown_tx: mpsc::Sender<()>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// Periodically refreshes cached cities in the background
///
/// Not restartable: once stopped, a scheduler stays stopped. Starting or
/// stopping twice is a warning-level no-op, never an error.
pub struct PollingScheduler {
    worker: Arc<TickWorker>,
    state: Mutex<SchedulerState>,
}

/// The per-tick refresh logic, shared with the spawned task
struct TickWorker {
    store: Arc<WeatherStore>,
    provider: Arc<dyn WeatherProvider>,
    config: PollingConfig,
    stop_requested: AtomicBool,
    last_tick: Mutex<Option<TickStats>>,
}

impl PollingScheduler {
    /// Creates an idle scheduler over the given store and provider
    pub fn new(
        store: Arc<WeatherStore>,
        provider: Arc<dyn WeatherProvider>,
        config: PollingConfig,
    ) -> Self {
        Self {
            worker: Arc::new(TickWorker {
                store,
                provider,
                config,
                stop_requested: AtomicBool::new(false),
                last_tick: Mutex::new(None),
            }),
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    /// Starts the background polling loop; first tick runs immediately
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut state = self.state.lock().expect("scheduler state lock poisoned");
        match *state {
            SchedulerState::Running { .. } => {
                warn!("Polling scheduler is already running");
                return;
            }
            SchedulerState::Stopped => {
                warn!("Polling scheduler has been stopped and cannot be restarted");
                return;
            }
            SchedulerState::Idle => {}
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let worker = Arc::clone(&self.worker);
        let interval = worker.config.interval;

        let handle = tokio::spawn(async move {
            loop {
                if worker.stop_requested.load(Ordering::SeqCst) {
                    break;
                }
                worker.run_tick().await;

                // Fixed delay: count the interval from the end of the tick's
                // select, not from a fixed-rate schedule
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        *state = SchedulerState::Running {
            shutdown_tx,
            handle,
        };

        info!(
            interval_secs = self.worker.config.interval.as_secs(),
            strategy = ?self.worker.config.strategy,
            ttl_ms = self.worker.config.ttl_millis,
            "Polling scheduler started"
        );
    }

    /// Stops the polling loop, waiting up to a grace period for an in-flight
    /// tick to finish before force-cancelling. Idempotent.
    pub async fn stop(&self) {
        let previous = {
            let mut state = self.state.lock().expect("scheduler state lock poisoned");
            std::mem::replace(&mut *state, SchedulerState::Stopped)
        };

        match previous {
            SchedulerState::Stopped => {}
            SchedulerState::Idle => {
                debug!("Polling scheduler stopped before ever starting");
            }
            SchedulerState::Running {
                shutdown_tx,
                mut handle,
            } => {
                self.worker.stop_requested.store(true, Ordering::SeqCst);
                let _ = shutdown_tx.try_send(());

                tokio::select! {
                    _ = &mut handle => {
                        info!("Polling scheduler stopped");
                    }
                    _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
                        warn!("Polling scheduler did not stop gracefully, cancelling");
                        handle.abort();
                    }
                }
            }
        }
    }

    /// Whether the background loop is currently running
    pub fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().expect("scheduler state lock poisoned"),
            SchedulerState::Running { .. }
        )
    }

    /// Counters from the most recently completed tick, if any
    pub fn last_tick_stats(&self) -> Option<TickStats> {
        *self
            .worker
            .last_tick
            .lock()
            .expect("scheduler stats lock poisoned")
    }

    #[cfg(test)]
    pub(crate) async fn run_tick_for_test(&self) -> TickStats {
        self.worker.run_tick().await
    }
}

impl TickWorker {
    /// One pass over the cached cities; never lets a per-city error escape
    async fn run_tick(&self) -> TickStats {
        let tick_start = Utc::now().timestamp_millis();
        let cities = self.store.keys();
        let mut stats = TickStats::default();

        if cities.is_empty() {
            debug!("No cities in cache to update");
            *self.last_tick.lock().expect("scheduler stats lock poisoned") = Some(stats);
            return stats;
        }

        debug!(cities = cities.len(), "Polling update for cached cities");

        for city in &cities {
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }
            match self.update_city(city, tick_start).await {
                CityOutcome::Updated => stats.updated += 1,
                CityOutcome::Failed => stats.failed += 1,
                CityOutcome::Skipped => stats.skipped += 1,
            }
        }

        let duration_ms = Utc::now().timestamp_millis() - tick_start;
        info!(
            strategy = ?self.config.strategy,
            cities = cities.len(),
            updated = stats.updated,
            failed = stats.failed,
            skipped = stats.skipped,
            duration_ms,
            "Polling tick finished"
        );

        *self.last_tick.lock().expect("scheduler stats lock poisoned") = Some(stats);
        stats
    }

    /// Refreshes a single city if the policy says so
    async fn update_city(&self, city: &str, now_ms: i64) -> CityOutcome {
        if !should_update(
            self.config.strategy,
            &self.store,
            city,
            now_ms,
            self.config.epsilon_millis,
        ) {
            return CityOutcome::Skipped;
        }

        // An entry without coordinates cannot be refreshed; drop it so the
        // next on-demand read re-geocodes from scratch
        let Some(coordinates) = self.store.coordinates(city) else {
            warn!(city, "Coordinates missing from cache, removing entry");
            self.store.remove(city);
            return CityOutcome::Skipped;
        };

        match self.provider.fetch(coordinates).await {
            Ok(payload) => {
                let version = self.provider.version();
                match self.store.refresh(city, payload, version, now_ms) {
                    Ok(()) => {
                        debug!(city, "Weather refreshed");
                        CityOutcome::Updated
                    }
                    Err(err) => {
                        // Entry evicted between snapshot and write-back
                        warn!(city, error = %err, "Refresh write-back failed");
                        CityOutcome::Failed
                    }
                }
            }
            Err(err) => {
                warn!(city, error = %err, "Failed to refresh weather");
                CityOutcome::Failed
            }
        }
    }
}

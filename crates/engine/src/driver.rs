use crate::scheduler::{SampleSet, TickOutcome};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use sampled_core::{ParameterSource, Result, SampleSetConfig, SampleSetEvent, SampleSetReport, Status};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Wall-clock source used by the driver.
pub type ClockFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared, serialized access to one [`SampleSet`].
///
/// Every operation holds the instance lock for its whole duration, so a
/// periodic tick and a management-side preview never interleave.
#[derive(Clone, Debug)]
pub struct SampleSetHandle {
    inner: Arc<Mutex<SampleSet>>,
}

impl SampleSetHandle {
    pub fn new(set: SampleSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(set)),
        }
    }

    /// Direct access for callers that need several operations atomically.
    pub fn lock(&self) -> MutexGuard<'_, SampleSet> {
        self.inner.lock()
    }

    pub fn name(&self) -> String {
        self.inner.lock().name().to_string()
    }

    pub fn status(&self) -> Status {
        self.inner.lock().status()
    }

    pub fn apply(&self, config: SampleSetConfig, now: DateTime<Utc>) -> Result<()> {
        self.inner.lock().apply(config, now)
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Result<TickOutcome> {
        self.inner.lock().tick(now)
    }

    pub fn force_sample(&self, now: DateTime<Utc>) -> Result<bool> {
        self.inner.lock().force_sample(now)
    }

    pub fn report(&self) -> SampleSetReport {
        self.inner.lock().report()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SampleSetEvent> {
        self.inner.lock().subscribe()
    }
}

/// Background task ticking one sample set.
///
/// Sources are read outside the instance lock; the lock is only taken to
/// run the tick and accumulate the readings. Dropping the driver stops it.
pub struct Driver {
    cancel: CancellationToken,
    task:   Option<JoinHandle<()>>,
}

impl Driver {
    /// Spawn a driver ticking every `period` against the system clock.
    pub fn spawn(
        handle: SampleSetHandle,
        sources: Vec<Box<dyn ParameterSource>>,
        period: Duration,
    ) -> Self {
        Self::spawn_with_clock(handle, sources, period, Arc::new(Utc::now))
    }

    pub fn spawn_with_clock(
        handle: SampleSetHandle,
        mut sources: Vec<Box<dyn ParameterSource>>,
        period: Duration,
        clock: ClockFn,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let name = handle.name();

        info!(sample_set = %name, sources = sources.len(), ?period, "driver started");

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(sample_set = %name, "driver stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let readings: Vec<(String, Result<f64>)> = sources
                            .iter_mut()
                            .map(|s| (s.reference().to_string(), s.read()))
                            .collect();
                        let now = clock();

                        // Close elapsed intervals first so readings land in
                        // the interval containing `now`.
                        let mut set = handle.lock();
                        if let Err(e) = set.tick(now) {
                            error!(sample_set = %name, "tick failed: {e}");
                        }
                        for (reference, reading) in readings {
                            if !set.monitors(&reference) {
                                continue;
                            }
                            if let Err(e) = set.observe(&reference, reading) {
                                debug!(sample_set = %name, parameter = %reference, "reading dropped: {e}");
                            }
                        }
                    }
                }
            }
        });

        Self { cancel, task: Some(task) }
    }

    /// `false` once the task has stopped.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop ticking and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("driver task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

//! Sample scheduler: one engine instance per sample set.
//!
//! All state of an instance lives in [`SampleSet`]; callers serialize access
//! (see [`crate::SampleSetHandle`]), so a boundary is never finalized twice
//! and a preview never interleaves with a boundary crossing.

mod preview;

use crate::collector::{latest_value_factory, CollectorFactory, StatisticCollector};
use crate::lifecycle::StatusLifecycle;
use crate::trigger::FetchTrigger;
use chrono::{DateTime, Utc};
use sampled_core::time::{elapsed_seconds, whole_seconds};
use sampled_core::{
    HistoryBuffer, ParameterReport, PhaseAligner, Result, Sample, SampleSetConfig,
    SampleSetError, SampleSetEvent, SampleSetReport, Status,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

/// What a single [`SampleSet::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Boundaries finalized by this tick.
    pub completed: u32,
    /// Fetch pulses emitted by this tick.
    pub triggers: u32,
}

// ── Per-parameter state ───────────────────────────────────────────────────────

struct ParameterState {
    reference:   String,
    collector:   Box<dyn StatisticCollector>,
    history:     HistoryBuffer<Sample>,
    /// The newest history entry is a preview of the open interval.
    provisional: bool,
    failures:    u32,
}

impl ParameterState {
    fn new(reference: &str, capacity: usize, factory: CollectorFactory) -> Self {
        Self {
            reference:   reference.to_string(),
            collector:   factory(reference),
            history:     HistoryBuffer::new(capacity),
            provisional: false,
            failures:    0,
        }
    }

    /// Write into the tail slot, overwriting it if it holds a preview.
    fn store(&mut self, sample: Sample, provisional: bool) {
        if !(self.provisional && self.history.replace_last(sample)) {
            self.history.push(sample);
        }
        self.provisional = provisional;
    }
}

// ── Runtime (exists only while enabled) ──────────────────────────────────────

struct Runtime {
    phase:                  PhaseAligner,
    report_start_time:      DateTime<Utc>,
    report_end_time:        DateTime<Utc>,
    current_interval_start: DateTime<Utc>,
    next_boundary:          DateTime<Utc>,
    /// Set when a backward clock jump re-anchored the open interval.
    interval_suspect:       bool,
    trigger:                FetchTrigger,
    parameters:             Vec<ParameterState>,
}

impl Runtime {
    fn start(config: &SampleSetConfig, now: DateTime<Utc>, factory: CollectorFactory) -> Result<Self> {
        let phase = PhaseAligner::new(config.time_reference, config.sample_interval, now);
        let next_boundary = phase.next_boundary(now)?;
        let cap = capacity(config.report_samples);

        Ok(Self {
            phase,
            report_start_time: now,
            report_end_time: now,
            current_interval_start: now,
            next_boundary,
            interval_suspect: false,
            trigger: FetchTrigger::new(config.fetch_samples, config.report_samples),
            parameters: config
                .parameters
                .iter()
                .map(|r| ParameterState::new(r, cap, factory))
                .collect(),
        })
    }

    /// Treat `now` as authoritative when the clock went backwards.
    fn realign(&mut self, now: DateTime<Utc>, name: &str) -> Result<()> {
        if now >= self.current_interval_start {
            return Ok(());
        }
        let fault = SampleSetError::Scheduling(format!(
            "clock moved back from {} to {now}",
            self.current_interval_start
        ));
        warn!(sample_set = name, %fault, "re-anchoring open interval");

        self.current_interval_start = now;
        self.next_boundary = self.phase.next_boundary(now)?;
        self.interval_suspect = true;
        Ok(())
    }

    /// Finalize the interval ending at `next_boundary` and advance past it.
    fn close_interval(&mut self) -> Result<(DateTime<Utc>, u32)> {
        let boundary = self.next_boundary;
        let elapsed = elapsed_seconds(self.current_interval_start, boundary);

        for param in &mut self.parameters {
            let mut sample = param.collector.finalize(elapsed, false);
            sample.suspect |= self.interval_suspect;
            param.store(sample, false);
        }

        self.current_interval_start = boundary;
        self.next_boundary = self.phase.next_boundary(boundary)?;
        self.interval_suspect = false;
        self.report_end_time = self.report_end_time.max(boundary);
        Ok((boundary, elapsed))
    }

    fn resize(&mut self, report_samples: u32) {
        let cap = capacity(report_samples);
        for param in &mut self.parameters {
            param.history.resize(cap);
        }
    }

    /// Keep state for parameters still listed, add fresh state for new ones.
    fn retain_parameters(&mut self, references: &[String], report_samples: u32, factory: CollectorFactory) {
        let cap = capacity(report_samples);
        let mut old = std::mem::take(&mut self.parameters);
        self.parameters = references
            .iter()
            .map(|r| match old.iter().position(|p| &p.reference == r) {
                Some(i) => old.swap_remove(i),
                None => ParameterState::new(r, cap, factory),
            })
            .collect();
    }
}

fn capacity(report_samples: u32) -> usize {
    usize::try_from(report_samples).unwrap_or(usize::MAX)
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Periodic statistics engine for one sample set.
///
/// Time is always passed in by the caller, so the engine is fully
/// deterministic; the async [`crate::Driver`] supplies wall-clock ticks.
pub struct SampleSet {
    config:    SampleSetConfig,
    lifecycle: StatusLifecycle,
    runtime:   Option<Runtime>,
    factory:   CollectorFactory,
    events:    broadcast::Sender<SampleSetEvent>,
}

impl std::fmt::Debug for SampleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSet")
            .field("name", &self.config.name)
            .field("status", &self.lifecycle.status())
            .field("next_boundary", &self.next_boundary())
            .finish()
    }
}

impl SampleSet {
    /// Create an engine that keeps the latest observation per interval.
    pub fn new(config: SampleSetConfig, now: DateTime<Utc>) -> Result<Self> {
        Self::with_collectors(config, now, latest_value_factory)
    }

    /// Create an engine with a custom collector per parameter.
    pub fn with_collectors(
        config: SampleSetConfig,
        now: DateTime<Utc>,
        factory: CollectorFactory,
    ) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut set = Self {
            config: SampleSetConfig {
                enable: false,
                force_sample: false,
                ..config.clone()
            },
            lifecycle: StatusLifecycle::new(),
            runtime: None,
            factory,
            events,
        };
        set.apply(config, now)?;
        Ok(set)
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// Apply a new configuration.
    ///
    /// Invalid configurations are rejected and leave the engine untouched.
    /// Enabling, or changing the interval or time reference while enabled,
    /// restarts collection; other changes keep collected history.
    pub fn apply(&mut self, config: SampleSetConfig, now: DateTime<Utc>) -> Result<()> {
        config.validate()?;
        let now = whole_seconds(now);
        let previous = std::mem::replace(&mut self.config, config);
        let force_edge = !previous.force_sample && self.config.force_sample;

        if self.lifecycle.status() == Status::Error {
            debug!(sample_set = %self.config.name, "configuration stored; waiting for reset");
            return Ok(());
        }

        let mut pending = Vec::new();
        let result = match (self.runtime.is_some(), self.config.enable) {
            (false, true) => self.start(now, &mut pending),
            (true, false) => {
                self.stop(&mut pending);
                Ok(())
            }
            (true, true) => self.reconfigure(&previous, now, &mut pending),
            (false, false) => Ok(()),
        };
        self.publish(pending);
        result.map_err(|e| self.escalate(e))?;

        if force_edge {
            self.force_sample(now)?;
        }
        Ok(())
    }

    fn start(&mut self, now: DateTime<Utc>, pending: &mut Vec<SampleSetEvent>) -> Result<()> {
        let runtime = Runtime::start(&self.config, now, self.factory)?;
        info!(
            sample_set = %self.config.name,
            interval = self.config.sample_interval,
            report_samples = self.config.report_samples,
            fetch_samples = self.config.fetch_samples,
            next_boundary = %runtime.next_boundary,
            "collection started",
        );

        self.runtime = Some(runtime);
        pending.extend(self.lifecycle.enable());
        pending.push(SampleSetEvent::Reset { at: now });
        Ok(())
    }

    fn stop(&mut self, pending: &mut Vec<SampleSetEvent>) {
        self.runtime = None;
        pending.extend(self.lifecycle.disable());
        info!(sample_set = %self.config.name, "collection stopped");
    }

    fn reconfigure(
        &mut self,
        previous: &SampleSetConfig,
        now: DateTime<Utc>,
        pending: &mut Vec<SampleSetEvent>,
    ) -> Result<()> {
        let config = &self.config;
        if previous.sample_interval != config.sample_interval
            || previous.time_reference != config.time_reference
        {
            info!(sample_set = %config.name, "interval grid changed; restarting collection");
            return self.start(now, pending);
        }

        let Some(rt) = self.runtime.as_mut() else {
            return Ok(());
        };

        if previous.report_samples != config.report_samples {
            debug!(
                sample_set = %config.name,
                from = previous.report_samples,
                to = config.report_samples,
                "resizing history",
            );
            rt.resize(config.report_samples);
        }
        if previous.fetch_samples != config.fetch_samples
            || previous.report_samples != config.report_samples
        {
            rt.trigger.reconfigure(config.fetch_samples, config.report_samples);
        }
        if previous.parameters != config.parameters {
            rt.retain_parameters(&config.parameters, config.report_samples, self.factory);
        }
        Ok(())
    }

    // ── Collection ────────────────────────────────────────────────────────────

    /// Feed one read result for a monitored parameter.
    ///
    /// A failed read counts as "no data" for that read and is only logged.
    /// Ignored while the sample set is not collecting.
    pub fn observe(&mut self, reference: &str, reading: Result<f64>) -> Result<()> {
        let Some(rt) = self.runtime.as_mut() else {
            return Ok(());
        };
        let param = rt
            .parameters
            .iter_mut()
            .find(|p| p.reference == reference)
            .ok_or_else(|| SampleSetError::UnknownParameter(reference.to_string()))?;

        match reading {
            Ok(value) => param.collector.accumulate(value),
            Err(err) => {
                param.failures = param.failures.saturating_add(1);
                param.collector.record_fault();
                warn!(
                    sample_set = %self.config.name,
                    parameter = reference,
                    error = %err,
                    "read failed; treating as no data",
                );
            }
        }
        Ok(())
    }

    pub fn accumulate(&mut self, reference: &str, value: f64) -> Result<()> {
        self.observe(reference, Ok(value))
    }

    /// Finalize every boundary that `now` has reached, in order.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        let now = whole_seconds(now);
        let mut pending = Vec::new();
        let result = self.advance(now, &mut pending);
        self.publish(pending);
        result.map_err(|e| self.escalate(e))
    }

    fn advance(&mut self, now: DateTime<Utc>, pending: &mut Vec<SampleSetEvent>) -> Result<TickOutcome> {
        let mut outcome = TickOutcome::default();
        let Some(rt) = self.runtime.as_mut() else {
            return Ok(outcome);
        };
        let name = self.config.name.as_str();
        rt.realign(now, name)?;

        while now >= rt.next_boundary {
            let (boundary, sample_seconds) = rt.close_interval()?;
            outcome.completed += 1;
            pending.push(SampleSetEvent::IntervalCompleted { boundary, sample_seconds });

            if rt.trigger.on_interval_completed() {
                let completed = rt.trigger.completed();
                let pulse = self.lifecycle.pulse(boundary, completed);
                if !pulse.is_empty() {
                    outcome.triggers += 1;
                    info!(sample_set = name, at = %boundary, completed, "fetch trigger");
                }
                pending.extend(pulse);
            }
        }

        match outcome.completed {
            0 => {}
            1 => debug!(sample_set = name, next_boundary = %rt.next_boundary, "interval closed"),
            n => warn!(
                sample_set = name,
                finalized = n,
                "late tick; finalized each elapsed boundary",
            ),
        }
        Ok(outcome)
    }

    // ── Faults ────────────────────────────────────────────────────────────────

    /// Signal an unrecoverable fault: status becomes `Error` and collection
    /// halts until [`Self::reset`].
    pub fn mark_error(&mut self, reason: &str) {
        self.enter_error(&SampleSetError::Fatal(reason.to_string()));
    }

    /// Clear `Error` and restart from the stored configuration. No-op in any
    /// other state.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<()> {
        let mut pending: Vec<SampleSetEvent> = self.lifecycle.clear_error().into_iter().collect();
        if pending.is_empty() {
            return Ok(());
        }
        info!(sample_set = %self.config.name, "error cleared");

        let result = if self.config.enable {
            self.start(whole_seconds(now), &mut pending)
        } else {
            Ok(())
        };
        self.publish(pending);
        result.map_err(|e| self.escalate(e))
    }

    fn escalate(&mut self, err: SampleSetError) -> SampleSetError {
        if matches!(err, SampleSetError::Fatal(_)) {
            self.enter_error(&err);
        }
        err
    }

    fn enter_error(&mut self, err: &SampleSetError) {
        error!(sample_set = %self.config.name, %err, "halting collection");
        self.runtime = None;
        let event = self.lifecycle.fail();
        self.publish(event);
    }

    // ── Observers ─────────────────────────────────────────────────────────────

    fn publish(&self, events: impl IntoIterator<Item = SampleSetEvent>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Stream of every event this engine publishes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SampleSetEvent> {
        self.events.subscribe()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SampleSetConfig {
        &self.config
    }

    /// Best-effort status; a `Trigger` pulse is only visible as an event.
    pub fn status(&self) -> Status {
        self.lifecycle.status()
    }

    pub fn monitors(&self, reference: &str) -> bool {
        self.config.parameters.iter().any(|p| p == reference)
    }

    /// Next boundary to be finalized; `None` when not collecting.
    pub fn next_boundary(&self) -> Option<DateTime<Utc>> {
        self.runtime.as_ref().map(|rt| rt.next_boundary)
    }

    pub fn current_interval_start(&self) -> Option<DateTime<Utc>> {
        self.runtime.as_ref().map(|rt| rt.current_interval_start)
    }

    /// Intervals finalized since collection last (re)started.
    pub fn completed_intervals(&self) -> u64 {
        self.runtime.as_ref().map_or(0, |rt| rt.trigger.completed())
    }

    /// Read-only snapshot for the reporting layer.
    pub fn report(&self) -> SampleSetReport {
        let rt = self.runtime.as_ref();
        let parameters = match rt {
            Some(rt) => rt
                .parameters
                .iter()
                .map(|p| ParameterReport::from_samples(&p.reference, p.history.iter(), p.failures))
                .collect(),
            None => self
                .config
                .parameters
                .iter()
                .map(|r| ParameterReport::from_samples(r, std::iter::empty(), 0))
                .collect(),
        };

        SampleSetReport {
            name:              self.config.name.clone(),
            status:            self.lifecycle.status(),
            sample_interval:   self.config.sample_interval,
            report_samples:    self.config.report_samples,
            fetch_samples:     self.config.fetch_samples,
            report_start_time: rt.map(|rt| rt.report_start_time),
            report_end_time:   rt.map(|rt| rt.report_end_time),
            parameters,
        }
    }
}

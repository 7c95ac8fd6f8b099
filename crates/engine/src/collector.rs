use sampled_core::Sample;

/// Per-parameter accumulator for the open sample interval.
///
/// The aggregation rule belongs to the implementation. The engine only
/// relies on two things: whether anything was observed, and that a
/// non-preview `finalize` closes the interval.
pub trait StatisticCollector: Send {
    /// Record an observation for the open interval.
    fn accumulate(&mut self, value: f64);

    /// Record that a read for the open interval failed.
    fn record_fault(&mut self);

    /// Produce the value to store for an interval covering `elapsed_seconds`.
    ///
    /// A preview finalize is provisional and leaves the accumulated state in
    /// place; a non-preview finalize resets it for the next interval.
    fn finalize(&mut self, elapsed_seconds: u32, is_preview: bool) -> Sample;
}

/// Builds a collector for a parameter path.
pub type CollectorFactory = fn(&str) -> Box<dyn StatisticCollector>;

/// Default factory: every parameter keeps its latest observation.
pub fn latest_value_factory(_reference: &str) -> Box<dyn StatisticCollector> {
    Box::new(LatestValue::default())
}

/// Stores the most recent observation; falls back to `default` when the
/// interval saw none.
#[derive(Debug, Clone, Default)]
pub struct LatestValue {
    latest:  Option<f64>,
    faults:  u32,
    default: f64,
}

impl LatestValue {
    pub fn with_default(default: f64) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }
}

impl StatisticCollector for LatestValue {
    fn accumulate(&mut self, value: f64) {
        self.latest = Some(value);
    }

    fn record_fault(&mut self) {
        self.faults = self.faults.saturating_add(1);
    }

    fn finalize(&mut self, elapsed_seconds: u32, is_preview: bool) -> Sample {
        let sample = Sample {
            value:          self.latest.unwrap_or(self.default),
            sample_seconds: elapsed_seconds,
            suspect:        self.faults > 0,
        };
        if !is_preview {
            self.latest = None;
            self.faults = 0;
        }
        sample
    }
}

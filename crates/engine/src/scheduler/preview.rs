//! ForceSample "sneak preview" of the open interval.

use super::{Runtime, SampleSet};
use chrono::{DateTime, Utc};
use sampled_core::time::{elapsed_seconds, whole_seconds};
use sampled_core::{Result, SampleSetEvent};
use tracing::debug;

impl Runtime {
    /// Write a provisional sample for the open interval into each tail slot.
    ///
    /// Leaves the interval start, next boundary and fetch count untouched.
    fn preview(&mut self, now: DateTime<Utc>) -> u32 {
        let elapsed = elapsed_seconds(self.current_interval_start, now);
        for param in &mut self.parameters {
            let mut sample = param.collector.finalize(elapsed, true);
            sample.suspect |= self.interval_suspect;
            param.store(sample, true);
        }
        self.report_end_time = self.report_end_time.max(now);
        elapsed
    }
}

impl SampleSet {
    /// Refresh the provisional tail entry of every parameter with the data
    /// collected so far in the open interval.
    ///
    /// Boundaries already reached by `now` are finalized first, so the
    /// preview always belongs to the interval that is actually open.
    /// Returns `false` when the sample set is not collecting.
    pub fn force_sample(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let now = whole_seconds(now);
        self.tick(now)?;

        let Some(rt) = self.runtime.as_mut() else {
            debug!(sample_set = %self.config.name, "force sample ignored; not collecting");
            return Ok(false);
        };
        let elapsed = rt.preview(now);
        debug!(sample_set = %self.config.name, elapsed, "preview written");

        self.publish([SampleSetEvent::Preview { at: now }]);
        Ok(true)
    }
}

//! Interval boundary arithmetic.
//!
//! All instants handled by the engine are truncated to whole seconds; sample
//! intervals are whole seconds as well, so boundaries are exact.

use crate::error::{Result, SampleSetError};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

/// Drop the sub-second part of an instant.
#[must_use]
pub fn whole_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(0)
}

/// Smallest boundary `b > current_start` with `(b - reference) mod interval == 0`.
pub fn next_boundary(
    reference: DateTime<Utc>,
    interval_seconds: u32,
    current_start: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let interval = i64::from(interval_seconds.max(1));
    let offset = (whole_seconds(current_start) - whole_seconds(reference)).num_seconds();
    let k = offset.div_euclid(interval) + 1;
    let step = k * interval - offset;

    whole_seconds(current_start)
        .checked_add_signed(TimeDelta::seconds(step))
        .ok_or_else(|| {
            SampleSetError::Fatal(format!("interval boundary after {current_start} overflows"))
        })
}

/// Whole seconds between two instants, clamped to `u32`.
#[must_use]
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let secs = (whole_seconds(to) - whole_seconds(from)).num_seconds();
    u32::try_from(secs.max(0)).unwrap_or(u32::MAX)
}

/// Fixed phase for one enabled run of a sample set.
///
/// With a known time reference the grid is anchored there. Without one the
/// grid is anchored at the enable instant, so every interval is full-length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseAligner {
    reference: DateTime<Utc>,
    interval_seconds: u32,
}

impl PhaseAligner {
    pub fn new(
        time_reference: Option<DateTime<Utc>>,
        interval_seconds: u32,
        enabled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reference: whole_seconds(time_reference.unwrap_or(enabled_at)),
            interval_seconds: interval_seconds.max(1),
        }
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    /// Next boundary strictly after `current_start`.
    pub fn next_boundary(&self, current_start: DateTime<Utc>) -> Result<DateTime<Utc>> {
        next_boundary(self.reference, self.interval_seconds, current_start)
    }
}

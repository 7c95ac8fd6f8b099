use crate::state::Status;
use chrono::{DateTime, Utc};

/// Notifications published by a sample set engine.
///
/// Sources:
/// - Scheduler boundary crossing → `IntervalCompleted`, `Trigger`
/// - Preview request             → `Preview`
/// - Enable / reconfiguration    → `Reset`, `StatusChanged`
///
/// A fetch pulse is always published as the sequence
/// `StatusChanged(Enabled → Trigger)`, `Trigger`, `StatusChanged(Trigger → Enabled)`.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleSetEvent {
    // ── Lifecycle ─────────────────────────────────────────────────────────────
    /// Status moved between two states.
    StatusChanged { from: Status, to: Status },
    /// History cleared and collection restarted at `at`.
    Reset { at: DateTime<Utc> },

    // ── Scheduler ─────────────────────────────────────────────────────────────
    /// A sample interval closed at `boundary`.
    IntervalCompleted { boundary: DateTime<Utc>, sample_seconds: u32 },
    /// A fetch interval completed; remote readers should collect now.
    Trigger { at: DateTime<Utc>, completed_intervals: u64 },

    // ── Preview ───────────────────────────────────────────────────────────────
    /// Provisional tail refreshed for the open interval.
    Preview { at: DateTime<Utc> },
}

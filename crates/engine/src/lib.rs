//! Periodic statistics sample set engine.
//!
//! Leaves first:
//! - [`collector`] — per-parameter accumulation for the open interval
//! - [`trigger`]   — fetch pulse counting
//! - [`lifecycle`] — status state machine
//! - [`scheduler`] — boundary crossing, history, previews
//! - [`driver`]    — serialized async ticking of one instance

pub mod collector;
pub mod driver;
pub mod lifecycle;
pub mod scheduler;
pub mod trigger;

pub use collector::{latest_value_factory, CollectorFactory, LatestValue, StatisticCollector};
pub use driver::{ClockFn, Driver, SampleSetHandle};
pub use lifecycle::StatusLifecycle;
pub use scheduler::{SampleSet, TickOutcome};
pub use trigger::FetchTrigger;

pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod source;
pub mod state;
pub mod time;

pub use config::SampleSetConfig;
pub use error::{Result, SampleSetError};
pub use event::SampleSetEvent;
pub use history::HistoryBuffer;
pub use source::{FnSource, ParameterSource};
pub use state::{ParameterReport, Sample, SampleSetReport, Status};
pub use time::PhaseAligner;

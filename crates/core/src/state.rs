use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible status of one sample set.
///
/// `Trigger` is a zero-duration pulse; pollers will normally only ever see
/// the other three states. Observers that must not miss a pulse subscribe to
/// [`crate::SampleSetEvent`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Disabled,
    Enabled,
    Trigger,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disabled => "Disabled",
            Self::Enabled  => "Enabled",
            Self::Trigger  => "Trigger",
            Self::Error    => "Error",
        };
        f.write_str(s)
    }
}

/// One stored history entry for a monitored parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    /// Seconds actually covered by this sample (≤ the sample interval).
    pub sample_seconds: u32,
    /// At least one read failed, or the interval was re-anchored by a clock jump.
    pub suspect: bool,
}

/// Read-only view of one monitored parameter's history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterReport {
    pub reference: String,
    pub values: Vec<f64>,
    pub sample_seconds: Vec<u32>,
    pub suspect_data: Vec<bool>,
    /// Value reads that failed since the sample set was (re)started.
    pub failures: u32,
}

impl ParameterReport {
    /// Build a report from an oldest-first sample sequence.
    pub fn from_samples<'a>(
        reference: impl Into<String>,
        samples: impl IntoIterator<Item = &'a Sample>,
        failures: u32,
    ) -> Self {
        let mut report = Self {
            reference: reference.into(),
            failures,
            ..Self::default()
        };
        for sample in samples {
            report.values.push(sample.value);
            report.sample_seconds.push(sample.sample_seconds);
            report.suspect_data.push(sample.suspect);
        }
        report
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Point-in-time snapshot of a sample set, handed to the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSetReport {
    pub name: String,
    pub status: Status,
    pub sample_interval: u32,
    pub report_samples: u32,
    pub fetch_samples: u32,
    /// `None` while disabled.
    pub report_start_time: Option<DateTime<Utc>>,
    /// `None` while disabled.
    pub report_end_time: Option<DateTime<Utc>>,
    pub parameters: Vec<ParameterReport>,
}

impl SampleSetReport {
    /// Look up a parameter's history by its path.
    #[must_use]
    pub fn parameter(&self, reference: &str) -> Option<&ParameterReport> {
        self.parameters.iter().find(|p| p.reference == reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_disabled() {
        assert_eq!(Status::default(), Status::Disabled);
        assert_eq!(Status::Trigger.to_string(), "Trigger");
    }

    #[test]
    fn parameter_report_splits_columns() {
        let samples = [
            Sample { value: 1.0, sample_seconds: 10, suspect: false },
            Sample { value: 2.5, sample_seconds: 60, suspect: true },
        ];
        let report = ParameterReport::from_samples("Device.X", &samples, 3);
        assert_eq!(report.values, vec![1.0, 2.5]);
        assert_eq!(report.sample_seconds, vec![10, 60]);
        assert_eq!(report.suspect_data, vec![false, true]);
        assert_eq!(report.failures, 3);
        assert_eq!(report.len(), 2);
    }
}

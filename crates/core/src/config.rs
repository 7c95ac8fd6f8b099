use crate::error::{Result, SampleSetError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration of one sample set, applied as a whole.
///
/// Defaults follow the data model: hourly samples, one day of history and
/// no fetch pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSetConfig {
    /// Instance key; must be unique within a configuration file.
    pub name: String,
    pub enable: bool,
    /// Sample interval in seconds (≥ 1).
    pub sample_interval: u32,
    /// History capacity per parameter (≥ 1).
    pub report_samples: u32,
    /// Phase reference for interval boundaries; `None` means Unknown.
    pub time_reference: Option<DateTime<Utc>>,
    /// Completed intervals per fetch pulse; `0` disables the pulse.
    pub fetch_samples: u32,
    /// Edge-triggered: a `false → true` transition requests a preview.
    pub force_sample: bool,
    /// Monitored parameter paths, in report order.
    pub parameters: Vec<String>,
}

impl Default for SampleSetConfig {
    fn default() -> Self {
        Self {
            name:            String::new(),
            enable:          false,
            sample_interval: 3600,
            report_samples:  24,
            time_reference:  None,
            fetch_samples:   0,
            force_sample:    false,
            parameters:      Vec::new(),
        }
    }
}

impl SampleSetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reject invalid parameter combinations.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SampleSetError::Config("sample set name must not be empty".into()));
        }
        if self.sample_interval < 1 {
            return Err(SampleSetError::Config(format!(
                "'{}': sample_interval must be >= 1",
                self.name
            )));
        }
        if self.report_samples < 1 {
            return Err(SampleSetError::Config(format!(
                "'{}': report_samples must be >= 1",
                self.name
            )));
        }

        let mut seen = HashSet::with_capacity(self.parameters.len());
        for reference in &self.parameters {
            if reference.trim().is_empty() {
                return Err(SampleSetError::Config(format!(
                    "'{}': parameter reference must not be empty",
                    self.name
                )));
            }
            if !seen.insert(reference.as_str()) {
                return Err(SampleSetError::Config(format!(
                    "'{}': parameter '{reference}' listed twice",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Whether the fetch pulse can ever fire under this configuration.
    #[must_use]
    pub fn fetch_pulse_active(&self) -> bool {
        self.fetch_samples >= 1 && self.fetch_samples <= self.report_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SampleSetConfig {
        SampleSetConfig {
            parameters: vec!["Device.A".into(), "Device.B".into()],
            ..SampleSetConfig::new("wan")
        }
    }

    #[test]
    fn defaults_match_data_model() {
        let cfg = SampleSetConfig::default();
        assert!(!cfg.enable);
        assert_eq!(cfg.sample_interval, 3600);
        assert_eq!(cfg.report_samples, 24);
        assert_eq!(cfg.fetch_samples, 0);
        assert!(cfg.time_reference.is_none());
    }

    #[test]
    fn accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_zero_report_samples() {
        let cfg = SampleSetConfig { report_samples: 0, ..valid() };
        assert!(matches!(cfg.validate(), Err(SampleSetError::Config(_))));
    }

    #[test]
    fn rejects_zero_interval() {
        let cfg = SampleSetConfig { sample_interval: 0, ..valid() };
        assert!(matches!(cfg.validate(), Err(SampleSetError::Config(_))));
    }

    #[test]
    fn rejects_duplicate_parameters() {
        let cfg = SampleSetConfig {
            parameters: vec!["Device.A".into(), "Device.A".into()],
            ..valid()
        };
        assert!(matches!(cfg.validate(), Err(SampleSetError::Config(_))));
    }

    #[test]
    fn fetch_pulse_bounds() {
        let mut cfg = valid();
        cfg.report_samples = 25;
        cfg.fetch_samples = 0;
        assert!(!cfg.fetch_pulse_active());
        cfg.fetch_samples = 24;
        assert!(cfg.fetch_pulse_active());
        cfg.fetch_samples = 26;
        assert!(!cfg.fetch_pulse_active());
    }

    #[test]
    fn time_reference_round_trips_as_rfc3339() {
        let json = r#"{"name":"x","time_reference":"2024-01-01T00:00:00Z"}"#;
        let cfg: SampleSetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            cfg.time_reference.map(|t| t.timestamp()),
            Some(1_704_067_200)
        );
        assert_eq!(cfg.report_samples, 24);
    }
}

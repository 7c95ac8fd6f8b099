use sampled_core::{Result, SampleSetConfig, SampleSetError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Root configuration structure parsed from `sampled.toml`.
///
/// ```toml
/// [global]
/// tick_ms = 1000
///
/// [[sample_set]]
/// name = "cpu"
/// enable = true
/// sample_interval = 60
/// report_samples = 60
/// fetch_samples = 15
/// time_reference = "2024-01-01T00:00:00Z"
/// parameters = ["Device.DeviceInfo.ProcessStatus.CPUUsage"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Daemon-wide settings.
    pub global: GlobalConfig,
    /// One entry per sample set instance.
    #[serde(rename = "sample_set")]
    pub sample_sets: Vec<SampleSetConfig>,
}

impl DaemonConfig {
    /// Check every sample set and the daemon settings.
    pub fn validate(&self) -> Result<()> {
        if self.global.tick_ms == 0 {
            return Err(SampleSetError::Config("global.tick_ms must be >= 1".into()));
        }

        let mut names = HashSet::with_capacity(self.sample_sets.len());
        for set in &self.sample_sets {
            set.validate()?;
            if !names.insert(set.name.as_str()) {
                return Err(SampleSetError::Config(format!(
                    "sample set '{}' defined twice",
                    set.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a sample set by name.
    pub fn sample_set(&self, name: &str) -> Option<&SampleSetConfig> {
        self.sample_sets.iter().find(|s| s.name == name)
    }
}

/// Daemon-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Driver tick period in milliseconds. Must be shorter than the
    /// smallest sample interval for boundaries to be finalized on time.
    pub tick_ms: u64,
    /// Directory receiving a JSON report on every fetch pulse.
    pub report_dir: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            tick_ms:    1_000,
            report_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SAMPLE: &str = r#"
        [global]
        tick_ms = 500
        report_dir = "/var/lib/sampled"

        [[sample_set]]
        name = "cpu"
        enable = true
        sample_interval = 60
        report_samples = 60
        fetch_samples = 15
        time_reference = "2024-01-01T00:00:00Z"
        parameters = ["Device.DeviceInfo.ProcessStatus.CPUUsage"]

        [[sample_set]]
        name = "memory"
        parameters = ["Device.DeviceInfo.MemoryStatus.Free"]
    "#;

    #[test]
    fn parses_full_file() {
        let cfg: DaemonConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.global.tick_ms, 500);
        assert_eq!(cfg.global.report_dir, Some(PathBuf::from("/var/lib/sampled")));
        assert_eq!(cfg.sample_sets.len(), 2);

        let cpu = cfg.sample_set("cpu").unwrap();
        assert!(cpu.enable);
        assert_eq!(cpu.fetch_samples, 15);
        assert_eq!(
            cpu.time_reference,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg: DaemonConfig = toml::from_str(SAMPLE).unwrap();
        let memory = cfg.sample_set("memory").unwrap();
        assert!(!memory.enable);
        assert_eq!(memory.sample_interval, 3600);
        assert_eq!(memory.report_samples, 24);
        assert_eq!(memory.time_reference, None);
    }

    #[test]
    fn empty_file_is_default() {
        let cfg: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, DaemonConfig::default());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut cfg: DaemonConfig = toml::from_str(SAMPLE).unwrap();
        cfg.sample_sets[1].name = "cpu".into();
        assert!(matches!(cfg.validate(), Err(SampleSetError::Config(_))));
    }

    #[test]
    fn rejects_zero_report_samples() {
        let mut cfg: DaemonConfig = toml::from_str(SAMPLE).unwrap();
        cfg.sample_sets[0].report_samples = 0;
        assert!(matches!(cfg.validate(), Err(SampleSetError::Config(_))));
    }
}

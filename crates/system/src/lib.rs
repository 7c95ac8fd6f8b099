//! Parameter sources for the local managed endpoint.
//!
//! Maps data-model parameter paths to value-read callbacks backed by
//! `sysinfo` and sysfs.

pub mod battery;
pub mod cpu;
pub mod memory;
pub mod network;

pub use battery::BatterySource;
pub use cpu::CpuUsageSource;
pub use memory::{MemoryField, MemorySource};
pub use network::{Direction, NetworkSource};

use sampled_core::{ParameterSource, Result, SampleSetError};
use sysinfo::System;
use tracing::warn;

/// `Device.DeviceInfo.UpTime`: seconds since boot.
pub struct UptimeSource;

impl UptimeSource {
    pub const REFERENCE: &'static str = "Device.DeviceInfo.UpTime";
}

impl ParameterSource for UptimeSource {
    fn reference(&self) -> &str {
        Self::REFERENCE
    }

    fn read(&mut self) -> Result<f64> {
        Ok(System::uptime() as f64)
    }
}

/// Every parameter path this crate can read.
pub const SUPPORTED: &[&str] = &[
    CpuUsageSource::REFERENCE,
    "Device.DeviceInfo.MemoryStatus.Total",
    "Device.DeviceInfo.MemoryStatus.Free",
    UptimeSource::REFERENCE,
    "Device.DeviceInfo.X_SAMPLED_Network.BytesReceived",
    "Device.DeviceInfo.X_SAMPLED_Network.BytesSent",
    BatterySource::REFERENCE,
];

/// Build the source for a parameter path.
pub fn resolve(reference: &str) -> Result<Box<dyn ParameterSource>> {
    let source: Box<dyn ParameterSource> = match reference {
        CpuUsageSource::REFERENCE => Box::new(CpuUsageSource::new()),
        "Device.DeviceInfo.MemoryStatus.Total" => Box::new(MemorySource::new(MemoryField::Total)),
        "Device.DeviceInfo.MemoryStatus.Free" => Box::new(MemorySource::new(MemoryField::Free)),
        UptimeSource::REFERENCE => Box::new(UptimeSource),
        "Device.DeviceInfo.X_SAMPLED_Network.BytesReceived" => {
            Box::new(NetworkSource::new(Direction::Received))
        }
        "Device.DeviceInfo.X_SAMPLED_Network.BytesSent" => Box::new(NetworkSource::new(Direction::Sent)),
        BatterySource::REFERENCE => Box::new(BatterySource::new()),
        other => return Err(SampleSetError::UnknownParameter(other.to_string())),
    };
    Ok(source)
}

/// Sources for every resolvable path in `references`.
///
/// Unknown paths are logged and skipped; those parameters simply record the
/// default value each interval.
pub fn sources_for<'a>(references: impl IntoIterator<Item = &'a String>) -> Vec<Box<dyn ParameterSource>> {
    references
        .into_iter()
        .filter_map(|r| match resolve(r) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("{e}; no source available");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_path_resolves() {
        for reference in SUPPORTED {
            let source = resolve(reference).unwrap();
            assert_eq!(source.reference(), *reference);
        }
    }

    #[test]
    fn unknown_path_is_rejected() {
        assert!(matches!(
            resolve("Device.Services.VoiceService.1.Foo"),
            Err(SampleSetError::UnknownParameter(_))
        ));
    }

    #[test]
    fn sources_for_skips_unknown() {
        let refs = vec![
            UptimeSource::REFERENCE.to_string(),
            "Device.Nope".to_string(),
        ];
        let sources = sources_for(&refs);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].reference(), UptimeSource::REFERENCE);
    }

    #[test]
    fn uptime_is_positive() {
        assert!(UptimeSource.read().unwrap() >= 0.0);
    }
}

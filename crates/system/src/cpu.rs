use sampled_core::{ParameterSource, Result};
use sysinfo::System;

/// `Device.DeviceInfo.ProcessStatus.CPUUsage`: average CPU usage across all
/// cores, in percent.
///
/// Usage is a delta between two refreshes, so the first read after
/// construction reports whatever sysinfo measured since `new`.
pub struct CpuUsageSource {
    sys: System,
}

impl CpuUsageSource {
    pub const REFERENCE: &'static str = "Device.DeviceInfo.ProcessStatus.CPUUsage";

    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        Self { sys }
    }
}

impl Default for CpuUsageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSource for CpuUsageSource {
    fn reference(&self) -> &str {
        Self::REFERENCE
    }

    fn read(&mut self) -> Result<f64> {
        self.sys.refresh_cpu_usage();
        Ok(f64::from(self.sys.global_cpu_usage()).clamp(0.0, 100.0))
    }
}

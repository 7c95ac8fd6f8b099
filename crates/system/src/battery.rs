use sampled_core::{ParameterSource, Result, SampleSetError};
use std::path::{Path, PathBuf};

const POWER_SUPPLY: &str = "/sys/class/power_supply";

/// Battery charge in percent, read from the Linux sysfs power-supply class.
///
/// Fails with a collection fault on hosts without a battery (desktop, VM).
pub struct BatterySource {
    root: PathBuf,
}

impl BatterySource {
    pub const REFERENCE: &'static str = "Device.DeviceInfo.X_SAMPLED_Battery.Percent";

    pub fn new() -> Self {
        Self::with_root(POWER_SUPPLY)
    }

    /// Read from an alternate sysfs root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for BatterySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSource for BatterySource {
    fn reference(&self) -> &str {
        Self::REFERENCE
    }

    fn read(&mut self) -> Result<f64> {
        read_capacity(&self.root).map(f64::from)
    }
}

/// Capacity of the first battery found under `root`.
fn read_capacity(root: &Path) -> Result<u8> {
    for name in ["BAT0", "BAT1", "BAT2"] {
        let base = root.join(name);
        if !base.exists() {
            continue;
        }

        let raw = std::fs::read_to_string(base.join("capacity"))?;
        return raw.trim().parse::<u8>().map_err(|e| {
            SampleSetError::Collection(format!("{}: bad capacity '{}': {e}", name, raw.trim()))
        });
    }
    Err(SampleSetError::Collection("no battery present".into()))
}

use sampled_core::{ParameterSource, Result, SampleSetError};
use sysinfo::System;

/// Which memory figure a [`MemorySource`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryField {
    /// `Device.DeviceInfo.MemoryStatus.Total`
    Total,
    /// `Device.DeviceInfo.MemoryStatus.Free`
    Free,
}

impl MemoryField {
    pub fn reference(self) -> &'static str {
        match self {
            Self::Total => "Device.DeviceInfo.MemoryStatus.Total",
            Self::Free  => "Device.DeviceInfo.MemoryStatus.Free",
        }
    }
}

/// Physical memory in KiB, as the data model expresses it.
pub struct MemorySource {
    field: MemoryField,
    sys:   System,
}

impl MemorySource {
    pub fn new(field: MemoryField) -> Self {
        Self {
            field,
            sys: System::new(),
        }
    }
}

impl ParameterSource for MemorySource {
    fn reference(&self) -> &str {
        self.field.reference()
    }

    fn read(&mut self) -> Result<f64> {
        self.sys.refresh_memory();
        let bytes = match self.field {
            MemoryField::Total => self.sys.total_memory(),
            MemoryField::Free  => self.sys.available_memory(),
        };
        if self.sys.total_memory() == 0 {
            return Err(SampleSetError::Collection("memory statistics unavailable".into()));
        }
        Ok(to_kib(bytes))
    }
}

fn to_kib(bytes: u64) -> f64 {
    (bytes / 1024) as f64
}

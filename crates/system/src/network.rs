use sampled_core::{ParameterSource, Result};
use sysinfo::Networks;

/// Direction of a [`NetworkSource`] byte counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    pub fn reference(self) -> &'static str {
        match self {
            Self::Received => "Device.DeviceInfo.X_SAMPLED_Network.BytesReceived",
            Self::Sent     => "Device.DeviceInfo.X_SAMPLED_Network.BytesSent",
        }
    }
}

/// Cumulative byte counter summed over every interface.
pub struct NetworkSource {
    direction: Direction,
    networks:  Networks,
}

impl NetworkSource {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl ParameterSource for NetworkSource {
    fn reference(&self) -> &str {
        self.direction.reference()
    }

    fn read(&mut self) -> Result<f64> {
        self.networks.refresh(true);
        let total: u64 = self
            .networks
            .iter()
            .map(|(_, data)| match self.direction {
                Direction::Received => data.total_received(),
                Direction::Sent     => data.total_transmitted(),
            })
            .sum();
        Ok(total as f64)
    }
}

use chrono::{DateTime, Utc};
use sampled_core::{SampleSetEvent, Status};

/// Status state machine of one sample set.
///
/// ```text
/// Disabled ──enable──▶ Enabled ──disable──▶ Disabled
///                      Enabled ──pulse──▶ Trigger ──▶ Enabled   (atomic)
/// any ──fail──▶ Error ──clear──▶ Disabled
/// ```
///
/// Every method returns the events describing the transitions it made;
/// a method that does not apply in the current state returns none.
#[derive(Debug, Clone, Default)]
pub struct StatusLifecycle {
    status: Status,
    pulses: u64,
}

impl StatusLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Number of fetch pulses emitted since creation.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    pub fn enable(&mut self) -> Option<SampleSetEvent> {
        match self.status {
            Status::Disabled => Some(self.transition(Status::Enabled)),
            _ => None,
        }
    }

    /// `Error` is sticky: only [`Self::clear_error`] leaves it.
    pub fn disable(&mut self) -> Option<SampleSetEvent> {
        match self.status {
            Status::Enabled | Status::Trigger => Some(self.transition(Status::Disabled)),
            Status::Disabled | Status::Error => None,
        }
    }

    /// Emit the zero-duration `Enabled → Trigger → Enabled` pulse.
    pub fn pulse(&mut self, at: DateTime<Utc>, completed_intervals: u64) -> Vec<SampleSetEvent> {
        if self.status != Status::Enabled {
            return Vec::new();
        }
        self.pulses += 1;
        vec![
            self.transition(Status::Trigger),
            SampleSetEvent::Trigger { at, completed_intervals },
            self.transition(Status::Enabled),
        ]
    }

    pub fn fail(&mut self) -> Option<SampleSetEvent> {
        match self.status {
            Status::Error => None,
            _ => Some(self.transition(Status::Error)),
        }
    }

    pub fn clear_error(&mut self) -> Option<SampleSetEvent> {
        match self.status {
            Status::Error => Some(self.transition(Status::Disabled)),
            _ => None,
        }
    }

    fn transition(&mut self, to: Status) -> SampleSetEvent {
        let from = std::mem::replace(&mut self.status, to);
        SampleSetEvent::StatusChanged { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(from: Status, to: Status) -> SampleSetEvent {
        SampleSetEvent::StatusChanged { from, to }
    }

    #[test]
    fn enable_disable_round_trip() {
        let mut l = StatusLifecycle::new();
        assert_eq!(l.status(), Status::Disabled);
        assert_eq!(l.enable(), Some(changed(Status::Disabled, Status::Enabled)));
        assert_eq!(l.enable(), None);
        assert_eq!(l.disable(), Some(changed(Status::Enabled, Status::Disabled)));
        assert_eq!(l.disable(), None);
    }

    #[test]
    fn pulse_is_atomic() {
        let mut l = StatusLifecycle::new();
        l.enable();
        let at = Utc::now();
        let events = l.pulse(at, 24);
        assert_eq!(
            events,
            vec![
                changed(Status::Enabled, Status::Trigger),
                SampleSetEvent::Trigger { at, completed_intervals: 24 },
                changed(Status::Trigger, Status::Enabled),
            ]
        );
        assert_eq!(l.status(), Status::Enabled);
        assert_eq!(l.pulses(), 1);
    }

    #[test]
    fn pulse_requires_enabled() {
        let mut l = StatusLifecycle::new();
        assert!(l.pulse(Utc::now(), 1).is_empty());
        assert_eq!(l.pulses(), 0);
    }

    #[test]
    fn error_is_sticky_until_cleared() {
        let mut l = StatusLifecycle::new();
        l.enable();
        assert_eq!(l.fail(), Some(changed(Status::Enabled, Status::Error)));
        assert_eq!(l.disable(), None);
        assert_eq!(l.enable(), None);
        assert!(l.pulse(Utc::now(), 1).is_empty());
        assert_eq!(l.status(), Status::Error);
        assert_eq!(l.clear_error(), Some(changed(Status::Error, Status::Disabled)));
        assert_eq!(l.status(), Status::Disabled);
    }
}

/// Counts completed sample intervals and decides when a fetch pulse is due.
///
/// Armed only while `1 <= fetch_samples <= report_samples`; otherwise the
/// count still advances but never fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTrigger {
    fetch_samples:  u32,
    report_samples: u32,
    since_fetch:    u32,
    completed:      u64,
}

impl FetchTrigger {
    pub fn new(fetch_samples: u32, report_samples: u32) -> Self {
        Self {
            fetch_samples,
            report_samples,
            since_fetch: 0,
            completed: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.fetch_samples >= 1 && self.fetch_samples <= self.report_samples
    }

    /// Total completed intervals since collection started.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Intervals completed in the current fetch window.
    pub fn since_fetch(&self) -> u32 {
        self.since_fetch
    }

    /// Register one non-preview finalize. Returns `true` when a pulse is due.
    pub fn on_interval_completed(&mut self) -> bool {
        self.completed = self.completed.saturating_add(1);
        if !self.is_armed() {
            return false;
        }
        self.since_fetch += 1;
        if self.since_fetch >= self.fetch_samples {
            self.since_fetch = 0;
            return true;
        }
        false
    }

    /// Apply new limits. A changed `fetch_samples` restarts the fetch window.
    pub fn reconfigure(&mut self, fetch_samples: u32, report_samples: u32) {
        if fetch_samples != self.fetch_samples {
            self.since_fetch = 0;
        }
        self.fetch_samples = fetch_samples;
        self.report_samples = report_samples;
        if self.is_armed() && self.since_fetch >= self.fetch_samples {
            self.since_fetch = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fired_at(trigger: &mut FetchTrigger, intervals: u32) -> Vec<u32> {
        (1..=intervals)
            .filter(|_| trigger.on_interval_completed())
            .collect()
    }

    #[test]
    fn fires_every_fetch_window() {
        let mut t = FetchTrigger::new(24, 25);
        assert_eq!(fired_at(&mut t, 80), vec![24, 48, 72]);
        assert_eq!(t.completed(), 80);
    }

    #[test]
    fn never_fires_when_zero() {
        let mut t = FetchTrigger::new(0, 24);
        assert!(fired_at(&mut t, 100).is_empty());
    }

    #[test]
    fn never_fires_above_report_samples() {
        let mut t = FetchTrigger::new(30, 24);
        assert!(!t.is_armed());
        assert!(fired_at(&mut t, 100).is_empty());
    }

    #[test]
    fn fetch_of_one_fires_every_interval() {
        let mut t = FetchTrigger::new(1, 1);
        assert_eq!(fired_at(&mut t, 3), vec![1, 2, 3]);
    }

    #[test]
    fn changing_fetch_samples_restarts_window() {
        let mut t = FetchTrigger::new(4, 10);
        assert_eq!(fired_at(&mut t, 3), Vec::<u32>::new());
        t.reconfigure(2, 10);
        assert_eq!(t.since_fetch(), 0);
        assert_eq!(fired_at(&mut t, 4), vec![2, 4]);
    }

    #[test]
    fn report_samples_change_keeps_window() {
        let mut t = FetchTrigger::new(3, 10);
        fired_at(&mut t, 2);
        t.reconfigure(3, 5);
        assert_eq!(t.since_fetch(), 2);
        assert!(t.on_interval_completed());
    }
}

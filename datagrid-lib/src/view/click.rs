//! Click-type detection.

use std::time::Duration;
use std::time::Instant;

/// Default quiet period after the last click before the count resolves.
pub const DEFAULT_CLICK_QUIET_PERIOD: Duration = Duration::from_millis(250);

/// How many clicks landed within the quiet period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickType {
    Single,
    Double,
    Triple,
}

impl ClickType {
    fn from_count(count: u32) -> Self {
        match count {
            0 | 1 => ClickType::Single,
            2 => ClickType::Double,
            _ => ClickType::Triple,
        }
    }
}

/// Counts clicks until a quiet period passes without another click.
///
/// The machine holds `{count, deadline}` and never sleeps: the caller feeds
/// clicks with [`click`](Self::click) and polls [`poll`](Self::poll) from
/// its own timer. Each click pushes the deadline out; the first poll at or
/// after the deadline resolves the count and resets the machine. A click
/// arriving after an unresolved deadline resolves the old sequence first.
#[derive(Debug, Clone)]
pub struct ClickDetector {
    quiet_period: Duration,
    count: u32,
    deadline: Option<Instant>,
}

impl Default for ClickDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CLICK_QUIET_PERIOD)
    }
}

impl ClickDetector {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            count: 0,
            deadline: None,
        }
    }

    /// Records a click at `now`.
    ///
    /// Returns the resolved type of a previous, already-expired sequence.
    pub fn click(&mut self, now: Instant) -> Option<ClickType> {
        let expired = self.poll(now);
        self.count += 1;
        self.deadline = Some(now + self.quiet_period);
        expired
    }

    /// Resolves the pending sequence if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ClickType> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        let click_type = ClickType::from_count(self.count);
        self.cancel();
        Some(click_type)
    }

    /// Resolves the pending sequence now, deadline or not.
    pub fn flush(&mut self) -> Option<ClickType> {
        self.deadline?;
        let click_type = ClickType::from_count(self.count);
        self.cancel();
        Some(click_type)
    }

    /// When the pending sequence resolves, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clicks counted so far in the pending sequence.
    pub fn pending_count(&self) -> u32 {
        self.count
    }

    /// Drops the pending sequence.
    pub fn cancel(&mut self) {
        self.count = 0;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_resolves_after_quiet_period() {
        let start = Instant::now();
        let mut detector = ClickDetector::new(Duration::from_millis(100));
        assert_eq!(detector.click(start), None);
        assert_eq!(detector.click(start + Duration::from_millis(50)), None);
        assert_eq!(detector.poll(start + Duration::from_millis(100)), None);
        assert_eq!(
            detector.poll(start + Duration::from_millis(150)),
            Some(ClickType::Double)
        );
        assert_eq!(detector.pending_count(), 0);
    }

    #[test]
    fn test_late_click_resolves_previous_sequence() {
        let start = Instant::now();
        let mut detector = ClickDetector::new(Duration::from_millis(100));
        detector.click(start);
        let resolved = detector.click(start + Duration::from_millis(500));
        assert_eq!(resolved, Some(ClickType::Single));
        assert_eq!(detector.pending_count(), 1);
    }

    #[test]
    fn test_counts_saturate_at_triple() {
        let start = Instant::now();
        let mut detector = ClickDetector::new(Duration::from_millis(100));
        for i in 0..5 {
            detector.click(start + Duration::from_millis(i * 10));
        }
        assert_eq!(detector.poll(start + Duration::from_secs(1)), Some(ClickType::Triple));
    }
}

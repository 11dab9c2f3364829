//! Active-time accounting.
//!
//! [`ActivityTracker`] splits wall-clock time into "present" and "active".
//! Each [`update`](ActivityTracker::update) credits the time since the
//! previous update as active when the user's idle duration is below the
//! threshold, or when the host forces it (away-from-keyboard mode).

use chrono::{DateTime, Utc};

use super::ActiveTimeSource;

/// Default idle threshold in seconds.
pub const DEFAULT_IDLE_THRESHOLD_SECS: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct ActivityTracker {
    idle_threshold_secs: f64,
    started_at: Option<DateTime<Utc>>,
    last_check: Option<DateTime<Utc>>,
    /// Total seconds carried over from an earlier run of the same day.
    restored_total: f64,
    active_seconds: f64,
    running: bool,
}

impl ActivityTracker {
    #[must_use]
    pub fn new(idle_threshold_secs: f64) -> Self {
        Self {
            idle_threshold_secs,
            started_at: None,
            last_check: None,
            restored_total: 0.0,
            active_seconds: 0.0,
            running: false,
        }
    }

    /// Begins accounting. The first start also fixes the run's start time.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.last_check = Some(now);
        self.started_at.get_or_insert(now);
        self.running = true;
    }

    /// Returns `true` if `idle_seconds` is below the idle threshold.
    #[must_use]
    pub fn is_active(&self, idle_seconds: f64) -> bool {
        idle_seconds < self.idle_threshold_secs
    }

    /// Credits the time since the last update and returns the active seconds
    /// added by this call.
    pub fn update(&mut self, now: DateTime<Utc>, idle_seconds: f64, force_active: bool) -> f64 {
        if !self.running {
            return 0.0;
        }
        let Some(last) = self.last_check.replace(now) else {
            return 0.0;
        };

        let elapsed = seconds_between(last, now);
        if elapsed <= 0.0 {
            return 0.0;
        }
        if force_active || self.is_active(idle_seconds) {
            self.active_seconds += elapsed;
            return elapsed;
        }
        0.0
    }

    /// `(total_seconds, active_seconds)` where total counts wall time since
    /// start plus any restored total.
    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> (f64, f64) {
        let session = self
            .started_at
            .map_or(0.0, |start| seconds_between(start, now).max(0.0));
        (self.restored_total + session, self.active_seconds)
    }

    #[must_use]
    pub fn active_seconds(&self) -> f64 {
        self.active_seconds
    }

    /// Seeds the counters with values saved earlier the same day.
    pub fn restore(&mut self, total_seconds: f64, active_seconds: f64) {
        self.restored_total = total_seconds;
        self.active_seconds = active_seconds;
    }

    /// Zeroes every counter and restarts the run at `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.active_seconds = 0.0;
        self.restored_total = 0.0;
        self.started_at = Some(now);
        self.last_check = Some(now);
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_THRESHOLD_SECS)
    }
}

impl ActiveTimeSource for ActivityTracker {
    fn time_stats(&self, now: DateTime<Utc>) -> (f64, f64) {
        self.stats(now)
    }
}

/// Formats seconds as `HH:MM:SS`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, rest) = (total / 3600, total % 3600);
    format!("{:02}:{:02}:{:02}", hours, rest / 60, rest % 60)
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn update_before_start_is_ignored() {
        let mut tracker = ActivityTracker::default();
        assert_eq!(tracker.update(t0(), 0.0, false), 0.0);
        assert_eq!(tracker.stats(t0()), (0.0, 0.0));
    }

    #[test]
    fn active_time_accumulates_below_threshold() {
        let mut tracker = ActivityTracker::new(25.0);
        tracker.start(t0());

        tracker.update(t0() + Duration::seconds(1), 3.0, false);
        tracker.update(t0() + Duration::seconds(2), 30.0, false);
        tracker.update(t0() + Duration::seconds(3), 24.0, false);

        assert_eq!(tracker.stats(t0() + Duration::seconds(3)), (3.0, 2.0));
    }

    #[test]
    fn force_active_overrides_idle() {
        let mut tracker = ActivityTracker::new(25.0);
        tracker.start(t0());

        let added = tracker.update(t0() + Duration::seconds(5), 600.0, true);

        assert_eq!(added, 5.0);
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let mut tracker = ActivityTracker::default();
        tracker.start(t0());

        assert_eq!(tracker.update(t0() - Duration::seconds(10), 0.0, false), 0.0);
        assert_eq!(tracker.active_seconds(), 0.0);
    }

    #[test]
    fn restore_then_reset() {
        let mut tracker = ActivityTracker::default();
        tracker.start(t0());
        tracker.restore(3600.0, 1200.0);

        assert_eq!(tracker.stats(t0() + Duration::seconds(60)), (3660.0, 1200.0));

        let later = t0() + Duration::hours(2);
        tracker.reset(later);
        assert_eq!(tracker.stats(later), (0.0, 0.0));
    }

    #[test]
    fn format_duration_pads_fields() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(3725.9), "01:02:05");
        assert_eq!(format_duration(-4.0), "00:00:00");
    }
}

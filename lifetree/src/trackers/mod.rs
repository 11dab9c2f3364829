//! Stat sources sampled by the history recorder.
//!
//! - [`activity`]: active-time accounting from an idle signal
//! - [`text`]: word and character counting from key presses
//!
//! Neither tracker talks to the operating system. The host feeds them idle
//! durations and key events from its own sensors.

pub mod activity;
pub mod text;

use chrono::{DateTime, Utc};

pub use activity::ActivityTracker;
pub use text::{Key, TextActivityTracker};

/// Read side of an active-time tracker.
pub trait ActiveTimeSource {
    /// `(total_seconds, active_seconds)` as of `now`.
    fn time_stats(&self, now: DateTime<Utc>) -> (f64, f64);
}

/// Read side of a text-activity tracker.
pub trait TextActivitySource {
    /// `(words, chars)` typed so far.
    fn text_stats(&self) -> (u64, u64);
}

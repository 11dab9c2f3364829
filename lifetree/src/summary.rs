//! Daily summary and startup reconciliation.
//!
//! The daily summary is a small record of today's counters written on every
//! autosave. History is written on the same schedule but lives in a separate
//! file, so after a crash the two can disagree. [`reconcile`] decides which
//! counters the trackers resume from.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::history::HistoryPoint;
use crate::persistence::{read_json, write_json_atomic, PersistenceError};
use crate::trackers::{ActivityTracker, TextActivityTracker};

/// History must lead the summary by more than this many active seconds
/// before the summary is treated as stale.
pub const REPAIR_TOLERANCE_SECS: f64 = 5.0;

/// Today's counters as of the last save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub total_seconds: f64,
    #[serde(default)]
    pub active_seconds: f64,
    #[serde(default)]
    pub words: u64,
    #[serde(default)]
    pub chars: u64,
}

impl DailySummary {
    /// Reads the summary file. Missing or unreadable files yield `None`.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        match read_json(path) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Failed to load daily summary, ignoring it");
                None
            }
        }
    }

    /// Writes the summary file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the write fails.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json_atomic(path, self)
    }
}

/// Counters the trackers should resume from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoredStats {
    pub total_seconds: f64,
    pub active_seconds: f64,
    pub words: u64,
    pub chars: u64,
    /// `true` if the newest history point overrode a stale summary.
    pub repaired: bool,
}

impl RestoredStats {
    /// Seeds both trackers with these counters.
    pub fn apply(&self, activity: &mut ActivityTracker, text: &mut TextActivityTracker) {
        activity.restore(self.total_seconds, self.active_seconds);
        text.restore(self.words, self.chars);
    }
}

/// Decides the starting counters for `today` from the saved summary and the
/// newest history point.
///
/// - A summary for `today` is used as is, unless history shows more than
///   [`REPAIR_TOLERANCE_SECS`] additional active seconds. Then history wins
///   for active time, word and char counts take the larger value, and total
///   time is raised to at least the active time.
/// - A summary from another day means midnight passed: start from zero.
/// - Without a summary the newest history point is used directly.
#[must_use]
pub fn reconcile(
    summary: Option<&DailySummary>,
    last_point: Option<&HistoryPoint>,
    today: NaiveDate,
) -> Option<RestoredStats> {
    match summary {
        Some(summary) if summary.date == today => {
            let mut restored = RestoredStats {
                total_seconds: summary.total_seconds,
                active_seconds: summary.active_seconds,
                words: summary.words,
                chars: summary.chars,
                repaired: false,
            };

            if let Some(point) =
                last_point.filter(|p| p.active_seconds > summary.active_seconds + REPAIR_TOLERANCE_SECS)
            {
                info!(
                    recovered_secs = point.active_seconds - summary.active_seconds,
                    "Repairing out-of-sync daily summary from history"
                );
                restored.active_seconds = point.active_seconds;
                restored.words = restored.words.max(point.words);
                restored.chars = restored.chars.max(point.chars);
                restored.total_seconds = restored.total_seconds.max(point.active_seconds);
                restored.repaired = true;
            }
            Some(restored)
        }
        Some(summary) => {
            info!(last_date = %summary.date, "Daily summary is from another day, starting fresh");
            None
        }
        None => last_point.map(|point| {
            info!("Daily summary missing, reconstructing from history");
            RestoredStats {
                total_seconds: point.active_seconds,
                active_seconds: point.active_seconds,
                words: point.words,
                chars: point.chars,
                repaired: true,
            }
        }),
    }
}

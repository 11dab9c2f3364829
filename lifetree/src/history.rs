//! Same-day productivity time series.
//!
//! [`HistoryRecorder`] keeps a bounded ring of [`HistoryPoint`]s, one per
//! heartbeat, each sampling the cumulative active time and text counters at
//! that moment together with the node and intention in focus.
//!
//! On disk the buffer is a JSON array of tuples
//! `[timestamp, active_seconds, words, chars, node, intention]`. Files written
//! before labels were tracked hold 4- or 5-element tuples; the missing labels
//! load as `None`.
//!
//! Loading keeps only points from the current calendar day. History is a
//! daily sliding window, not an archive.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::persistence::{quarantine, read_json, write_json_atomic, PersistenceError};
use crate::trackers::{ActiveTimeSource, TextActivitySource};

/// One sample per second for a full day.
pub const DEFAULT_HISTORY_CAPACITY: usize = 86_400;

/// One sample of the cumulative counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePoint", into = "FullPoint")]
pub struct HistoryPoint {
    /// Unix seconds.
    pub timestamp: f64,
    pub active_seconds: f64,
    pub words: u64,
    pub chars: u64,
    pub node: Option<String>,
    pub intention: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct FullPoint(f64, f64, u64, u64, Option<String>, Option<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePoint {
    Full(FullPoint),
    WithNode(f64, f64, u64, u64, Option<String>),
    Legacy(f64, f64, u64, u64),
}

impl From<WirePoint> for HistoryPoint {
    fn from(wire: WirePoint) -> Self {
        let (timestamp, active_seconds, words, chars, node, intention) = match wire {
            WirePoint::Full(FullPoint(t, a, w, c, n, i)) => (t, a, w, c, n, i),
            WirePoint::WithNode(t, a, w, c, n) => (t, a, w, c, n, None),
            WirePoint::Legacy(t, a, w, c) => (t, a, w, c, None, None),
        };
        Self {
            timestamp,
            active_seconds,
            words,
            chars,
            node,
            intention,
        }
    }
}

impl From<HistoryPoint> for FullPoint {
    fn from(point: HistoryPoint) -> Self {
        FullPoint(
            point.timestamp,
            point.active_seconds,
            point.words,
            point.chars,
            point.node,
            point.intention,
        )
    }
}

/// Parallel columns of the buffer, for plotting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryData {
    pub timestamps: Vec<f64>,
    pub active_seconds: Vec<f64>,
    pub words: Vec<u64>,
    pub chars: Vec<u64>,
    pub nodes: Vec<Option<String>>,
    pub intentions: Vec<Option<String>>,
}

/// Bounded ring buffer of history points with file persistence.
#[derive(Debug)]
pub struct HistoryRecorder {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
    run_start: Option<f64>,
    path: Option<PathBuf>,
}

impl HistoryRecorder {
    /// Creates an empty recorder. `path` is where [`save`](Self::save) writes.
    #[must_use]
    pub fn new(capacity: usize, path: Option<PathBuf>) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
            run_start: None,
            path,
        }
    }

    /// Creates a recorder and loads today's points from `path`.
    pub fn open(capacity: usize, path: impl Into<PathBuf>) -> Self {
        let mut recorder = Self::new(capacity, Some(path.into()));
        recorder.load();
        recorder
    }

    /// Samples both trackers now and appends a point.
    pub fn record(
        &mut self,
        active: &impl ActiveTimeSource,
        text: &impl TextActivitySource,
        node: Option<&str>,
        intention: Option<&str>,
    ) {
        self.record_at(Utc::now(), active, text, node, intention);
    }

    /// Samples both trackers as of `now` and appends a point, evicting the
    /// oldest one when full.
    pub fn record_at(
        &mut self,
        now: DateTime<Utc>,
        active: &impl ActiveTimeSource,
        text: &impl TextActivitySource,
        node: Option<&str>,
        intention: Option<&str>,
    ) {
        let timestamp = unix_seconds(now);
        self.run_start.get_or_insert(timestamp);

        let (_, active_seconds) = active.time_stats(now);
        let (words, chars) = text.text_stats();

        self.push(HistoryPoint {
            timestamp,
            active_seconds,
            words,
            chars,
            node: node.map(str::to_string),
            intention: intention.map(str::to_string),
        });
    }

    fn push(&mut self, point: HistoryPoint) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Column view of every point, oldest first.
    #[must_use]
    pub fn get_data(&self) -> HistoryData {
        let mut data = HistoryData::default();
        for point in &self.points {
            data.timestamps.push(point.timestamp);
            data.active_seconds.push(point.active_seconds);
            data.words.push(point.words);
            data.chars.push(point.chars);
            data.nodes.push(point.node.clone());
            data.intentions.push(point.intention.clone());
        }
        data
    }

    /// Drops every point and starts a new run.
    pub fn reset(&mut self) {
        self.reset_at(Utc::now());
    }

    pub fn reset_at(&mut self, now: DateTime<Utc>) {
        self.points.clear();
        self.run_start = Some(unix_seconds(now));
    }

    pub fn points(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Unix seconds of the first record since construction or reset.
    #[must_use]
    pub fn run_start(&self) -> Option<f64> {
        self.run_start
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Writes the full buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the write fails.
    pub fn try_save(&self) -> Result<(), PersistenceError> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.points),
            None => Ok(()),
        }
    }

    /// Writes the full buffer, logging and swallowing any failure.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!(error = %e, "Failed to save history");
        }
    }

    /// Replaces the buffer with the points on file from today (local time).
    pub fn load(&mut self) {
        self.load_at(&chrono::Local::now());
    }

    /// Replaces the buffer with the points on file from the calendar day of
    /// `now`, in `now`'s time zone.
    ///
    /// A missing or malformed file leaves the buffer empty. A malformed file
    /// is renamed to `*.corrupt` first.
    pub fn load_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.points.clear();
        let Some(path) = self.path.clone() else {
            return;
        };

        let loaded: Vec<HistoryPoint> = match read_json(&path) {
            Ok(Some(points)) => points,
            Ok(None) => {
                debug!(path = %path.display(), "No history file");
                return;
            }
            Err(e @ PersistenceError::Json { .. }) => {
                match quarantine(&path) {
                    Ok(moved) => warn!(
                        error = %e,
                        moved_to = %moved.display(),
                        "Unreadable history moved aside, starting empty"
                    ),
                    Err(qe) => warn!(
                        error = %e,
                        quarantine_error = %qe,
                        "Unreadable history could not be moved aside, starting empty"
                    ),
                }
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load history, starting empty");
                return;
            }
        };

        let cutoff = day_start(now);
        let total = loaded.len();
        let today: Vec<HistoryPoint> = loaded
            .into_iter()
            .filter(|p| p.timestamp >= cutoff)
            .collect();
        let discarded = total - today.len();
        for point in today {
            self.push(point);
        }
        info!(kept = self.points.len(), discarded, "History loaded");
    }
}

fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Unix seconds of midnight starting the calendar day of `now`.
fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> f64 {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start.timestamp() as f64,
        // No local midnight on this day (DST gap): fall back to wall-clock offset.
        None => (now.timestamp() - i64::from(now.num_seconds_from_midnight())) as f64,
    }
}

//! History recorder integration tests.
//!
//! Covers sampling from live trackers, the same-day filter applied when a
//! history file is reloaded, and rebuilding the daily counters after a
//! restart from the summary file and the last history point.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use lifetree::history::{HistoryPoint, HistoryRecorder};
use lifetree::summary::{reconcile, DailySummary};
use lifetree::trackers::{ActivityTracker, TextActivityTracker};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// UTC+2, so local and UTC calendar days differ late in the evening.
fn zone() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn local(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    zone()
        .with_ymd_and_hms(2024, 6, day, hour, minute, 0)
        .unwrap()
}

fn point_at(time: DateTime<FixedOffset>, active_seconds: f64) -> HistoryPoint {
    HistoryPoint {
        timestamp: time.timestamp() as f64,
        active_seconds,
        words: 0,
        chars: 0,
        node: None,
        intention: None,
    }
}

// =============================================================================
// Recording
// =============================================================================

#[test]
fn records_tracker_counters_with_labels() {
    let start = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
    let mut activity = ActivityTracker::new(25.0);
    let mut text = TextActivityTracker::new();
    let mut history = HistoryRecorder::new(100, None);

    activity.start(start);
    for second in 1..=10 {
        let now = start + Duration::seconds(second);
        activity.update(now, 0.0, false);
        text.on_text("ab ");
        history.record_at(now, &activity, &text, Some("Health"), Some("walk"));
    }

    assert_eq!(history.len(), 10);
    let last = history.last().unwrap();
    assert_eq!(last.active_seconds, 10.0);
    assert_eq!((last.words, last.chars), (10, 20));
    assert_eq!(last.node.as_deref(), Some("Health"));
    assert_eq!(last.intention.as_deref(), Some("walk"));
    assert_eq!(history.run_start(), Some(start.timestamp() as f64 + 1.0));

    let data = history.get_data();
    assert_eq!(data.timestamps.len(), 10);
    assert!(data.timestamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn capacity_evicts_oldest_points() {
    let start = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
    let activity = ActivityTracker::default();
    let text = TextActivityTracker::new();
    let mut history = HistoryRecorder::new(3, None);

    for second in 0..5 {
        history.record_at(start + Duration::seconds(second), &activity, &text, None, None);
    }

    let timestamps = history.get_data().timestamps;
    let first = start.timestamp() as f64;
    assert_eq!(timestamps, vec![first + 2.0, first + 3.0, first + 4.0]);
}

// =============================================================================
// Same-Day Reload
// =============================================================================

#[test]
fn reload_keeps_only_points_from_local_today() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let points = vec![
        point_at(local(9, 22, 0), 100.0),
        point_at(local(9, 23, 59), 200.0),
        point_at(local(10, 0, 0), 5.0),
        point_at(local(10, 1, 30), 60.0),
    ];
    std::fs::write(&path, serde_json::to_string(&points).unwrap()).unwrap();

    let mut history = HistoryRecorder::new(100, Some(path));
    history.load_at(&local(10, 8, 0));

    let kept: Vec<f64> = history.points().map(|p| p.active_seconds).collect();
    assert_eq!(kept, vec![5.0, 60.0]);
}

#[test]
fn saved_history_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    let now = Utc::now();
    let mut activity = ActivityTracker::new(25.0);
    let mut text = TextActivityTracker::new();

    let mut history = HistoryRecorder::new(100, Some(path.clone()));
    activity.start(now - Duration::seconds(3));
    activity.update(now, 0.0, false);
    text.on_text("one two ");
    history.record_at(now, &activity, &text, Some("Focus node"), None);
    history.try_save().unwrap();

    let reloaded = HistoryRecorder::open(100, &path);

    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.last(), history.last());
}

#[test]
fn missing_history_file_loads_empty() {
    let dir = TempDir::new().unwrap();

    let history = HistoryRecorder::open(100, dir.path().join("history.json"));

    assert!(history.is_empty());
}

// =============================================================================
// Restart Reconciliation
// =============================================================================

#[test]
fn restart_restores_counters_from_summary() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let summary = DailySummary {
        date: today,
        total_seconds: 600.0,
        active_seconds: 400.0,
        words: 50,
        chars: 250,
    };

    let restored = reconcile(Some(&summary), None, today).unwrap();
    let mut activity = ActivityTracker::new(25.0);
    let mut text = TextActivityTracker::new();
    restored.apply(&mut activity, &mut text);

    assert!(!restored.repaired);
    let now = Utc::now();
    assert_eq!(activity.stats(now), (600.0, 400.0));
    assert_eq!(text.stats(), (50, 250));
}

#[test]
fn restart_repairs_stale_summary_from_history() {
    let dir = TempDir::new().unwrap();
    let summary_path = dir.path().join("focus_data.json");
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    DailySummary {
        date: today,
        total_seconds: 500.0,
        active_seconds: 300.0,
        words: 40,
        chars: 200,
    }
    .save(&summary_path)
    .unwrap();

    let mut last = point_at(local(10, 12, 0), 900.0);
    last.words = 35;
    last.chars = 260;

    let summary = DailySummary::load(&summary_path);
    let restored = reconcile(summary.as_ref(), Some(&last), today).unwrap();

    assert!(restored.repaired);
    assert_eq!(restored.active_seconds, 900.0);
    assert_eq!(restored.total_seconds, 900.0);
    assert_eq!((restored.words, restored.chars), (40, 260));
}

#[test]
fn restart_on_a_new_day_starts_from_zero() {
    let yesterday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
    let summary = DailySummary {
        date: yesterday,
        total_seconds: 600.0,
        active_seconds: 400.0,
        words: 50,
        chars: 250,
    };

    assert!(reconcile(Some(&summary), None, yesterday.succ_opt().unwrap()).is_none());
}

//! Application host.
//!
//! [`App`] wires the components together the way a desktop shell would:
//! it loads every data file on start, reconciles today's counters, and is
//! driven by a 1 Hz [`heartbeat`](App::heartbeat) that keeps the trackers,
//! timer, history and focused node in step.
//!
//! All methods take the caller's clock so the heartbeat is deterministic
//! under test; the binary passes `Local::now()`.

use std::fs;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::history::HistoryRecorder;
use crate::node::NodeId;
use crate::persistence::{read_json, write_json_atomic};
use crate::session_log::{SessionLog, SessionLogEntry, SessionOutcome};
use crate::summary::{reconcile, DailySummary};
use crate::timer::{Phase, PhaseCompletion, TimerEngine, TimerSnapshot};
use crate::trackers::{ActivityTracker, TextActivityTracker};
use crate::tree::TreeStateManager;
use crate::types::{Perspective, Stats};

/// What the user is working on during a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub perspective: Perspective,
    pub node: NodeId,
    /// Index of the selected intention on `node`, if any.
    pub intention: Option<usize>,
}

/// Notable events of one heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub autosaved: bool,
    /// Phase that finished on this tick.
    pub completed: Option<PhaseCompletion>,
    /// Productivity cycles the focused node completed on this tick.
    pub cycles_completed: u32,
    /// A calendar day boundary was crossed and the daily counters reset.
    pub rolled_over: bool,
}

/// Cumulative counters at the previous heartbeat.
#[derive(Debug, Clone, Copy, Default)]
struct Sample {
    active_seconds: f64,
    words: u64,
    chars: u64,
}

pub struct App {
    config: Config,
    problems: TreeStateManager,
    values: TreeStateManager,
    timer: TimerEngine,
    activity: ActivityTracker,
    text: TextActivityTracker,
    history: HistoryRecorder,
    session_log: SessionLog,
    autosave_tick: u64,
    current_date: NaiveDate,
    last_sample: Sample,
}

impl App {
    /// Loads all state from `config.data_dir` as of now.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created. Unreadable
    /// data files are not errors; they start fresh.
    pub fn open(config: Config) -> Result<Self> {
        Self::open_at(config, Local::now())
    }

    /// Loads all state as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open_at(config: Config, now: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let now_utc = now.with_timezone(&Utc);

        let problems = TreeStateManager::load(
            Perspective::Problems,
            config.tree_path(Perspective::Problems),
            config.undo_limit,
        );
        let values = TreeStateManager::load(
            Perspective::Values,
            config.tree_path(Perspective::Values),
            config.undo_limit,
        );

        let mut history = HistoryRecorder::new(config.history_capacity, Some(config.history_path()));
        history.load_at(&now);

        let mut activity = ActivityTracker::new(config.idle_threshold_secs as f64);
        let mut text = TextActivityTracker::new();
        let summary = DailySummary::load(&config.focus_data_path());
        if let Some(restored) = reconcile(summary.as_ref(), history.last(), now.date_naive()) {
            restored.apply(&mut activity, &mut text);
        }
        activity.start(now_utc);

        let mut timer = TimerEngine::new(config.timer);
        match read_json::<TimerSnapshot>(&config.timer_state_path()) {
            Ok(Some(snapshot)) => timer.restore(&snapshot),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load timer state, starting idle"),
        }

        let (words, chars) = text.stats();
        let last_sample = Sample {
            active_seconds: activity.active_seconds(),
            words,
            chars,
        };

        info!(
            data_dir = %config.data_dir.display(),
            history_points = history.len(),
            "LifeTree state loaded"
        );

        Ok(Self {
            session_log: SessionLog::new(config.session_logs_path()),
            config,
            problems,
            values,
            timer,
            activity,
            text,
            history,
            autosave_tick: 0,
            current_date: now.date_naive(),
            last_sample,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn tree(&self, perspective: Perspective) -> &TreeStateManager {
        match perspective {
            Perspective::Problems => &self.problems,
            Perspective::Values => &self.values,
        }
    }

    pub fn tree_mut(&mut self, perspective: Perspective) -> &mut TreeStateManager {
        match perspective {
            Perspective::Problems => &mut self.problems,
            Perspective::Values => &mut self.values,
        }
    }

    #[must_use]
    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut TimerEngine {
        &mut self.timer
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    #[must_use]
    pub fn text(&self) -> &TextActivityTracker {
        &self.text
    }

    /// Key input goes here.
    pub fn text_mut(&mut self) -> &mut TextActivityTracker {
        &mut self.text
    }

    #[must_use]
    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    #[must_use]
    pub fn session_log(&self) -> &SessionLog {
        &self.session_log
    }

    /// Today's counters as they would be saved right now.
    #[must_use]
    pub fn daily_summary(&self, now: DateTime<Local>) -> DailySummary {
        let (total_seconds, active_seconds) = self.activity.stats(now.with_timezone(&Utc));
        let (words, chars) = self.text.stats();
        DailySummary {
            date: self.current_date,
            total_seconds,
            active_seconds,
            words,
            chars,
        }
    }

    // -------------------------------------------------------------------------
    // Session control
    // -------------------------------------------------------------------------

    /// Starts a focus session and baselines the session word counters.
    pub fn start_focus(&mut self, now: DateTime<Local>) {
        self.timer.start_focus_at(now.with_timezone(&Utc));
        self.text.start_session();
        info!(
            minutes = self.config.timer.focus_minutes,
            "Focus session started"
        );
    }

    /// Records the user's verdict on the focus session that just ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be written.
    pub fn review_session(&self, outcome: SessionOutcome, now: DateTime<Local>) -> Result<()> {
        let entry = SessionLogEntry::new(
            now.naive_local(),
            outcome,
            self.config.timer.focus_minutes,
        );
        self.session_log.append(entry)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Heartbeat
    // -------------------------------------------------------------------------

    /// Runs one 1 Hz tick.
    ///
    /// In order: periodic autosave, activity update, pause/resume of a focus
    /// session on inactivity, history sample, crediting the focused
    /// intention and node cycle, timer tick with the phase transition it
    /// triggers, and midnight rollover.
    ///
    /// A finished focus session starts a break. A finished break starts the
    /// next focus session if the focused node has incomplete intentions and
    /// stops the timer otherwise.
    pub fn heartbeat(
        &mut self,
        now: DateTime<Local>,
        idle_seconds: f64,
        focus: Option<Focus>,
    ) -> HeartbeatReport {
        let mut report = HeartbeatReport::default();
        let now_utc = now.with_timezone(&Utc);

        self.autosave_tick += 1;
        if self.autosave_tick >= self.config.autosave_secs {
            self.autosave_tick = 0;
            self.save_all_at(now);
            report.autosaved = true;
        }

        let afk = self.timer.afk_mode;
        let is_active = afk || self.activity.is_active(idle_seconds);
        self.activity.update(now_utc, idle_seconds, afk);

        if self.timer.phase() == Phase::Focus && !self.timer.is_finished() {
            if is_active {
                self.timer.resume();
            } else {
                self.timer.pause();
            }
        }

        let (node_label, intention_label) = self.focus_labels(focus);
        self.history.record_at(
            now_utc,
            &self.activity,
            &self.text,
            node_label.as_deref(),
            intention_label.as_deref(),
        );

        let focusing = self.timer.phase() == Phase::Focus && self.timer.is_running();
        if let Some(focus) = focus.filter(|_| focusing && is_active) {
            report.cycles_completed = self.credit_focus(focus);
        }
        self.last_sample = self.sample();

        report.completed = self.timer.tick_at(now_utc);
        match report.completed {
            Some(PhaseCompletion::Focus) => {
                let (words, chars) = self.text.session_stats();
                info!(
                    cycles = self.timer.cycles_completed(),
                    words,
                    chars,
                    "Focus session complete, starting break"
                );
                self.timer.start_break();
            }
            Some(PhaseCompletion::Break) => self.end_break(now, focus),
            None => {}
        }

        if now.date_naive() != self.current_date {
            self.rollover(now);
            report.rolled_over = true;
        }

        report
    }

    /// Starts the next focus session while the focused node still has open
    /// intentions, otherwise returns the timer to idle.
    fn end_break(&mut self, now: DateTime<Local>, focus: Option<Focus>) {
        let has_work = focus
            .and_then(|f| self.tree(f.perspective).node(f.node))
            .is_some_and(|node| node.has_incomplete_intentions());

        if has_work {
            info!("Break over, focused node has open intentions");
            self.start_focus(now);
        } else {
            info!("Break over, timer idle");
            self.timer.stop();
        }
    }

    fn sample(&self) -> Sample {
        let (words, chars) = self.text.stats();
        Sample {
            active_seconds: self.activity.active_seconds(),
            words,
            chars,
        }
    }

    /// Node and intention labels for the history sample. The designated
    /// root is recorded as no node.
    fn focus_labels(&self, focus: Option<Focus>) -> (Option<String>, Option<String>) {
        let Some(focus) = focus else {
            return (None, None);
        };
        let tree = self.tree(focus.perspective);
        let Some(node) = tree.node(focus.node) else {
            return (None, None);
        };

        let node_label = (!tree.is_root(focus.node)).then(|| node.label.clone());
        let intention_label = focus
            .intention
            .and_then(|i| node.intentions.get(i))
            .map(|i| i.text.clone());
        (node_label, intention_label)
    }

    /// Credits counter growth since the last heartbeat to the focused
    /// intention and advances the node's cycle by one second. Solved nodes
    /// are frozen.
    fn credit_focus(&mut self, focus: Focus) -> u32 {
        let current = self.sample();
        let delta = Stats::new(
            (current.active_seconds - self.last_sample.active_seconds).max(0.0),
            current.words.saturating_sub(self.last_sample.words),
            current.chars.saturating_sub(self.last_sample.chars),
        );
        let limit = self.config.cycle_time_limit_secs;
        let tree = self.tree_mut(focus.perspective);

        match tree.node(focus.node) {
            Some(node) if !node.status.is_solved() => {}
            _ => return 0,
        }

        if let Some(index) = focus.intention {
            if let Err(e) = tree.credit_intention(focus.node, index, delta) {
                debug!(error = %e, "Focused intention not credited");
            }
        }

        tree.advance_cycle(focus.node, 1, limit).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Persistence and rollover
    // -------------------------------------------------------------------------

    /// Persists every component. Failures are logged, never returned.
    pub fn save_all(&self) {
        self.save_all_at(Local::now());
    }

    pub fn save_all_at(&self, now: DateTime<Local>) {
        if let Err(e) = self.daily_summary(now).save(&self.config.focus_data_path()) {
            error!(error = %e, "Failed to save daily summary");
        }
        self.history.save();
        self.problems.save();
        self.values.save();
        if let Err(e) = write_json_atomic(&self.config.timer_state_path(), &self.timer.snapshot()) {
            error!(error = %e, "Failed to save timer state");
        }
        debug!("State saved");
    }

    /// Saves the finished day, then zeroes the daily counters and history.
    fn rollover(&mut self, now: DateTime<Local>) {
        info!(
            previous = %self.current_date,
            today = %now.date_naive(),
            "Midnight rollover"
        );
        self.save_all_at(now);

        let now_utc = now.with_timezone(&Utc);
        self.activity.reset(now_utc);
        self.text.reset();
        self.history.reset_at(now_utc);
        self.current_date = now.date_naive();
        self.last_sample = Sample::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    use crate::timer::TimerConfig;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 4, 15, 10, 0, 0).unwrap()
    }

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::with_data_dir(dir.path());
        config.timer = TimerConfig {
            focus_minutes: 1,
            ..TimerConfig::default()
        };
        config
    }

    fn focus_on(app: &mut App, label: &str) -> Focus {
        let tree = app.tree_mut(Perspective::Problems);
        let node = tree.add_root(label, 0.0, 0.0);
        let intention = tree.add_intention(node, "draft").unwrap();
        Focus {
            perspective: Perspective::Problems,
            node,
            intention: Some(intention),
        }
    }

    #[test]
    fn open_empty_dir_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let app = App::open_at(config(&dir), t0()).unwrap();

        assert_eq!(app.tree(Perspective::Problems).get_all_nodes().len(), 1);
        assert_eq!(app.tree(Perspective::Values).get_all_nodes().len(), 1);
        assert!(app.history().is_empty());
        assert_eq!(app.timer().phase(), Phase::Idle);
    }

    #[test]
    fn heartbeat_records_history_with_labels() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(config(&dir), t0()).unwrap();
        let focus = focus_on(&mut app, "Writing");

        app.heartbeat(t0() + Duration::seconds(1), 0.0, Some(focus));

        let point = app.history().last().unwrap();
        assert_eq!(point.node.as_deref(), Some("Writing"));
        assert_eq!(point.intention.as_deref(), Some("draft"));
        assert_eq!(point.active_seconds, 1.0);
    }

    #[test]
    fn root_focus_is_recorded_without_label() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(config(&dir), t0()).unwrap();
        let root = app.tree(Perspective::Problems).designated_root().unwrap();
        let focus = Focus {
            perspective: Perspective::Problems,
            node: root,
            intention: None,
        };

        app.heartbeat(t0() + Duration::seconds(1), 0.0, Some(focus));

        assert!(app.history().last().unwrap().node.is_none());
    }

    #[test]
    fn focus_session_credits_intention_and_starts_break() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(config(&dir), t0()).unwrap();
        let focus = focus_on(&mut app, "Writing");
        app.start_focus(t0());

        let mut completed = None;
        for s in 1..=60 {
            app.text_mut().on_text("word ");
            let report = app.heartbeat(t0() + Duration::seconds(s), 0.0, Some(focus));
            completed = completed.or(report.completed);
        }

        assert_eq!(completed, Some(PhaseCompletion::Focus));
        assert_eq!(app.timer().phase(), Phase::Break);
        assert_eq!(app.timer().cycles_completed(), 1);
        assert_eq!(app.text().session_stats(), (60, 240));

        let node = app.tree(Perspective::Problems).node(focus.node).unwrap();
        let stats = node.intentions[0].stats;
        assert_eq!(stats.time, 60.0);
        assert_eq!(stats.words, 60);
        assert_eq!(stats.chars, 240);
        assert_eq!(node.cycle_time, 60);
    }

    /// Runs a one-minute focus session and a one-minute break on `focus`.
    /// Returns the completions seen while the break ran.
    fn focus_then_break(
        app: &mut App,
        focus: Focus,
        after_focus: impl FnOnce(&mut App),
    ) -> Vec<PhaseCompletion> {
        app.start_focus(t0());
        for s in 1..=60 {
            app.heartbeat(t0() + Duration::seconds(s), 0.0, Some(focus));
        }
        assert_eq!(app.timer().phase(), Phase::Break);
        after_focus(app);

        (61..=120)
            .filter_map(|s| {
                app.heartbeat(t0() + Duration::seconds(s), 0.0, Some(focus))
                    .completed
            })
            .collect()
    }

    fn short_break_config(dir: &TempDir) -> Config {
        let mut cfg = config(dir);
        cfg.timer.short_break_minutes = 1;
        cfg
    }

    #[test]
    fn break_end_starts_next_session_while_intentions_are_open() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(short_break_config(&dir), t0()).unwrap();
        let focus = focus_on(&mut app, "Writing");

        let done = focus_then_break(&mut app, focus, |_| {});

        assert_eq!(done, vec![PhaseCompletion::Break]);
        assert_eq!(app.timer().phase(), Phase::Focus);
        assert!(app.timer().is_running());
        assert_eq!(app.timer().elapsed_seconds(), 0);
        assert_eq!(app.timer().cycles_completed(), 1);
        assert_eq!(app.text().session_stats(), (0, 0));
    }

    #[test]
    fn break_end_goes_idle_once_intentions_are_done() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(short_break_config(&dir), t0()).unwrap();
        let focus = focus_on(&mut app, "Writing");

        let done = focus_then_break(&mut app, focus, |app| {
            app.tree_mut(Perspective::Problems)
                .complete_intention(focus.node, 0)
                .unwrap();
        });

        assert_eq!(done, vec![PhaseCompletion::Break]);
        assert_eq!(app.timer().phase(), Phase::Idle);
        assert!(!app.timer().is_running());
        assert_eq!(app.timer().cycles_completed(), 1);
    }

    #[test]
    fn inactivity_pauses_focus_and_activity_resumes_it() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(config(&dir), t0()).unwrap();
        app.start_focus(t0());

        app.heartbeat(t0() + Duration::seconds(1), 120.0, None);
        assert!(!app.timer().is_running());
        assert_eq!(app.timer().elapsed_seconds(), 0);

        app.heartbeat(t0() + Duration::seconds(2), 0.0, None);
        assert!(app.timer().is_running());
        assert_eq!(app.timer().elapsed_seconds(), 1);
    }

    #[test]
    fn afk_mode_counts_as_active() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(config(&dir), t0()).unwrap();
        app.start_focus(t0());
        app.timer_mut().afk_mode = true;

        app.heartbeat(t0() + Duration::seconds(1), 600.0, None);

        assert!(app.timer().is_running());
        assert_eq!(app.activity().active_seconds(), 1.0);
    }

    #[test]
    fn solved_node_is_not_credited() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open_at(config(&dir), t0()).unwrap();
        let focus = focus_on(&mut app, "Done");
        app.tree_mut(Perspective::Problems)
            .set_status(focus.node, crate::types::NodeStatus::Solved)
            .unwrap();
        app.start_focus(t0());

        app.heartbeat(t0() + Duration::seconds(1), 0.0, Some(focus));

        let node = app.tree(Perspective::Problems).node(focus.node).unwrap();
        assert!(node.intentions[0].stats.is_zero());
        assert_eq!(node.cycle_time, 0);
    }

    #[test]
    fn autosave_writes_every_file() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.autosave_secs = 2;
        let mut app = App::open_at(cfg.clone(), t0()).unwrap();

        assert!(!app.heartbeat(t0() + Duration::seconds(1), 0.0, None).autosaved);
        assert!(app.heartbeat(t0() + Duration::seconds(2), 0.0, None).autosaved);

        assert!(cfg.focus_data_path().exists());
        assert!(cfg.history_path().exists());
        assert!(cfg.timer_state_path().exists());
        assert!(cfg.tree_path(Perspective::Problems).exists());
        assert!(cfg.tree_path(Perspective::Values).exists());
    }

    #[test]
    fn reopen_restores_counters_and_timer() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        {
            let mut app = App::open_at(cfg.clone(), t0()).unwrap();
            app.start_focus(t0());
            app.text_mut().on_text("hello world ");
            for s in 1..=10 {
                app.heartbeat(t0() + Duration::seconds(s), 0.0, None);
            }
            app.save_all_at(t0() + Duration::seconds(10));
        }

        let app = App::open_at(cfg, t0() + Duration::seconds(20)).unwrap();

        assert_eq!(app.activity().active_seconds(), 10.0);
        assert_eq!(app.text().stats(), (2, 10));
        assert_eq!(app.timer().phase(), Phase::Focus);
        assert_eq!(app.timer().elapsed_seconds(), 10);
        assert_eq!(app.history().len(), 10);
    }

    #[test]
    fn midnight_rollover_resets_daily_counters() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let late = Local.with_ymd_and_hms(2024, 4, 15, 23, 59, 58).unwrap();
        let mut app = App::open_at(cfg.clone(), late).unwrap();
        app.text_mut().on_text("late night ");

        assert!(!app.heartbeat(late + Duration::seconds(1), 0.0, None).rolled_over);
        let report = app.heartbeat(late + Duration::seconds(3), 0.0, None);

        assert!(report.rolled_over);
        assert!(app.history().is_empty());
        assert_eq!(app.text().stats(), (0, 0));
        assert_eq!(app.activity().active_seconds(), 0.0);

        let saved = DailySummary::load(&cfg.focus_data_path()).unwrap();
        assert_eq!(saved.date, late.date_naive());
        assert_eq!(saved.words, 2);
    }

    #[test]
    fn review_session_appends_log() {
        let dir = TempDir::new().unwrap();
        let app = App::open_at(config(&dir), t0()).unwrap();

        app.review_session(SessionOutcome::Success, t0()).unwrap();
        app.review_session(SessionOutcome::Tried, t0()).unwrap();

        let entries = app.session_log().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].duration_mins, 1);
    }
}

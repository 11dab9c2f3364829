//! Pomodoro session timer.
//!
//! [`TimerEngine`] is a small phase state machine advanced by an external
//! 1 Hz heartbeat. It never reads the clock on its own schedule: every call to
//! [`TimerEngine::tick`] advances elapsed time by exactly one second, so the
//! host must call it at most once per second.
//!
//! # Phases
//!
//! ```text
//!            start_focus()            start_break()
//!   Idle ─────────────────▶ Focus ─────────────────▶ Break
//!    ▲                        │                        │
//!    └──────── stop() ────────┴──────── stop() ────────┘
//! ```
//!
//! A finished phase stays in place with `is_running == false`; the host
//! decides what comes next. The app follows focus with a break, and a break
//! with either a new focus session or `stop()`. `WaitFocus` is reserved and
//! never entered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: u64 = 60;

/// Current phase of the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Focus,
    Break,
    /// Reserved: no transition enters this phase.
    WaitFocus,
}

/// Which phase a tick just completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseCompletion {
    Focus,
    Break,
}

/// Phase lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub focus_minutes: u64,
    pub short_break_minutes: u64,
    pub long_break_minutes: u64,
    /// Every n-th completed focus cycle is followed by a long break.
    pub long_break_interval: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
        }
    }
}

/// Persistable copy of the full timer state.
///
/// Hosts write this to disk on autosave and feed it back through
/// [`TimerEngine::restore`] on the next start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub total_seconds: u64,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub cycles_completed: u32,
    #[serde(default)]
    pub is_long_break: bool,
    #[serde(default)]
    pub afk_mode: bool,
    #[serde(default)]
    pub restriction_armed: bool,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_focus_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_focus_end: Option<DateTime<Utc>>,
}

/// Focus/break phase state machine.
#[derive(Debug, Clone, Default)]
pub struct TimerEngine {
    config: TimerConfig,
    phase: Phase,
    elapsed_seconds: u64,
    total_seconds: u64,
    is_running: bool,
    cycles_completed: u32,
    is_long_break: bool,
    /// Away-from-keyboard override; read by the host, no transitions here.
    pub afk_mode: bool,
    /// Distraction-control arming flag; read by the host, no transitions here.
    pub restriction_armed: bool,
    start_time: Option<DateTime<Utc>>,
    last_focus_start: Option<DateTime<Utc>>,
    last_focus_end: Option<DateTime<Utc>>,
}

impl TimerEngine {
    #[must_use]
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    #[must_use]
    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    #[must_use]
    pub fn is_long_break(&self) -> bool {
        self.is_long_break
    }

    /// Start and end of the most recently completed focus session.
    #[must_use]
    pub fn last_focus(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.last_focus_start.zip(self.last_focus_end)
    }

    /// Enters `Focus` with a fresh full-length countdown.
    pub fn start_focus(&mut self) {
        self.start_focus_at(Utc::now());
    }

    pub fn start_focus_at(&mut self, now: DateTime<Utc>) {
        self.phase = Phase::Focus;
        self.total_seconds = self.config.focus_minutes * SECONDS_PER_MINUTE;
        self.elapsed_seconds = 0;
        self.is_running = true;
        self.start_time = Some(now);
    }

    /// Enters `Break`, long if the completed cycle count is a positive
    /// multiple of the long break interval.
    pub fn start_break(&mut self) {
        let interval = self.config.long_break_interval;
        self.is_long_break =
            interval > 0 && self.cycles_completed > 0 && self.cycles_completed % interval == 0;

        let minutes = if self.is_long_break {
            self.config.long_break_minutes
        } else {
            self.config.short_break_minutes
        };

        self.phase = Phase::Break;
        self.total_seconds = minutes * SECONDS_PER_MINUTE;
        self.elapsed_seconds = 0;
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Resumes the current phase. Does nothing while idle.
    pub fn resume(&mut self) {
        if self.phase != Phase::Idle {
            self.is_running = true;
        }
    }

    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
        self.is_running = false;
        self.elapsed_seconds = 0;
        self.total_seconds = 0;
    }

    /// Advances the running phase by one second.
    ///
    /// Returns the phase that finished on this tick, if any.
    pub fn tick(&mut self) -> Option<PhaseCompletion> {
        self.tick_at(Utc::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<PhaseCompletion> {
        if !self.is_running {
            return None;
        }

        match self.phase {
            Phase::Focus => {
                self.elapsed_seconds += 1;
                if self.elapsed_seconds >= self.total_seconds {
                    self.last_focus_end = Some(now);
                    self.last_focus_start = self.start_time;
                    self.cycles_completed += 1;
                    self.is_running = false;
                    return Some(PhaseCompletion::Focus);
                }
                None
            }
            Phase::Break => {
                self.elapsed_seconds += 1;
                if self.elapsed_seconds >= self.total_seconds {
                    self.is_running = false;
                    return Some(PhaseCompletion::Break);
                }
                None
            }
            Phase::Idle | Phase::WaitFocus => None,
        }
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        self.total_seconds.saturating_sub(self.elapsed_seconds)
    }

    /// Fraction of the phase elapsed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.elapsed_seconds as f64 / self.total_seconds as f64).min(1.0)
    }

    /// `true` once a started phase has run its full length.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.is_running && self.total_seconds > 0 && self.elapsed_seconds >= self.total_seconds
    }

    /// Elapsed time as `MM:SS`. Always counts up.
    #[must_use]
    pub fn time_string(&self) -> String {
        let minutes = self.elapsed_seconds / SECONDS_PER_MINUTE;
        let seconds = self.elapsed_seconds % SECONDS_PER_MINUTE;
        format!("{minutes:02}:{seconds:02}")
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            elapsed_seconds: self.elapsed_seconds,
            total_seconds: self.total_seconds,
            is_running: self.is_running,
            cycles_completed: self.cycles_completed,
            is_long_break: self.is_long_break,
            afk_mode: self.afk_mode,
            restriction_armed: self.restriction_armed,
            start_time: self.start_time,
            last_focus_start: self.last_focus_start,
            last_focus_end: self.last_focus_end,
        }
    }

    /// Replaces the state with a snapshot, keeping the current config.
    pub fn restore(&mut self, snapshot: &TimerSnapshot) {
        self.phase = snapshot.phase;
        self.elapsed_seconds = snapshot.elapsed_seconds;
        self.total_seconds = snapshot.total_seconds;
        self.is_running = snapshot.is_running;
        self.cycles_completed = snapshot.cycles_completed;
        self.is_long_break = snapshot.is_long_break;
        self.afk_mode = snapshot.afk_mode;
        self.restriction_armed = snapshot.restriction_armed;
        self.start_time = snapshot.start_time;
        self.last_focus_start = snapshot.last_focus_start;
        self.last_focus_end = snapshot.last_focus_end;
    }
}

//! Shared value types for the LifeTree core.
//!
//! These types are persisted inside the tree snapshot files, so every field
//! name is snake_case and every optional field has a serde default.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Designated root label of the problems perspective.
pub const PROBLEMS_ROOT_LABEL: &str = "My Life";

/// Designated root label of the values perspective.
pub const VALUES_ROOT_LABEL: &str = "My Values";

/// Productivity statistics accumulated by a node or intention.
///
/// `time` is active seconds (fractional, as reported by the activity
/// tracker); `words` and `chars` are typed text counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub words: u64,
    #[serde(default)]
    pub chars: u64,
}

impl Stats {
    /// The empty accumulator.
    pub const ZERO: Stats = Stats {
        time: 0.0,
        words: 0,
        chars: 0,
    };

    /// Creates a stats value from its three components.
    #[must_use]
    pub fn new(time: f64, words: u64, chars: u64) -> Self {
        Self { time, words, chars }
    }

    /// Returns `true` if every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.time == 0.0 && self.words == 0 && self.chars == 0
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(self, rhs: Stats) -> Stats {
        Stats {
            time: self.time + rhs.time,
            words: self.words + rhs.words,
            chars: self.chars + rhs.chars,
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Stats {
        iter.fold(Stats::ZERO, Add::add)
    }
}

/// Completion status of a node.
///
/// `Solving` is reserved: it round-trips through storage but no operation
/// treats it differently from `Neutral`. Unknown strings load as `Neutral`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum NodeStatus {
    #[default]
    Neutral,
    Solving,
    Solved,
}

impl From<String> for NodeStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "solved" => NodeStatus::Solved,
            "solving" => NodeStatus::Solving,
            _ => NodeStatus::Neutral,
        }
    }
}

impl NodeStatus {
    #[must_use]
    pub fn is_solved(self) -> bool {
        matches!(self, NodeStatus::Solved)
    }
}

/// Lifecycle of an intention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum IntentionStatus {
    #[default]
    Active,
    Completed,
}

impl From<String> for IntentionStatus {
    fn from(value: String) -> Self {
        if value == "completed" {
            IntentionStatus::Completed
        } else {
            IntentionStatus::Active
        }
    }
}

/// A small task record attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intention {
    pub text: String,
    #[serde(default)]
    pub status: IntentionStatus,
    #[serde(default)]
    pub stats: Stats,
}

impl Intention {
    /// Creates a new active intention with empty stats.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: IntentionStatus::Active,
            stats: Stats::ZERO,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == IntentionStatus::Completed
    }
}

/// Geometric hints owned by the external layout collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 40.0,
        }
    }
}

/// Which goal tree a manager operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perspective {
    Problems,
    Values,
}

impl Perspective {
    /// Label of the designated root for this perspective.
    #[must_use]
    pub fn root_label(self) -> &'static str {
        match self {
            Perspective::Problems => PROBLEMS_ROOT_LABEL,
            Perspective::Values => VALUES_ROOT_LABEL,
        }
    }

    /// File name of the snapshot inside the data directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Perspective::Problems => "tree_data.json",
            Perspective::Values => "values_data.json",
        }
    }
}

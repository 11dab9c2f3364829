//! LifeTree - goal tree, focus timer and productivity history engine.
//!
//! This crate is the non-UI core of a personal productivity tool. It models
//! goals as a tree with stat-conserving edits and undo/redo, runs Pomodoro
//! focus/break sessions, and keeps a same-day time series of active time and
//! typing activity.
//!
//! # Overview
//!
//! A host (the `lifetree` binary, or a desktop shell) owns an [`app::App`]
//! and calls [`App::heartbeat`](app::App::heartbeat) once per second. Tree
//! edits go through [`tree::TreeStateManager`]; completion percentages come
//! from [`progress`] on demand.
//!
//! # Modules
//!
//! - [`types`]: Shared value types (stats, statuses, intentions, layout)
//! - [`node`]: Node entity, ids and the persisted record form
//! - [`forest`]: Arena of nodes with structural primitives
//! - [`tree`]: Tree state manager with undo/redo and persistence
//! - [`progress`]: Subtree completion percentages
//! - [`timer`]: Pomodoro phase state machine
//! - [`history`]: Bounded same-day time series
//! - [`trackers`]: Active-time and text-activity counters
//! - [`summary`]: Daily summary and startup reconciliation
//! - [`session_log`]: Focus session review log
//! - [`persistence`]: Atomic JSON file IO
//! - [`app`]: Application host tying the components together
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types

pub mod app;
pub mod config;
pub mod error;
pub mod forest;
pub mod history;
pub mod node;
pub mod persistence;
pub mod progress;
pub mod session_log;
pub mod summary;
pub mod timer;
pub mod trackers;
pub mod tree;
pub mod types;

pub use app::{App, Focus, HeartbeatReport};
pub use config::{Config, ConfigError};
pub use error::{LifeTreeError, Result};
pub use forest::Forest;
pub use history::{HistoryData, HistoryPoint, HistoryRecorder};
pub use node::{Node, NodeId, NodeRecord};
pub use persistence::PersistenceError;
pub use progress::percentage;
pub use session_log::{SessionLog, SessionLogEntry, SessionOutcome};
pub use summary::{reconcile, DailySummary, RestoredStats};
pub use timer::{Phase, PhaseCompletion, TimerConfig, TimerEngine, TimerSnapshot};
pub use trackers::{ActiveTimeSource, ActivityTracker, TextActivitySource, TextActivityTracker};
pub use tree::{TreeError, TreeStateManager};
pub use types::{Intention, IntentionStatus, Layout, NodeStatus, Perspective, Stats};

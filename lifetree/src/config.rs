//! Configuration module for LifeTree.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `LIFETREE_DATA_DIR` | No | `~/.lifetree` | Directory holding every data file |
//! | `LIFETREE_FOCUS_MINUTES` | No | 25 | Focus session length |
//! | `LIFETREE_SHORT_BREAK_MINUTES` | No | 5 | Short break length |
//! | `LIFETREE_LONG_BREAK_MINUTES` | No | 15 | Long break length |
//! | `LIFETREE_LONG_BREAK_INTERVAL` | No | 4 | Focus cycles per long break |
//! | `LIFETREE_IDLE_THRESHOLD_SECS` | No | 25 | Idle seconds before the user counts as inactive |
//! | `LIFETREE_CYCLE_TIME_LIMIT_SECS` | No | 28800 | Length of a per-node productivity cycle |
//! | `LIFETREE_HISTORY_CAPACITY` | No | 86400 | History ring buffer size |
//! | `LIFETREE_UNDO_LIMIT` | No | 100 | Undo/redo depth |
//! | `LIFETREE_AUTOSAVE_SECS` | No | 60 | Heartbeats between autosaves |
//!
//! Every numeric value must be a positive integer.
//!
//! # Example
//!
//! ```no_run
//! use lifetree::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Data dir: {}", config.data_dir.display());
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use directories::BaseDirs;
use thiserror::Error;

use crate::timer::TimerConfig;
use crate::types::Perspective;

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".lifetree";

const DEFAULT_FOCUS_MINUTES: u64 = 25;
const DEFAULT_SHORT_BREAK_MINUTES: u64 = 5;
const DEFAULT_LONG_BREAK_MINUTES: u64 = 15;
const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;
const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 25;

/// Eight hours of focused work per node cycle.
const DEFAULT_CYCLE_TIME_LIMIT_SECS: u64 = 28_800;

const DEFAULT_HISTORY_CAPACITY: usize = 86_400;
const DEFAULT_UNDO_LIMIT: usize = 100;
const DEFAULT_AUTOSAVE_SECS: u64 = 60;

const FOCUS_DATA_FILE: &str = "focus_data.json";
const HISTORY_FILE: &str = "stats_history.json";
const TIMER_STATE_FILE: &str = "timer_state.json";
const SESSION_LOGS_FILE: &str = "session_logs.json";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for LifeTree.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing the tree, history, summary and log files.
    pub data_dir: PathBuf,

    /// Pomodoro phase lengths.
    pub timer: TimerConfig,

    /// Seconds without input after which the user counts as idle.
    pub idle_threshold_secs: u64,

    /// Seconds of focused work that complete one node cycle.
    pub cycle_time_limit_secs: u64,

    /// Maximum number of history points kept in memory.
    pub history_capacity: usize,

    /// Maximum depth of the undo and redo stacks.
    pub undo_limit: usize,

    /// Number of heartbeats between autosaves.
    pub autosave_secs: u64,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - a numeric variable is set but is not a positive integer
    /// - `LIFETREE_DATA_DIR` is unset and the home directory cannot be determined
    pub fn from_env() -> Result<Self, ConfigError> {
        // Optional: LIFETREE_DATA_DIR (default: ~/.lifetree)
        let data_dir = match env::var("LIFETREE_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs.home_dir().join(DEFAULT_DATA_DIR)
            }
        };

        let timer = TimerConfig {
            focus_minutes: positive("LIFETREE_FOCUS_MINUTES", DEFAULT_FOCUS_MINUTES)?,
            short_break_minutes: positive(
                "LIFETREE_SHORT_BREAK_MINUTES",
                DEFAULT_SHORT_BREAK_MINUTES,
            )?,
            long_break_minutes: positive(
                "LIFETREE_LONG_BREAK_MINUTES",
                DEFAULT_LONG_BREAK_MINUTES,
            )?,
            long_break_interval: positive(
                "LIFETREE_LONG_BREAK_INTERVAL",
                DEFAULT_LONG_BREAK_INTERVAL,
            )?,
        };

        Ok(Self {
            data_dir,
            timer,
            idle_threshold_secs: positive(
                "LIFETREE_IDLE_THRESHOLD_SECS",
                DEFAULT_IDLE_THRESHOLD_SECS,
            )?,
            cycle_time_limit_secs: positive(
                "LIFETREE_CYCLE_TIME_LIMIT_SECS",
                DEFAULT_CYCLE_TIME_LIMIT_SECS,
            )?,
            history_capacity: positive("LIFETREE_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?,
            undo_limit: positive("LIFETREE_UNDO_LIMIT", DEFAULT_UNDO_LIMIT)?,
            autosave_secs: positive("LIFETREE_AUTOSAVE_SECS", DEFAULT_AUTOSAVE_SECS)?,
        })
    }

    /// Default configuration rooted at `data_dir`, ignoring the environment.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timer: TimerConfig::default(),
            idle_threshold_secs: DEFAULT_IDLE_THRESHOLD_SECS,
            cycle_time_limit_secs: DEFAULT_CYCLE_TIME_LIMIT_SECS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            undo_limit: DEFAULT_UNDO_LIMIT,
            autosave_secs: DEFAULT_AUTOSAVE_SECS,
        }
    }

    /// Snapshot file for one tree perspective.
    #[must_use]
    pub fn tree_path(&self, perspective: Perspective) -> PathBuf {
        self.data_dir.join(perspective.file_name())
    }

    #[must_use]
    pub fn focus_data_path(&self) -> PathBuf {
        self.data_dir.join(FOCUS_DATA_FILE)
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    #[must_use]
    pub fn timer_state_path(&self) -> PathBuf {
        self.data_dir.join(TIMER_STATE_FILE)
    }

    #[must_use]
    pub fn session_logs_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_LOGS_FILE)
    }
}

/// Parses an optional positive integer variable, falling back to `default`.
fn positive<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let Ok(val) = env::var(key) else {
        return Ok(default);
    };

    let parsed = val
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected positive integer, got '{val}'"),
        })?;
    if parsed == T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value must be greater than 0".to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to run tests with isolated environment variables.
    /// Clears all LIFETREE_* vars before the test and restores them after.
    fn with_clean_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let saved_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with("LIFETREE_"))
            .collect();

        for (key, _) in &saved_vars {
            env::remove_var(key);
        }

        let result = f();

        let leftover: Vec<String> = env::vars()
            .map(|(k, _)| k)
            .filter(|k| k.starts_with("LIFETREE_"))
            .collect();
        for key in leftover {
            env::remove_var(key);
        }
        for (key, value) in saved_vars {
            env::set_var(key, value);
        }

        result
    }

    #[test]
    #[serial]
    fn test_defaults() {
        with_clean_env(|| {
            let config = Config::from_env().expect("should parse with no variables set");

            assert!(config.data_dir.ends_with(DEFAULT_DATA_DIR));
            assert_eq!(config.timer, TimerConfig::default());
            assert_eq!(config.idle_threshold_secs, 25);
            assert_eq!(config.cycle_time_limit_secs, 28_800);
            assert_eq!(config.history_capacity, 86_400);
            assert_eq!(config.undo_limit, 100);
            assert_eq!(config.autosave_secs, 60);
        });
    }

    #[test]
    #[serial]
    fn test_full_config() {
        with_clean_env(|| {
            env::set_var("LIFETREE_DATA_DIR", "/custom/data");
            env::set_var("LIFETREE_FOCUS_MINUTES", "50");
            env::set_var("LIFETREE_SHORT_BREAK_MINUTES", "10");
            env::set_var("LIFETREE_LONG_BREAK_MINUTES", "30");
            env::set_var("LIFETREE_LONG_BREAK_INTERVAL", "3");
            env::set_var("LIFETREE_IDLE_THRESHOLD_SECS", "60");
            env::set_var("LIFETREE_CYCLE_TIME_LIMIT_SECS", "3600");
            env::set_var("LIFETREE_HISTORY_CAPACITY", "1000");
            env::set_var("LIFETREE_UNDO_LIMIT", "20");
            env::set_var("LIFETREE_AUTOSAVE_SECS", "30");

            let config = Config::from_env().expect("should parse full config");

            assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
            assert_eq!(
                config.timer,
                TimerConfig {
                    focus_minutes: 50,
                    short_break_minutes: 10,
                    long_break_minutes: 30,
                    long_break_interval: 3,
                }
            );
            assert_eq!(config.idle_threshold_secs, 60);
            assert_eq!(config.cycle_time_limit_secs, 3600);
            assert_eq!(config.history_capacity, 1000);
            assert_eq!(config.undo_limit, 20);
            assert_eq!(config.autosave_secs, 30);
        });
    }

    #[test]
    #[serial]
    fn test_invalid_number_rejected() {
        with_clean_env(|| {
            env::set_var("LIFETREE_FOCUS_MINUTES", "soon");

            let err = Config::from_env().unwrap_err();

            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "LIFETREE_FOCUS_MINUTES"
            ));
        });
    }

    #[test]
    #[serial]
    fn test_zero_rejected() {
        with_clean_env(|| {
            env::set_var("LIFETREE_UNDO_LIMIT", "0");

            let err = Config::from_env().unwrap_err();

            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, ref message }
                    if key == "LIFETREE_UNDO_LIMIT" && message.contains("greater than 0")
            ));
        });
    }

    #[test]
    #[serial]
    fn test_negative_rejected() {
        with_clean_env(|| {
            env::set_var("LIFETREE_HISTORY_CAPACITY", "-5");
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    #[serial]
    fn test_whitespace_is_trimmed() {
        with_clean_env(|| {
            env::set_var("LIFETREE_AUTOSAVE_SECS", " 15 ");
            let config = Config::from_env().expect("should trim value");
            assert_eq!(config.autosave_secs, 15);
        });
    }

    #[test]
    fn test_file_paths() {
        let config = Config::with_data_dir("/data");

        assert_eq!(
            config.tree_path(Perspective::Problems),
            PathBuf::from("/data/tree_data.json")
        );
        assert_eq!(
            config.tree_path(Perspective::Values),
            PathBuf::from("/data/values_data.json")
        );
        assert_eq!(config.focus_data_path(), PathBuf::from("/data/focus_data.json"));
        assert_eq!(config.history_path(), PathBuf::from("/data/stats_history.json"));
        assert_eq!(
            config.timer_state_path(),
            PathBuf::from("/data/timer_state.json")
        );
        assert_eq!(
            config.session_logs_path(),
            PathBuf::from("/data/session_logs.json")
        );
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidValue {
            key: "LIFETREE_UNDO_LIMIT".to_string(),
            message: "value must be greater than 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for LIFETREE_UNDO_LIMIT: value must be greater than 0"
        );
    }
}

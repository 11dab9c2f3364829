//! Focus session review log.
//!
//! When a focus session ends the user rates it, and one entry is appended to
//! a JSON array on disk.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::persistence::{quarantine, read_json, write_json_atomic, PersistenceError};

/// How a focus session went, as judged by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Success,
    Tried,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    /// Local wall-clock time of the review.
    pub timestamp: NaiveDateTime,
    pub outcome: SessionOutcome,
    pub duration_mins: u64,
}

impl SessionLogEntry {
    #[must_use]
    pub fn new(timestamp: NaiveDateTime, outcome: SessionOutcome, duration_mins: u64) -> Self {
        Self {
            timestamp,
            outcome,
            duration_mins,
        }
    }
}

/// Append-only review log file.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every entry on file. Missing or corrupt files read as empty.
    #[must_use]
    pub fn entries(&self) -> Vec<SessionLogEntry> {
        match read_json(&self.path) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read session log, treating as empty");
                Vec::new()
            }
        }
    }

    /// Appends one entry and rewrites the file.
    ///
    /// A corrupt file is moved to `*.corrupt` and replaced by a log holding
    /// only the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the file cannot be read, moved aside
    /// or written.
    pub fn append(&self, entry: SessionLogEntry) -> Result<(), PersistenceError> {
        let mut entries = match read_json(&self.path) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e @ PersistenceError::Json { .. }) => {
                let moved = quarantine(&self.path)?;
                warn!(
                    error = %e,
                    moved_to = %moved.display(),
                    "Unreadable session log moved aside"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(entry);
        write_json_atomic(&self.path, &entries)
    }
}

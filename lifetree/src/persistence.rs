//! JSON file persistence.
//!
//! Every data file LifeTree owns is a single JSON document that is rewritten
//! in full on save.
//!
//! # Design
//!
//! - **Atomic writes**: documents are written to a temp file in the target
//!   directory and renamed over the destination, so a crash never leaves a
//!   partially written file behind.
//!
//! - **Missing is not an error**: [`read_json`] returns `Ok(None)` when the
//!   file does not exist. Callers decide what a fresh state looks like.
//!
//! - **No depth limit**: tree files nest one level per generation, so parsing
//!   runs without serde_json's recursion limit on a growing stack.
//!
//! - **Corrupt files are kept**: callers that start fresh after a parse
//!   error move the file aside with [`quarantine`] first, so the next save
//!   cannot overwrite it.
//!
//! # Example
//!
//! ```no_run
//! use lifetree::persistence::{read_json, write_json_atomic};
//! use std::path::Path;
//!
//! let path = Path::new("/tmp/lifetree/example.json");
//! write_json_atomic(path, &vec![1, 2, 3]).unwrap();
//! let back: Option<Vec<u32>> = read_json(path).unwrap();
//! assert_eq!(back, Some(vec![1, 2, 3]));
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while reading or writing a data file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading, writing or renaming the file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document could not be serialized or parsed.
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Serializes `value` as pretty JSON and atomically replaces `path` with it.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`PersistenceError`] if serialization fails or the temp file cannot
/// be created, written, or renamed into place.
pub fn write_json_atomic<T>(path: &Path, value: &T) -> Result<(), PersistenceError>
where
    T: Serialize + ?Sized,
{
    let content = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::json(path, e))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| PersistenceError::io(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PersistenceError::io(path, e))?;
    tmp.write_all(&content)
        .map_err(|e| PersistenceError::io(path, e))?;
    tmp.flush().map_err(|e| PersistenceError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| PersistenceError::io(path, e.error))?;

    Ok(())
}

/// Reads and parses a JSON document.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the file exists but cannot be read or parsed.
pub fn read_json<T>(path: &Path) -> Result<Option<T>, PersistenceError>
where
    T: DeserializeOwned,
{
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };

    parse_unbounded(&content)
        .map(Some)
        .map_err(|e| PersistenceError::json(path, e))
}

fn parse_unbounded<T>(content: &[u8]) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    let mut de = serde_json::Deserializer::from_slice(content);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Renames `path` to `<file name>.corrupt` in the same directory and
/// returns the new path. An older quarantined copy is replaced.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] if the rename fails.
pub fn quarantine(path: &Path) -> Result<PathBuf, PersistenceError> {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    let target = path.with_file_name(name);

    fs::rename(path, &target).map_err(|e| PersistenceError::io(path, e))?;
    Ok(target)
}

//! Error types for LifeTree.
//!
//! Each component has its own error enum; [`LifeTreeError`] wraps them for
//! callers that drive several components at once, such as the application
//! host and the command line.

use thiserror::Error;

use crate::config::ConfigError;
use crate::persistence::PersistenceError;
use crate::tree::TreeError;

/// Errors that can occur during LifeTree operations.
#[derive(Error, Debug)]
pub enum LifeTreeError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A data file could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// A tree operation was rejected.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for LifeTree operations.
pub type Result<T> = std::result::Result<T, LifeTreeError>;

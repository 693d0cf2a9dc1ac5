//! Error types for the journal federation library

use std::fmt;
use thiserror::Error;

/// Result type used across the library
pub type Result<T> = std::result::Result<T, Error>;

/// Which backing store a handler talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Graph store holding DOAJ journal records
    Journal,

    /// Relational store holding Scimago categories and areas
    Category,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Journal => write!(f, "journal"),
            StoreKind::Category => write!(f, "category"),
        }
    }
}

/// Errors raised by handlers and engines
///
/// A query that matches nothing is not an error: it is an empty `Vec`.
#[derive(Error, Debug)]
pub enum Error {
    /// No handler registered for a store the query needs
    #[error("No {0} handler configured")]
    NoHandlerConfigured(StoreKind),

    /// A store round-trip failed (network, disk, bad status)
    #[error("Store unavailable at {location}: {reason}")]
    StoreUnavailable { location: String, reason: String },

    /// A store answered, but a row could not be normalized into the entity model
    #[error("Malformed row from {location}: {reason}")]
    MalformedRow { location: String, reason: String },

    /// Entity construction rejected its input
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Wrap any backend failure as an unavailable store
    pub fn unavailable(location: &str, reason: impl fmt::Display) -> Self {
        Error::StoreUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(location: &str, reason: impl fmt::Display) -> Self {
        Error::MalformedRow {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}

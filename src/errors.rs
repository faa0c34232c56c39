//! Unified error type for the trade journal backend.
//!
//! Every fallible operation in the crate returns [`Result`]. Database, HTTP client,
//! JSON and I/O failures convert automatically through `#[from]`, while domain
//! failures carry the context needed to build a user-facing message.

use thiserror::Error;

/// All errors produced by the trade journal backend.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read, parsed or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Database layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A monetary amount was zero, negative or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A requested row does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up (e.g. `"recurring transaction"`)
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// Input failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the rejected input
        message: String,
    },

    /// Calendar arithmetic left the representable date range
    #[error("Date out of range: {message}")]
    DateOutOfRange {
        /// Description of the overflowing computation
        message: String,
    },

    /// A third-party service answered with something unusable
    #[error("Upstream error from {service}: {message}")]
    Upstream {
        /// Name of the external service
        service: &'static str,
        /// Description of the failure
        message: String,
    },

    /// Outbound HTTP request failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure (config file, socket bind)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for building a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

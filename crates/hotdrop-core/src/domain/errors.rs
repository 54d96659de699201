//! Domain error types

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was empty or contained characters that cannot appear in a URL segment
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A content hash was not a lowercase hex SHA-256 digest
    #[error("Invalid hash format: {0}")]
    InvalidHash(String),

    /// A job path was not absolute or had no file name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },
}

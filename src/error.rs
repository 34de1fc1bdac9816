//! Error types for the lock catalog
//!
//! Every failure the protocol can report maps to exactly one variant, so
//! callers can branch on the kind without inspecting message text. A
//! conditional update that matched nothing is NOT an error; it surfaces as
//! `Ok(None)` from the catalog operations.

use thiserror::Error;

/// Result type alias using LockError
pub type Result<T> = std::result::Result<T, LockError>;

/// Numeric error codes shared with the config store
pub mod codes {
    pub const BAD_VALUE: i32 = 2;
    pub const HOST_UNREACHABLE: i32 = 6;
    pub const UNKNOWN_ERROR: i32 = 8;
    pub const FAILED_TO_PARSE: i32 = 9;
    pub const TYPE_MISMATCH: i32 = 14;
    pub const WRITE_CONCERN_FAILED: i32 = 64;
    pub const NETWORK_TIMEOUT: i32 = 89;
    pub const UNSUPPORTED_FORMAT: i32 = 93;
    pub const NOT_MASTER: i32 = 10107;
    pub const DUPLICATE_KEY: i32 = 11000;
}

/// Unified error type for lock catalog operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LockError {
    // -------------------------------------------------------------------------
    // Gateway Errors
    // -------------------------------------------------------------------------
    /// No host satisfying the read preference could be targeted
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),

    /// The command could not be delivered or its reply was lost
    #[error("Execution failed: {0}")]
    Execution(String),

    // -------------------------------------------------------------------------
    // Store-Reported Errors
    // -------------------------------------------------------------------------
    /// The store ran the command and reported `ok: 0`
    #[error("Command failed (code {code}): {message}")]
    Command { code: i32, message: String },

    /// The mutation was applied on the primary but not acknowledged by the
    /// required quorum within the write concern timeout
    #[error("Write concern failed: {0}")]
    WriteConcernFailed(String),

    // -------------------------------------------------------------------------
    // Decoding Errors
    // -------------------------------------------------------------------------
    /// The response envelope does not have the expected shape
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A returned document could not be decoded into a record
    #[error("Failed to parse: {0}")]
    FailedToParse(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LockError {
    /// Numeric code for this error, matching the store's code space
    pub fn code(&self) -> i32 {
        match self {
            LockError::HostUnavailable(_) => codes::HOST_UNREACHABLE,
            LockError::Execution(_) => codes::NETWORK_TIMEOUT,
            LockError::Command { code, .. } => *code,
            LockError::WriteConcernFailed(_) => codes::WRITE_CONCERN_FAILED,
            LockError::UnsupportedFormat(_) => codes::UNSUPPORTED_FORMAT,
            LockError::FailedToParse(_) => codes::FAILED_TO_PARSE,
            LockError::Config(_) => codes::BAD_VALUE,
        }
    }

    /// Whether this is a store-reported failure with the given code
    pub fn is_command_code(&self, expected: i32) -> bool {
        matches!(self, LockError::Command { code, .. } if *code == expected)
    }
}

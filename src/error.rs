//! Error types for the SQL tutor.
//!
//! Infrastructure failures (connecting, loading content, configuration) are
//! `TutorError`s. Failures of a submitted query are not: the evaluator and
//! sandbox runner fold those into their outcome types instead.

use thiserror::Error;

/// Main error type for tutor operations.
#[derive(Error, Debug)]
pub enum TutorError {
    /// Database connection errors (host unreachable, bad URL, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The SQL engine rejected or failed a query. Holds the engine's message.
    #[error("Query error: {0}")]
    Execution(String),

    /// Configuration errors (invalid config file, bad URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lesson or tutorial content could not be loaded.
    #[error("Content error: {0}")]
    Content(String),

    /// A requested level, tutorial, or question does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Talking to a remote tutor server failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TutorError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a content error with the given message.
    pub fn content(msg: impl Into<String>) -> Self {
        Self::Content(msg.into())
    }

    /// Creates a not-found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates an HTTP error with the given message.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the bare message without the category prefix.
    ///
    /// Query outcomes carry this text verbatim.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Execution(msg)
            | Self::Config(msg)
            | Self::Content(msg)
            | Self::NotFound(msg)
            | Self::Http(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Execution(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Content(_) => "Content Error",
            Self::NotFound(_) => "Not Found",
            Self::Http(_) => "HTTP Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns a stable machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Execution(_) => "QUERY_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Content(_) => "CONTENT_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Http(_) => "HTTP_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias using TutorError.
pub type Result<T> = std::result::Result<T, TutorError>;

//! Error types and Result aliases for the student records service.
//!
//! Infrastructure failures use [`Error`]; the outcomes a caller can trigger
//! through a query are modelled separately by [`QueryError`] so transports can
//! turn them into envelopes without treating them as faults.

use thiserror::Error;

use crate::students::ErrorCode;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for service operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database/storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Server/API error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// `SQLite` database error.
    #[error("database error: {0}")]
    Database(String),

    /// Record not found.
    #[error("not found: {entity} with id '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Server/API errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Request handling error.
    #[error("request error: {0}")]
    Request(String),
}

/// Outcome of a student query that did not produce data.
///
/// Everything except [`QueryError::BackingStore`] is an expected,
/// caller-triggered result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Course or semester was absent.
    #[error("Course and semester parameters are required")]
    MissingParameters,

    /// The student id was blank.
    #[error("Student ID is required")]
    MissingStudentId,

    /// Course code is not part of the catalog.
    #[error("Invalid course code provided")]
    InvalidCourse { input: String, valid: Vec<String> },

    /// Semester is non-numeric or outside the catalog.
    #[error("Invalid semester number provided")]
    InvalidSemester { input: String, valid: Vec<u8> },

    /// The pair was valid but nothing matched.
    #[error("No students found for {course} semester {semester}")]
    NoStudentsFound { course: String, semester: u8 },

    /// No student carries the requested id.
    #[error("Student not found")]
    NotFound { id: String },

    /// The backing source failed.
    #[error("backing store error: {0}")]
    BackingStore(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl StorageError {
    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl QueryError {
    /// Machine-readable code carried in error envelopes.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingParameters | Self::MissingStudentId => ErrorCode::MissingParameters,
            Self::InvalidCourse { .. } => ErrorCode::InvalidCourse,
            Self::InvalidSemester { .. } => ErrorCode::InvalidSemester,
            Self::NoStudentsFound { .. } => ErrorCode::NoStudentsFound,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::BackingStore(_) => ErrorCode::BackingStoreError,
        }
    }

    /// Message safe to show to any caller.
    ///
    /// Store failures are reduced to a generic sentence; the detail stays in
    /// the server log and, in development, in the envelope's `details`.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::BackingStore(_) => {
                "Internal server error occurred while fetching students".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether this outcome signals a collaborator malfunction.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::BackingStore(_))
    }
}

impl From<Error> for QueryError {
    fn from(err: Error) -> Self {
        Self::BackingStore(err.to_string())
    }
}

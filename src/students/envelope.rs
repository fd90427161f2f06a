//! The uniform `{ success, message, data, meta }` response wrapper.
//!
//! Both transports serialize the same envelope. Fields are private so the
//! only way to build one is [`Envelope::success`] (data present) or
//! [`Envelope::failure`] (data absent).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::QueryError;

/// Machine-readable failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingParameters,
    InvalidCourse,
    InvalidSemester,
    NoStudentsFound,
    NotFound,
    BackingStoreError,
    /// Event-channel frame that could not be understood.
    InvalidEvent,
}

impl ErrorCode {
    /// Stable label, used for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingParameters => "missing_parameters",
            Self::InvalidCourse => "invalid_course",
            Self::InvalidSemester => "invalid_semester",
            Self::NoStudentsFound => "no_students_found",
            Self::NotFound => "not_found",
            Self::BackingStoreError => "backing_store_error",
            Self::InvalidEvent => "invalid_event",
        }
    }
}

/// Derived facts about a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Correlation id echoed back on the event channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Meta {
    /// Empty meta stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            course: None,
            course_name: None,
            semester: None,
            count: None,
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Error payload attached to failed envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_courses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_semesters: Option<Vec<u8>>,
    /// Internal diagnostics; only populated in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Response wrapper shared by REST and the event channel.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    success: bool,
    message: String,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
    meta: Meta,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn success(message: impl Into<String>, data: T, meta: Meta) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            meta,
        }
    }

    /// Failed envelope for a query outcome.
    ///
    /// Validation failures enumerate the accepted values. `details` is only
    /// filled for store faults and only when `expose_details` is set.
    #[must_use]
    pub fn failure(err: &QueryError, expose_details: bool) -> Self {
        let mut meta = Meta::now();
        let mut detail = ErrorDetail {
            code: err.code(),
            valid_courses: None,
            valid_semesters: None,
            details: None,
        };

        match err {
            QueryError::InvalidCourse { valid, .. } => detail.valid_courses = Some(valid.clone()),
            QueryError::InvalidSemester { valid, .. } => {
                detail.valid_semesters = Some(valid.clone());
            }
            QueryError::NoStudentsFound { course, semester } => {
                meta.course = Some(course.clone());
                meta.semester = Some(*semester);
            }
            QueryError::BackingStore(_) if expose_details => {
                detail.details = Some(err.to_string());
            }
            _ => {}
        }

        Self {
            success: false,
            message: err.public_message(),
            data: None,
            error: Some(detail),
            meta,
        }
    }

    /// Failed envelope for an event frame that could not be handled.
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(ErrorDetail {
                code: ErrorCode::InvalidEvent,
                valid_courses: None,
                valid_semesters: None,
                details: None,
            }),
            meta: Meta::now(),
        }
    }

    /// Attach a correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.meta.request_id = request_id;
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Failure code, if this envelope reports one.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

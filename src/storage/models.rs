//! Data models for storage operations.
//!
//! The nested shape mirrors the admissions documents the service reads:
//! personal contact data, the academic placement, and the guardian.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A student as seen by the records service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Unique identifier, e.g. `CSE001`.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Institute roll number.
    pub roll_number: String,

    /// Contact details.
    pub contact: ContactInfo,

    /// Course placement and performance.
    pub academic: AcademicInfo,

    /// Guardian contact details.
    pub guardian: GuardianInfo,
}

/// Student contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
}

/// Academic placement and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicInfo {
    /// Canonical course code.
    pub course: String,

    /// Semester number.
    pub semester: u8,

    /// Cumulative grade point average on a 10-point scale.
    pub cgpa: f64,

    /// Attendance percentage.
    pub attendance: u8,
}

/// Guardian contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianInfo {
    pub name: String,
    pub phone: String,
}

impl StudentRecord {
    /// Whether this record belongs to the given bucket.
    #[must_use]
    pub fn is_in(&self, course: &str, semester: u8) -> bool {
        self.academic.course == course && self.academic.semester == semester
    }
}

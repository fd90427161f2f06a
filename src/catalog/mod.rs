//! Course and semester enumerations.
//!
//! The catalog is built once at startup and shared read-only behind an `Arc`.
//! Lookups normalize course input to upper case here, so the rest of the
//! service only ever sees canonical codes.

use serde::Serialize;

/// A course offered by the institute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Canonical upper-case code, e.g. `CSE`.
    pub code: String,
    /// Human-readable program name.
    pub display_name: String,
}

/// Immutable set of known courses and semesters.
#[derive(Debug, Clone)]
pub struct Catalog {
    courses: Vec<Course>,
    semesters: Vec<u8>,
}

impl Catalog {
    /// Create a catalog from explicit course and semester lists.
    ///
    /// Course codes are stored upper-cased.
    #[must_use]
    pub fn new<I, C, N>(courses: I, semesters: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let courses = courses
            .into_iter()
            .map(|(code, name)| Course {
                code: code.into().to_uppercase(),
                display_name: name.into(),
            })
            .collect();
        Self { courses, semesters }
    }

    /// The institute's programs with semesters 1 through 8.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            [
                ("CSE", "Computer Science Engineering"),
                ("ECE", "Electronics and Communication Engineering"),
                ("ME", "Mechanical Engineering"),
                ("CE", "Civil Engineering"),
                ("EE", "Electrical Engineering"),
                ("IT", "Information Technology"),
            ],
            (1..=8).collect(),
        )
    }

    /// Look up a course case-insensitively.
    #[must_use]
    pub fn course(&self, input: &str) -> Option<&Course> {
        let code = input.trim().to_uppercase();
        self.courses.iter().find(|course| course.code == code)
    }

    /// Whether the semester is part of the catalog.
    #[must_use]
    pub fn has_semester(&self, semester: u8) -> bool {
        self.semesters.contains(&semester)
    }

    /// All courses, in catalog order.
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// All course codes, in catalog order.
    #[must_use]
    pub fn course_codes(&self) -> Vec<String> {
        self.courses.iter().map(|c| c.code.clone()).collect()
    }

    /// All semesters, in catalog order.
    #[must_use]
    pub fn semesters(&self) -> &[u8] {
        &self.semesters
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Room key shared by subscribers of one course/semester pair.
#[must_use]
pub fn room_name(course: &str, semester: u8) -> String {
    format!("{course}_{semester}")
}

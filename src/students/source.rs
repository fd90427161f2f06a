//! Backing sources the resolver reads students from.

use std::collections::BTreeMap;

use crate::storage::StudentRecord;
use crate::Result;

/// A read-only supplier of student records.
///
/// Implementations receive canonical (upper-case, catalogued) course codes.
/// Calls may block; async callers go through
/// [`StudentQueryResolver::run`](super::StudentQueryResolver::run).
pub trait StudentSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// All records in one (course, semester) bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn students_for(&self, course: &str, semester: u8) -> Result<Vec<StudentRecord>>;

    /// The first record whose id equals `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn find_student(&self, id: &str) -> Result<Option<StudentRecord>>;
}

/// In-memory bucket table.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    buckets: BTreeMap<(String, u8), Vec<StudentRecord>>,
}

impl FixtureSource {
    /// Bucket the given records by course and semester.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = StudentRecord>) -> Self {
        let mut buckets: BTreeMap<(String, u8), Vec<StudentRecord>> = BTreeMap::new();
        for record in records {
            buckets
                .entry((record.academic.course.clone(), record.academic.semester))
                .or_default()
                .push(record);
        }
        Self { buckets }
    }

    /// The built-in roster.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_records(super::fixtures::fixture_students())
    }

    /// Number of non-empty buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl StudentSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixtures"
    }

    fn students_for(&self, course: &str, semester: u8) -> Result<Vec<StudentRecord>> {
        Ok(self
            .buckets
            .get(&(course.to_string(), semester))
            .cloned()
            .unwrap_or_default())
    }

    fn find_student(&self, id: &str) -> Result<Option<StudentRecord>> {
        Ok(self
            .buckets
            .values()
            .find_map(|bucket| bucket.iter().find(|s| s.id == id))
            .cloned())
    }
}

//! Query validation and lookup shared by every transport.

use std::sync::Arc;

use super::envelope::{Envelope, Meta};
use super::source::StudentSource;
use crate::catalog::{room_name, Catalog, Course};
use crate::error::QueryError;
use crate::storage::StudentRecord;

/// A course/semester pair that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub course: Course,
    pub semester: u8,
}

impl ValidatedQuery {
    /// Room key for subscribers of this pair.
    #[must_use]
    pub fn room(&self) -> String {
        room_name(&self.course.code, self.semester)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Students resolved for one validated pair. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentListing {
    pub query: ValidatedQuery,
    pub students: Vec<StudentRecord>,
}

impl StudentListing {
    #[must_use]
    pub fn meta(&self) -> Meta {
        Meta {
            course: Some(self.query.course.code.clone()),
            course_name: Some(self.query.course.display_name.clone()),
            semester: Some(self.query.semester),
            ..Meta::now().with_count(self.students.len())
        }
    }

    #[must_use]
    pub fn into_envelope(self) -> Envelope<Vec<StudentRecord>> {
        let meta = self.meta();
        let message = format!("Successfully retrieved {} students", self.students.len());
        Envelope::success(message, self.students, meta)
    }
}

/// Validates queries against the catalog and reads from a backing source.
///
/// Stateless; clones share the catalog and source.
#[derive(Clone)]
pub struct StudentQueryResolver {
    catalog: Arc<Catalog>,
    source: Arc<dyn StudentSource>,
}

impl StudentQueryResolver {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, source: Arc<dyn StudentSource>) -> Self {
        Self { catalog, source }
    }

    /// Name of the backing source, for logs and health output.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Check a raw course/semester pair.
    ///
    /// Checks run in order and the first failure wins: presence, then
    /// course membership, then semester membership.
    ///
    /// # Errors
    ///
    /// `MissingParameters`, `InvalidCourse` or `InvalidSemester`.
    pub fn validate(
        &self,
        course: Option<&str>,
        semester: Option<&str>,
    ) -> Result<ValidatedQuery, QueryError> {
        let (Some(course), Some(semester)) = (present(course), present(semester)) else {
            return Err(QueryError::MissingParameters);
        };

        let course = self
            .catalog
            .course(course)
            .cloned()
            .ok_or_else(|| QueryError::InvalidCourse {
                input: course.to_string(),
                valid: self.catalog.course_codes(),
            })?;

        let semester = semester
            .parse::<u8>()
            .ok()
            .filter(|s| self.catalog.has_semester(*s))
            .ok_or_else(|| QueryError::InvalidSemester {
                input: semester.to_string(),
                valid: self.catalog.semesters().to_vec(),
            })?;

        Ok(ValidatedQuery { course, semester })
    }

    /// Validate the pair and fetch its students.
    ///
    /// # Errors
    ///
    /// Any validation error, `NoStudentsFound` for an empty bucket, or
    /// `BackingStore` if the source fails.
    pub fn resolve(
        &self,
        course: Option<&str>,
        semester: Option<&str>,
    ) -> Result<StudentListing, QueryError> {
        let query = self.validate(course, semester)?;
        let _span = crate::server::spans::query_span(&query.course.code, query.semester).entered();

        let students = self
            .source
            .students_for(&query.course.code, query.semester)?;

        if students.is_empty() {
            tracing::debug!(source = self.source.name(), "No students in bucket");
            return Err(QueryError::NoStudentsFound {
                course: query.course.code,
                semester: query.semester,
            });
        }

        tracing::debug!(
            source = self.source.name(),
            count = students.len(),
            "Resolved students"
        );
        Ok(StudentListing { query, students })
    }

    /// Find one student by id across all buckets.
    ///
    /// # Errors
    ///
    /// `MissingStudentId` for a blank id, `NotFound` when no record matches,
    /// `BackingStore` if the source fails.
    pub fn resolve_by_id(&self, id: &str) -> Result<StudentRecord, QueryError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(QueryError::MissingStudentId);
        }

        self.source
            .find_student(id)?
            .ok_or_else(|| QueryError::NotFound { id: id.to_string() })
    }

    /// Meta for a single record, named from the catalog.
    #[must_use]
    pub fn student_meta(&self, student: &StudentRecord) -> Meta {
        let course = &student.academic.course;
        Meta {
            course: Some(course.clone()),
            course_name: self
                .catalog
                .course(course)
                .map(|c| c.display_name.clone()),
            semester: Some(student.academic.semester),
            ..Meta::now().with_count(1)
        }
    }

    #[must_use]
    pub fn list_courses(&self) -> Vec<Course> {
        self.catalog.courses().to_vec()
    }

    #[must_use]
    pub fn list_semesters(&self) -> Vec<u8> {
        self.catalog.semesters().to_vec()
    }

    /// Run a resolver call on the blocking pool.
    ///
    /// Store-backed sources block on I/O; async transports call through here
    /// so the runtime's worker threads stay free.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, or `BackingStore` if the task panicked.
    pub async fn run<T, F>(&self, f: F) -> Result<T, QueryError>
    where
        F: FnOnce(&Self) -> Result<T, QueryError> + Send + 'static,
        T: Send + 'static,
    {
        let resolver = self.clone();
        tokio::task::spawn_blocking(move || f(&resolver))
            .await
            .map_err(|e| QueryError::BackingStore(format!("resolver task failed: {e}")))?
    }
}

impl std::fmt::Debug for StudentQueryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentQueryResolver")
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::fixtures::fixture_students;
    use crate::students::{ErrorCode, FixtureSource};

    struct BrokenSource;

    impl StudentSource for BrokenSource {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn students_for(&self, _course: &str, _semester: u8) -> crate::Result<Vec<StudentRecord>> {
            Err(crate::Error::internal("connection refused"))
        }

        fn find_student(&self, _id: &str) -> crate::Result<Option<StudentRecord>> {
            Err(crate::Error::internal("connection refused"))
        }
    }

    fn resolver() -> StudentQueryResolver {
        StudentQueryResolver::new(
            Arc::new(Catalog::standard()),
            Arc::new(FixtureSource::standard()),
        )
    }

    #[test]
    fn test_resolve_lowercase_course() {
        let listing = resolver().resolve(Some("cse"), Some("1")).unwrap();
        let meta = listing.meta();
        assert_eq!(meta.course.as_deref(), Some("CSE"));
        assert_eq!(meta.course_name.as_deref(), Some("Computer Science Engineering"));
        assert_eq!(meta.semester, Some(1));
        assert_eq!(meta.count, Some(3));
        assert!(!listing.students.is_empty());
        assert!(listing.students.iter().all(|s| s.is_in("CSE", 1)));
    }

    #[test]
    fn test_resolve_missing_parameters() {
        let r = resolver();
        assert_eq!(
            r.resolve(None, Some("1")).unwrap_err(),
            QueryError::MissingParameters
        );
        assert_eq!(
            r.resolve(Some("CSE"), None).unwrap_err(),
            QueryError::MissingParameters
        );
        assert_eq!(
            r.resolve(Some(""), Some("1")).unwrap_err(),
            QueryError::MissingParameters
        );
        assert_eq!(
            r.resolve(Some("CSE"), Some("   ")).unwrap_err(),
            QueryError::MissingParameters
        );
    }

    #[test]
    fn test_missing_wins_over_invalid() {
        let err = resolver().resolve(Some("XX"), None).unwrap_err();
        assert_eq!(err, QueryError::MissingParameters);
    }

    #[test]
    fn test_course_checked_before_semester() {
        let err = resolver().resolve(Some("XX"), Some("99")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCourse);
    }

    #[test]
    fn test_resolve_invalid_course_lists_codes() {
        let err = resolver().resolve(Some("XX"), Some("1")).unwrap_err();
        match err {
            QueryError::InvalidCourse { input, valid } => {
                assert_eq!(input, "XX");
                assert_eq!(valid, vec!["CSE", "ECE", "ME", "CE", "EE", "IT"]);
            }
            other => panic!("expected InvalidCourse, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_courses_rejected_case_insensitively() {
        let r = resolver();
        for course in ["xx", "Cs", "CSEE", "mech", "it "] {
            let result = r.resolve(Some(course), Some("1"));
            if course.trim().eq_ignore_ascii_case("it") {
                assert!(result.is_ok(), "{course} should be accepted");
            } else {
                assert_eq!(result.unwrap_err().code(), ErrorCode::InvalidCourse);
            }
        }
    }

    #[test]
    fn test_resolve_invalid_semester() {
        let r = resolver();
        for semester in ["99", "0", "9", "-1", "abc", "1.5", "256"] {
            let err = r.resolve(Some("CSE"), Some(semester)).unwrap_err();
            match err {
                QueryError::InvalidSemester { valid, .. } => {
                    assert_eq!(valid, vec![1, 2, 3, 4, 5, 6, 7, 8]);
                }
                other => panic!("{semester}: expected InvalidSemester, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve_no_students_found() {
        let err = resolver().resolve(Some("ME"), Some("5")).unwrap_err();
        assert_eq!(
            err,
            QueryError::NoStudentsFound {
                course: "ME".to_string(),
                semester: 5
            }
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let r = resolver();
        let first = r.resolve(Some("ece"), Some("1")).unwrap();
        let second = r.resolve(Some("ece"), Some("1")).unwrap();
        assert_eq!(first, second);

        let (a, b) = (first.meta(), second.meta());
        assert_eq!(
            (a.course, a.course_name, a.semester, a.count),
            (b.course, b.course_name, b.semester, b.count)
        );
    }

    #[test]
    fn test_listing_envelope() {
        let envelope = resolver()
            .resolve(Some("CSE"), Some("2"))
            .unwrap()
            .into_envelope();
        assert!(envelope.is_success());
        assert_eq!(envelope.message(), "Successfully retrieved 2 students");
        assert_eq!(envelope.data().unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_by_id() {
        let student = resolver().resolve_by_id("CE001").unwrap();
        assert_eq!(student.name, "Pooja Agarwal");
    }

    #[test]
    fn test_resolve_by_id_not_found() {
        let err = resolver().resolve_by_id("ZZ999").unwrap_err();
        assert_eq!(
            err,
            QueryError::NotFound {
                id: "ZZ999".to_string()
            }
        );
        assert_eq!(
            resolver().resolve_by_id("  ").unwrap_err(),
            QueryError::MissingStudentId
        );
    }

    #[test]
    fn test_student_meta_names_course() {
        let r = resolver();
        let student = r.resolve_by_id("ECE003").unwrap();
        let meta = r.student_meta(&student);
        assert_eq!(meta.course.as_deref(), Some("ECE"));
        assert_eq!(meta.course_name.as_deref(), Some("Electronics and Communication Engineering"));
        assert_eq!(meta.semester, Some(2));
        assert_eq!(meta.count, Some(1));
    }

    #[test]
    fn test_resolve_by_id_order_independent() {
        let forward = resolver();
        let mut records = fixture_students();
        records.reverse();
        let backward = StudentQueryResolver::new(
            Arc::new(Catalog::standard()),
            Arc::new(FixtureSource::from_records(records)),
        );

        for student in fixture_students() {
            assert_eq!(
                forward.resolve_by_id(&student.id).unwrap(),
                backward.resolve_by_id(&student.id).unwrap()
            );
        }
    }

    #[test]
    fn test_listings_are_invariant() {
        let r = resolver();
        assert_eq!(r.list_courses(), r.list_courses());
        assert_eq!(r.list_courses().len(), 6);
        assert_eq!(r.list_semesters(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(r.list_semesters(), r.list_semesters());
    }

    #[test]
    fn test_backing_store_failure() {
        let r = StudentQueryResolver::new(Arc::new(Catalog::standard()), Arc::new(BrokenSource));

        let err = r.resolve(Some("CSE"), Some("1")).unwrap_err();
        assert!(err.is_fault());
        assert!(err.to_string().contains("connection refused"));

        let err = r.resolve_by_id("CSE001").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BackingStoreError);
    }

    #[test]
    fn test_validation_does_not_touch_source() {
        let r = StudentQueryResolver::new(Arc::new(Catalog::standard()), Arc::new(BrokenSource));
        let err = r.resolve(Some("XX"), Some("1")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCourse);
    }

    #[test]
    fn test_room_name() {
        let query = resolver().validate(Some("ece"), Some("2")).unwrap();
        assert_eq!(query.room(), "ECE_2");
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let listing = resolver()
            .run(|r| r.resolve(Some("IT"), Some("1")))
            .await
            .unwrap();
        assert_eq!(listing.students.len(), 1);
    }
}

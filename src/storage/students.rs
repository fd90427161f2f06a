//! Student storage operations.

use rusqlite::{params, Connection, Row};

use super::connection::Database;
use super::models::{AcademicInfo, ContactInfo, GuardianInfo, StudentRecord};
use crate::error::StorageError;
use crate::students::StudentSource;
use crate::Result;

const SELECT_COLUMNS: &str = "SELECT id, name, roll_number, email, phone, date_of_birth, \
     address, course, semester, cgpa, attendance, guardian_name, guardian_phone FROM students";

fn row_to_student(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        roll_number: row.get(2)?,
        contact: ContactInfo {
            email: row.get(3)?,
            phone: row.get(4)?,
            date_of_birth: row.get(5)?,
            address: row.get(6)?,
        },
        academic: AcademicInfo {
            course: row.get(7)?,
            semester: row.get(8)?,
            cgpa: row.get(9)?,
            attendance: row.get(10)?,
        },
        guardian: GuardianInfo {
            name: row.get(11)?,
            phone: row.get(12)?,
        },
    })
}

/// Insert a student.
///
/// `admitted` controls visibility: only admitted students are returned by
/// the query functions below.
///
/// # Errors
///
/// Returns an error if the insert fails (e.g. duplicate id or roll number).
pub fn insert_student(conn: &Connection, student: &StudentRecord, admitted: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO students (id, name, roll_number, email, phone, date_of_birth, address,
             course, semester, cgpa, attendance, guardian_name, guardian_phone, admitted,
             created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            student.id,
            student.name,
            student.roll_number,
            student.contact.email,
            student.contact.phone,
            student.contact.date_of_birth,
            student.contact.address,
            student.academic.course,
            student.academic.semester,
            student.academic.cgpa,
            student.academic.attendance,
            student.guardian.name,
            student.guardian.phone,
            admitted,
            chrono::Utc::now().timestamp(),
        ],
    )
    .map_err(|e| StorageError::Database(format!("failed to insert student: {e}")))?;

    tracing::trace!(id = %student.id, "Inserted student");
    Ok(())
}

/// Get an admitted student by id.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no admitted student has this id, or a
/// database error if the query fails.
pub fn get_student(conn: &Connection, id: &str) -> Result<StudentRecord> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ? AND admitted = 1"),
        [id],
        row_to_student,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("student", id).into(),
        e => StorageError::Database(format!("failed to get student: {e}")).into(),
    })
}

/// List admitted students in one course and semester, ordered by roll number.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_students_by_course_semester(
    conn: &Connection,
    course: &str,
    semester: u8,
) -> Result<Vec<StudentRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE course = ? AND semester = ? AND admitted = 1
             ORDER BY roll_number"
        ))
        .map_err(|e| StorageError::Database(format!("failed to prepare query: {e}")))?;

    let students = stmt
        .query_map(params![course, semester], row_to_student)
        .map_err(|e| StorageError::Database(format!("failed to list students: {e}")))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(format!("failed to read student row: {e}")))?;

    Ok(students)
}

/// Count all stored students, admitted or not.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_students(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
        .map_err(|e| StorageError::Database(format!("failed to count students: {e}")).into())
}

/// Load `students` as admitted records if the table is empty.
///
/// Returns the number of inserted rows (zero when data already exists).
///
/// # Errors
///
/// Returns an error if counting or inserting fails; the insert is atomic.
pub fn seed_students(db: &Database, students: &[StudentRecord]) -> Result<usize> {
    db.with_transaction(|conn| {
        if count_students(conn)? > 0 {
            tracing::debug!("Student table already populated, skipping seed");
            return Ok(0);
        }
        for student in students {
            insert_student(conn, student, true)?;
        }
        tracing::info!(count = students.len(), "Seeded student table");
        Ok(students.len())
    })
}

/// [`StudentSource`] backed by the `SQLite` student table.
#[derive(Debug, Clone)]
pub struct SqliteStudentSource {
    db: Database,
}

impl SqliteStudentSource {
    /// Wrap an initialized database.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl StudentSource for SqliteStudentSource {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn students_for(&self, course: &str, semester: u8) -> Result<Vec<StudentRecord>> {
        let _span = crate::server::spans::db_span("select", "students").entered();
        self.db
            .with_conn(|conn| list_students_by_course_semester(conn, course, semester))
    }

    fn find_student(&self, id: &str) -> Result<Option<StudentRecord>> {
        let _span = crate::server::spans::db_span("select", "students").entered();
        match self.db.with_conn(|conn| get_student(conn, id)) {
            Ok(student) => Ok(Some(student)),
            Err(crate::Error::Storage(StorageError::NotFound { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrate;
    use crate::students::fixtures::fixture_students;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| migrate(conn)).unwrap();
        db
    }

    #[test]
    fn test_insert_and_get_student() {
        let db = setup_db();
        let student = fixture_students().remove(0);

        db.with_conn(|conn| insert_student(conn, &student, true))
            .unwrap();

        let loaded = db.with_conn(|conn| get_student(conn, &student.id)).unwrap();
        assert_eq!(loaded, student);
    }

    #[test]
    fn test_get_student_not_found() {
        let db = setup_db();
        let err = db.with_conn(|conn| get_student(conn, "CSE999")).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let db = setup_db();
        let student = fixture_students().remove(0);

        db.with_conn(|conn| insert_student(conn, &student, true))
            .unwrap();
        let result = db.with_conn(|conn| insert_student(conn, &student, true));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_filters_bucket_and_admission() {
        let db = setup_db();
        let mut students = fixture_students();
        let pending = {
            let mut s = students.remove(0);
            s.id = "CSE100".to_string();
            s.roll_number = "CSE2024100".to_string();
            s
        };
        seed_students(&db, &students).unwrap();
        db.with_conn(|conn| insert_student(conn, &pending, false))
            .unwrap();

        let listed = db
            .with_conn(|conn| list_students_by_course_semester(conn, "CSE", 1))
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["CSE002", "CSE003"]);

        let hidden = db.with_conn(|conn| get_student(conn, "CSE100"));
        assert!(hidden.is_err());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let db = setup_db();
        let students = fixture_students();

        assert_eq!(seed_students(&db, &students).unwrap(), students.len());
        assert_eq!(seed_students(&db, &students).unwrap(), 0);

        let count = db.with_conn(count_students).unwrap();
        assert_eq!(count, 12);
    }

    #[test]
    fn test_sqlite_source() {
        let db = setup_db();
        seed_students(&db, &fixture_students()).unwrap();
        let source = SqliteStudentSource::new(db);

        assert_eq!(source.name(), "sqlite");
        assert_eq!(source.students_for("CSE", 1).unwrap().len(), 3);
        assert!(source.students_for("ME", 5).unwrap().is_empty());
        assert_eq!(
            source.find_student("IT001").unwrap().unwrap().name,
            "Neha Soni"
        );
        assert!(source.find_student("IT999").unwrap().is_none());
    }
}

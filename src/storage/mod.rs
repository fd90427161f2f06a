//! `SQLite` persistence for student records.
//!
//! This module provides:
//! - the connection wrapper and versioned schema
//! - the student record model shared by every backing source
//! - the `SQLite` implementation of [`StudentSource`](crate::students::StudentSource)

mod connection;
mod models;
mod schema;
mod students;

pub use connection::Database;
pub use models::{AcademicInfo, ContactInfo, GuardianInfo, StudentRecord};
pub use schema::{migrate, verify_schema, SCHEMA_VERSION};
pub use students::{
    count_students, get_student, insert_student, list_students_by_course_semester,
    seed_students, SqliteStudentSource,
};

/// Initialize storage with migrations.
///
/// # Errors
///
/// Returns an error if database initialization fails.
pub fn init_storage(db: &Database) -> crate::Result<()> {
    db.with_conn(|conn| {
        migrate(conn)?;
        verify_schema(conn)?;

        tracing::info!("Storage initialized, schema version {SCHEMA_VERSION}");
        Ok(())
    })
}

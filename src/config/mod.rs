//! Configuration management for the student records service.
//!
//! Values come from command-line arguments, falling back to
//! `STUDENT_RECORDS_*` environment variables and then to defaults.

mod settings;

pub use settings::{Config, DataSource, Environment};

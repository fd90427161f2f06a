//! REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use super::metrics::{self, REQUEST_LATENCY};
use super::state::AppState;
use crate::error::QueryError;
use crate::storage::StudentRecord;
use crate::students::{Envelope, Meta};

/// Transport label for logs and metrics.
const TRANSPORT: &str = "rest";

/// Query string for the student listing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StudentsQuery {
    pub course: Option<String>,
    pub semester: Option<String>,
}

impl StudentsQuery {
    /// Collect `course` and `semester` from decoded query pairs.
    ///
    /// A repeated key keeps every value joined by commas, so the resolver
    /// rejects it as an invalid course or semester. Unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "course" => &mut query.course,
                "semester" => &mut query.semester,
                _ => continue,
            };
            *slot = Some(match slot.take() {
                Some(existing) => format!("{existing},{value}"),
                None => value,
            });
        }
        query
    }
}

/// Create REST API router.
pub fn create_rest_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api/v1/student", student_routes())
        .with_state(state)
}

fn student_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/students", get(get_students))
        .route("/students/{id}", get(get_student))
        .route("/courses", get(get_courses))
        .route("/semesters", get(get_semesters))
        .route("/health", get(module_health))
}

/// HTTP status for a query outcome.
#[must_use]
pub const fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::MissingParameters
        | QueryError::MissingStudentId
        | QueryError::InvalidCourse { .. }
        | QueryError::InvalidSemester { .. } => StatusCode::BAD_REQUEST,
        QueryError::NoStudentsFound { .. } | QueryError::NotFound { .. } => StatusCode::NOT_FOUND,
        QueryError::BackingStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure_response<T: serde::Serialize>(state: &AppState, err: &QueryError) -> Response {
    let envelope: Envelope<T> = state.failure(err, TRANSPORT);
    (status_for(err), Json(envelope)).into_response()
}

async fn get_students(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = StudentsQuery::from_pairs(pairs);
    let _timer = REQUEST_LATENCY.with_label_values(&["students"]).start_timer();

    let result = state
        .resolver
        .run(move |resolver| {
            resolver.resolve(params.course.as_deref(), params.semester.as_deref())
        })
        .await;

    match result {
        Ok(listing) => {
            metrics::record_success(TRANSPORT, listing.students.len());
            (StatusCode::OK, Json(listing.into_envelope())).into_response()
        }
        Err(err) => failure_response::<Vec<StudentRecord>>(&state, &err),
    }
}

async fn get_student(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let _timer = REQUEST_LATENCY.with_label_values(&["student"]).start_timer();

    match state.resolver.run(move |resolver| resolver.resolve_by_id(&id)).await {
        Ok(student) => {
            metrics::record_success(TRANSPORT, 1);
            let meta = state.resolver.student_meta(&student);
            let envelope = Envelope::success("Student retrieved successfully", student, meta);
            (StatusCode::OK, Json(envelope)).into_response()
        }
        Err(err) => failure_response::<StudentRecord>(&state, &err),
    }
}

async fn get_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let courses = state.resolver.list_courses();
    let meta = Meta::now().with_count(courses.len());
    Json(Envelope::success("Successfully retrieved courses", courses, meta))
}

async fn get_semesters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let semesters = state.resolver.list_semesters();
    let meta = Meta::now().with_count(semesters.len());
    Json(Envelope::success(
        "Successfully retrieved semesters",
        semesters,
        meta,
    ))
}

async fn module_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "message": "Student module is working properly",
        "module": "student",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}

async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "message": "Student records API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "students": "/api/v1/student/students?course={course}&semester={semester}",
            "student": "/api/v1/student/students/{id}",
            "courses": "/api/v1/student/courses",
            "semesters": "/api/v1/student/semesters",
            "socket": "/students",
        },
        "timestamp": chrono::Utc::now(),
    }))
}

/// Liveness endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!(source = state.resolver.source_name(), "Health check");

    Json(serde_json::json!({
        "success": true,
        "status": "healthy",
        "message": "Server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "dataSource": state.resolver.source_name(),
        "timestamp": chrono::Utc::now(),
    }))
}

/// Prometheus metrics endpoint.
async fn metrics_endpoint() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            tracing::trace!("Metrics encoded successfully");
            (
                StatusCode::OK,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                buffer,
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                b"Failed to encode metrics".to_vec(),
            )
        }
    }
}

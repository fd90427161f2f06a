//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

use crate::students::ErrorCode;

/// Query outcomes by transport (`rest`, `socket`) and outcome label.
pub static QUERY_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "student_records_queries_total",
        "Student queries by transport and outcome",
        &["transport", "outcome"]
    )
    .unwrap()
});

/// Student records returned to callers.
pub static STUDENTS_SERVED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "student_records_students_served_total",
        "Total student records returned"
    )
    .unwrap()
});

/// Request latency histogram.
pub static REQUEST_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "student_records_request_duration_seconds",
        "Request latency in seconds",
        &["endpoint"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap()
});

/// Open WebSocket connections.
pub static SOCKET_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "student_records_socket_connections",
        "Number of open WebSocket connections"
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    Lazy::force(&QUERY_OUTCOMES);
    Lazy::force(&STUDENTS_SERVED);
    Lazy::force(&REQUEST_LATENCY);
    Lazy::force(&SOCKET_CONNECTIONS);

    tracing::debug!("Prometheus metrics initialized");
}

/// Count a successful query that returned `records` students.
pub fn record_success(transport: &str, records: usize) {
    QUERY_OUTCOMES.with_label_values(&[transport, "success"]).inc();
    STUDENTS_SERVED.inc_by(records as u64);
}

/// Count a failed query.
pub fn record_failure(transport: &str, code: ErrorCode) {
    QUERY_OUTCOMES
        .with_label_values(&[transport, code.as_str()])
        .inc();
}

//! Structured logging and tracing configuration.
//!
//! Plain-text or JSON output through `tracing-subscriber`, filtered by
//! `RUST_LOG` when set and by the configured level otherwise.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Install the global tracing subscriber.
///
/// A second call in the same process logs a warning and keeps the first
/// subscriber.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(fmt_layer).try_init()
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "Tracing already initialized");
        return;
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

/// Span helpers shared by the transports and the store.
pub mod spans {
    use tracing::{info_span, Span};

    /// Span for one HTTP request.
    #[must_use]
    pub fn request_span(method: &str, uri: &str, request_id: &str) -> Span {
        info_span!(
            "http_request",
            method = %method,
            uri = %uri,
            request_id = %request_id,
        )
    }

    /// Span for one inbound socket event.
    #[must_use]
    pub fn event_span(event: &str, client_id: &str) -> Span {
        info_span!(
            "socket_event",
            event = %event,
            client_id = %client_id,
        )
    }

    /// Span for a validated student query.
    #[must_use]
    pub fn query_span(course: &str, semester: u8) -> Span {
        info_span!(
            "student_query",
            course = %course,
            semester = semester,
        )
    }

    /// Span for a database operation.
    #[must_use]
    pub fn db_span(operation: &str, table: &str) -> Span {
        info_span!(
            "db_operation",
            operation = %operation,
            table = %table,
        )
    }
}

//! REST and WebSocket transports.
//!
//! This module provides:
//! - REST API using axum
//! - The `/students` event channel over WebSocket
//! - Health, metrics and tracing setup

mod app;
pub mod events;
pub mod metrics;
mod observability;
mod rest;
mod state;
mod ws;

pub use app::{App, ServerConfig};
pub use events::{EventHub, InboundEvent, OutboundEvent, RejectedFrame};
pub use metrics::init_metrics;
pub use observability::{init_tracing, spans};
pub use rest::{create_rest_router, status_for, StudentsQuery};
pub use state::AppState;
pub use ws::create_ws_router;

//! State shared by the REST and event-channel handlers.

use crate::config::Environment;
use crate::error::QueryError;
use crate::students::{Envelope, StudentQueryResolver};

use super::events::EventHub;
use super::metrics;

/// Handler state. Wrapped in an `Arc` by the routers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: StudentQueryResolver,
    pub hub: EventHub,
    pub environment: Environment,
}

impl AppState {
    #[must_use]
    pub fn new(resolver: StudentQueryResolver, environment: Environment) -> Self {
        Self {
            resolver,
            hub: EventHub::new(),
            environment,
        }
    }

    /// Build the failure envelope for `err`, logging and counting it.
    ///
    /// Store faults are logged at error level; expected outcomes at debug.
    pub(crate) fn failure<T>(&self, err: &QueryError, transport: &str) -> Envelope<T> {
        if err.is_fault() {
            tracing::error!(transport, error = %err, "Student query failed");
        } else {
            tracing::debug!(transport, code = err.code().as_str(), "Student query rejected");
        }
        metrics::record_failure(transport, err.code());

        Envelope::failure(err, self.environment.is_development())
    }
}

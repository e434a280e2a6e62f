use std::fmt::Debug;
use tracing::error;

use crate::error::QueryError;

/// Shared sink for failures of the fetch pipeline.
///
/// Called after the status has flipped to `Error`, outside the controller's
/// lock, so an implementation may call `retry` from here.
pub trait ErrorHandler: Send + Sync + Debug {
    fn handle_error(&self, location: &str, err: &QueryError);
}

/// Logs every failure through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn handle_error(&self, location: &str, err: &QueryError) {
        error!(
            location = %location,
            retryable = err.is_retryable(),
            "weather query failed: {err}"
        );
    }
}

use parking_lot::Mutex;
use weather_core::{ErrorHandler, QueryError, TracingErrorHandler};

/// Failure of the most recent fetch, as reported by the controller.
#[derive(Debug, Clone)]
pub struct Failure {
    pub message: String,
    pub retryable: bool,
}

/// Logs like the stock handler and keeps the last failure so the CLI can
/// decide whether offering a retry makes sense.
#[derive(Debug, Default)]
pub struct LastFailure {
    last: Mutex<Option<Failure>>,
}

impl LastFailure {
    pub fn take(&self) -> Option<Failure> {
        self.last.lock().take()
    }
}

impl ErrorHandler for LastFailure {
    fn handle_error(&self, location: &str, err: &QueryError) {
        TracingErrorHandler.handle_error(location, err);
        *self.last.lock() = Some(Failure {
            message: err.to_string(),
            retryable: err.is_retryable(),
        });
    }
}

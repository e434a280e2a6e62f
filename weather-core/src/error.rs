use thiserror::Error;

/// Every way a weather query can fail.
///
/// All of these travel down the same asynchronous path: the controller hands
/// them to its [`ErrorHandler`](crate::ErrorHandler) and flips the status to
/// [`Status::Error`](crate::Status::Error). None of them reach the caller of
/// `query` or `retry`.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Failed to reach weather service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Weather service request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse weather service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Weather service returned {count} results for a single location query")]
    ContractViolation { count: usize },

    #[error("Weather service returned no results")]
    EmptyResult,

    #[error("Location store error: {0}")]
    Store(String),

    #[error("No tokio runtime available to run weather queries")]
    NoRuntime,
}

impl QueryError {
    /// Whether asking again has a chance of succeeding.
    ///
    /// Contract violations mean the upstream data is wrong for this query,
    /// so repeating it would yield the same answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueryError::Transport(_) | QueryError::Api { .. } | QueryError::Store(_) => true,
            QueryError::Decode(_)
            | QueryError::ContractViolation { .. }
            | QueryError::EmptyResult
            | QueryError::NoRuntime => false,
        }
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        QueryError::Store(err.to_string())
    }
}

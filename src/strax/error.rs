use thiserror::Error;

/// Errors that can occur when talking to a strax backend
#[derive(Debug, Error)]
pub enum StraxError {
    /// The backend could not be reached at all
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with data the dashboard cannot interpret
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The backend reported a failure while producing data
    #[error("backend error: {0}")]
    Backend(String),
}

/// Type alias for Results using StraxError
pub type Result<T> = std::result::Result<T, StraxError>;

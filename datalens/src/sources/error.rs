use thiserror::Error;

/// Errors that can occur when fetching a dataset from upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network error (connection failed, timeout, etc.).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status.
    #[error("HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The body was not JSON or lacked a `records` array.
    #[error("Malformed response: {message}")]
    Parse { message: String },

    /// The request was rejected before it was sent.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl FetchError {
    /// Short name of the failure kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::Parse { .. } => "parse",
            FetchError::InvalidRequest { .. } => "invalid_request",
        }
    }

    /// The HTTP status code, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        FetchError::Parse {
            message: message.into(),
        }
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

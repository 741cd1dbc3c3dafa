//! Error types for ac-cloud

use thiserror::Error;

/// Cloud API errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CloudError {
    /// Throttled by the service (A001)
    #[error("[A001] {service} throttled the request: {message}")]
    Throttled { service: String, message: String },

    /// Service-side failure (A002)
    #[error("[A002] {service} is unavailable: {message}")]
    Unavailable { service: String, message: String },

    /// Network, timeout or dispatch failure (A003)
    #[error("[A003] Transport error calling {service}: {message}")]
    Transport { service: String, message: String },

    /// Request rejected and not worth retrying (A004)
    #[error("[A004] {service} rejected the request ({code}): {message}")]
    Rejected {
        service: String,
        code: String,
        message: String,
    },

    /// Target does not exist (A005)
    #[error("[A005] Not found in {service}: {message}")]
    NotFound { service: String, message: String },

    /// Retry budget spent on a retryable failure (A006)
    #[error("[A006] {operation} failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<CloudError>,
    },

    /// Unexpected response shape or client bug (A007)
    #[error("[A007] Internal cloud client error: {0}")]
    Internal(String),
}

impl CloudError {
    /// Throttling and transient service/transport failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CloudError::Throttled { .. }
                | CloudError::Unavailable { .. }
                | CloudError::Transport { .. }
        )
    }

    /// True for throttling, including throttling that exhausted the retry budget.
    pub fn is_throttling(&self) -> bool {
        match self {
            CloudError::Throttled { .. } => true,
            CloudError::RetriesExhausted { last, .. } => last.is_throttling(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound { .. })
    }
}

/// Result type alias for CloudError
pub type CloudResult<T> = Result<T, CloudError>;

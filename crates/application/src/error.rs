//! Application error types

use hitest_domain::DomainError;
use thiserror::Error;

use crate::ports::HttpClientError;

/// Errors raised while issuing a request, as opposed to assertion failures.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The request could not be built.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The transport failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

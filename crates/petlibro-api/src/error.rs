//! Error types for the PETLIBRO cloud client

use thiserror::Error;

/// Errors returned by the cloud client
#[derive(Debug, Error)]
pub enum ApiError {
    /// The cloud could not be reached or the transfer failed
    #[error("cannot connect to the PETLIBRO cloud: {0}")]
    CannotConnect(#[from] reqwest::Error),

    /// Credentials were rejected or the session token has expired
    #[error("invalid authentication: {0}")]
    InvalidAuth(String),

    /// A call was made that requires a session before `login` succeeded
    #[error("not logged in")]
    NotLoggedIn,

    /// The cloud answered with a non-zero result code
    #[error("PETLIBRO API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The response body did not match the expected envelope
    #[error("malformed API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP layer answered with an unexpected status
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Whether the error means the stored session token is no longer valid
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::InvalidAuth(_) | ApiError::NotLoggedIn)
    }
}

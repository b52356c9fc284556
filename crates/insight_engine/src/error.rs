use std::time::Duration;

use thiserror::Error;

/// Failure of a single backend call.
///
/// `Server` is the backend saying `success: false`; every other variant is a
/// transport failure from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{message}")]
    Server { message: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("response too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("could not read upload: {0}")]
    Io(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Server { .. })
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_builder() {
        return ApiError::InvalidUrl(err.to_string());
    }
    ApiError::Network(err.to_string())
}

/// Why a poll stopped without completing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("gave up after {elapsed:?} without completion")]
    TimedOut { elapsed: Duration },
    #[error("poll cancelled")]
    Cancelled,
}

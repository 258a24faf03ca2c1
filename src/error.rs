use thiserror::Error;

pub type Result<T> = std::result::Result<T, TogglError>;

/// Failures reported by a [`TimeEntryService`](crate::service::TimeEntryService).
///
/// These are passed through the client untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("unauthorized: check the API token")]
    Unauthorized,

    #[error("payment required for this workspace feature")]
    PaymentRequired,

    #[error("rate limited by Toggl")]
    RateLimited,

    #[error("not found")]
    NotFound,

    #[error("Toggl API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("server error: {0}")]
    ServerError(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("cannot decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum TogglError {
    /// Rejected locally before any request was dispatched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl TogglError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TogglError::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TogglError::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_convert_transparently() {
        let err: TogglError = ServiceError::RateLimited.into();
        assert_eq!(err.to_string(), "rate limited by Toggl");
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn status_error_mentions_code() {
        let err = ServiceError::Status {
            status: 400,
            message: "bad start".to_string(),
        };
        assert_eq!(err.to_string(), "Toggl API error 400: bad start");
    }
}

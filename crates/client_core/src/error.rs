use shared::error::ApiError;
use thiserror::Error;

/// Failure of a single call to the report service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    RequestFailed(#[from] ApiError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ServiceError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("failed to get reports: {message}")]
    RemoteQuery { message: String },
    #[error("no report found with hash {report_hash}")]
    ReportNotFound { report_hash: String },
    #[error("malformed address: {reason}")]
    MalformedAddress { reason: String },
}

impl ViewerError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            reason: reason.into(),
        }
    }
}

impl From<ServiceError> for ViewerError {
    fn from(value: ServiceError) -> Self {
        let message = match value {
            ServiceError::RequestFailed(api) => api.message,
            other => other.to_string(),
        };
        Self::RemoteQuery { message }
    }
}

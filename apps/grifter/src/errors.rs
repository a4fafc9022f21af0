use thiserror::Error;

use crate::api_client::ApiError;

/// Client-level error type.
/// Every variant maps to exactly one user-facing message via `user_message`,
/// which the workflow controller surfaces next to a retry action.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No GitHub username found")]
    LinkDiscovery,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The single line shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(msg) => {
                tracing::warn!("Network error: {msg}");
                "Failed to connect to server".to_string()
            }
            AppError::Service(msg) => msg.clone(),
            AppError::Parse(msg) => {
                tracing::warn!("Parse error: {msg}");
                "Could not read the analysis result".to_string()
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::LinkDiscovery => "No GitHub username found".to_string(),
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                "Could not read the selected file".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An unexpected error occurred".to_string()
            }
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(e) => AppError::Network(e.to_string()),
            ApiError::Api { message, .. } | ApiError::Rejected { message } => {
                AppError::Service(message)
            }
            ApiError::Parse(e) => AppError::Parse(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

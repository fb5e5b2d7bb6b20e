use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// A required request field is missing or malformed
    #[error("{message}")]
    InvalidParams { message: String },

    /// No usable source for an image or mask asset
    #[error("Asset unavailable at {url}: {reason}")]
    AssetUnavailable { url: String, reason: String },

    /// Inline payload was not valid base64
    #[error("Invalid base64 data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The inference API answered with a non-2xx status
    #[error("API Error: {} {status_text}", .status.as_u16())]
    Upstream {
        status: StatusCode,
        status_text: String,
        body: String,
    },

    /// The inference API could not be reached at all
    #[error("Network error: {message}")]
    Network { message: String },

    /// Writing a generated artifact to disk failed
    #[error("Failed to write artifact to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Error::InvalidParams { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            Error::AssetUnavailable { .. } => StatusCode::BAD_REQUEST,
            Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Network { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Persist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidParams { message } => message.clone(),
            Error::AssetUnavailable { url, .. } => format!("Asset unavailable: {url}"),
            Error::Decode(_) => "Invalid base64 data".to_string(),
            Error::Upstream { status, status_text, .. } => {
                format!("API Error: {} {status_text}", status.as_u16())
            }
            Error::Network { .. } => "Failed to reach inference API".to_string(),
            Error::Persist { .. } => "Failed to save generated image".to_string(),
            Error::InvalidConfig { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }

    fn log(&self) {
        match self {
            Error::Persist { .. } | Error::InvalidConfig { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { body, .. } => {
                tracing::warn!(body = %body, "Inference API error: {}", self);
            }
            Error::Network { .. } => {
                tracing::warn!("Inference API unreachable: {}", self);
            }
            Error::InvalidParams { .. } | Error::AssetUnavailable { .. } | Error::Decode(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network { message: err.to_string() }
    }
}

/// `{success: false, error}` envelope used by the image and classification routes.
#[derive(Debug, Serialize)]
struct FailureEnvelope {
    success: bool,
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.log();
        let body = FailureEnvelope {
            success: false,
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Error wrapper for routes whose failure body is a bare `{error}` object.
#[derive(Debug)]
pub struct BareError(pub Error);

impl From<Error> for BareError {
    fn from(err: Error) -> Self {
        BareError(err)
    }
}

impl IntoResponse for BareError {
    fn into_response(self) -> Response {
        self.0.log();
        let body = serde_json::json!({ "error": self.0.user_message() });
        (self.0.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

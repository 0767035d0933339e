//! Error types for wa-api

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::handlers::StatusResponse;

/// Server-level errors (bind, serve, configuration)
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] wa_core::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

/// Why a send-message request was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Number and message are required")]
    MissingFields,

    #[error("{0}")]
    InvalidBody(String),

    #[error("Client not ready or not logged in")]
    NotReady,

    /// The client rejected the send; carries the text returned to the caller
    #[error("{0}")]
    Delivery(String),
}

impl SendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(StatusResponse::failed(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(SendError::MissingFields.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SendError::InvalidBody("bad json".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SendError::NotReady.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            SendError::Delivery("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            SendError::MissingFields.to_string(),
            "Number and message are required"
        );
        assert_eq!(
            SendError::NotReady.to_string(),
            "Client not ready or not logged in"
        );
        assert_eq!(SendError::Delivery("timeout".to_string()).to_string(), "timeout");
    }
}

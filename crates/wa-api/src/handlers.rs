//! HTTP API handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use wa_client::Address;

use crate::error::SendError;
use crate::server::AppState;

/// Text returned instead of the client error when redaction is enabled
pub const REDACTED_ERROR: &str = "Failed to send message";

// ============================================================================
// Request/Response types
// ============================================================================

/// Send-message request payload
///
/// Both fields are optional here so a missing key and an empty string are
/// rejected the same way.
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    /// Destination number, with or without the `@c.us` suffix
    #[serde(default)]
    pub number: Option<String>,
    /// Message text
    #[serde(default)]
    pub message: Option<String>,
}

impl SendMessageRequest {
    /// Both fields, if both are present and non-empty
    fn into_parts(self) -> Option<(String, String)> {
        let number = self.number.filter(|n| !n.is_empty())?;
        let message = self.message.filter(|m| !m.is_empty())?;
        Some((number, message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Body of every send-message response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub client_ready: bool,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint; reports whether the WhatsApp client is logged in
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        client_ready: state.slot.is_ready(),
    })
}

/// Send a WhatsApp message
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, SendError> {
    let req = match payload {
        Ok(Json(req)) => req,
        // Without a JSON content type there are no fields to read
        Err(JsonRejection::MissingJsonContentType(_)) => SendMessageRequest::default(),
        Err(rejection) => {
            debug!("Rejected send-message body: {}", rejection);
            return Err(SendError::InvalidBody(rejection.body_text()));
        }
    };

    let (number, message) = req.into_parts().ok_or(SendError::MissingFields)?;

    let client = state.slot.get().ok_or_else(|| {
        debug!("Send to {} rejected: client not ready", number);
        SendError::NotReady
    })?;

    let to = Address::normalize(&number);

    if let Err(e) = client.send_text(&to, &message).await {
        error!("Failed to send message to {}: {}", to, e);
        let detail = if state.redact_errors {
            REDACTED_ERROR.to_string()
        } else {
            e.to_string()
        };
        return Err(SendError::Delivery(detail));
    }

    info!("Message sent to {}", to);
    Ok(Json(StatusResponse::success(format!(
        "Message sent to {}",
        number
    ))))
}

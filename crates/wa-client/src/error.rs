//! Error types for wa-client

use thiserror::Error;

/// wa-client error type
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Login cancelled")]
    Cancelled,

    #[error("Client already initialized")]
    AlreadyInitialized,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

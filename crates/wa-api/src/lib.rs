//! wa-api: HTTP API for wa-bridge
//!
//! Exposes `POST /send-message`, which forwards a number and a text to the
//! WhatsApp client once it is logged in, and `GET /health`.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result, SendError};
pub use server::{AppState, app, start_server};

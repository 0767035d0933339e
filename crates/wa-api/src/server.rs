//! HTTP API Server
//!
//! Builds the axum app and serves it. The listener comes up immediately; the
//! WhatsApp client may still be logging in, which handlers observe through
//! the shared [`ClientSlot`].

use std::future::Future;

use axum::Router;
use http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wa_client::ClientSlot;
use wa_core::ApiConfig;

use crate::error::{ApiError, Result};
use crate::routes::routes;

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Readiness slot filled by the startup sequencer
    pub slot: ClientSlot,
    /// Hide client error text from 500 responses
    pub redact_errors: bool,
}

impl AppState {
    pub fn new(slot: ClientSlot, redact_errors: bool) -> Self {
        Self {
            slot,
            redact_errors,
        }
    }
}

/// Build the application router
pub fn app(state: AppState, allowed_origins: Option<&[String]>) -> Router {
    let router = Router::new()
        .merge(routes())
        .layer(TraceLayer::new_for_http());

    let router = match allowed_origins {
        Some(origins) => router.layer(cors_layer(origins)),
        None => router,
    };

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Start the HTTP API server and run until `shutdown` resolves
pub async fn start_server<F>(config: &ApiConfig, slot: ClientSlot, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(slot, config.redact_errors);
    let app = app(state, config.allowed_origins.as_deref());

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ApiError::Bind { addr, source })?;

    info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

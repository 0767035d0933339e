//! Write-once readiness slot for the messaging client

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::client::MessagingClient;
use crate::error::{ClientError, Result};

/// Holds the client once the session is up.
///
/// Starts empty, is filled at most once, and never empties again. Clones
/// share the same cell.
#[derive(Clone, Default)]
pub struct ClientSlot {
    inner: Arc<OnceCell<Arc<dyn MessagingClient>>>,
}

impl ClientSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that is already filled
    pub fn ready(client: Arc<dyn MessagingClient>) -> Self {
        Self {
            inner: Arc::new(OnceCell::new_with(Some(client))),
        }
    }

    /// Store the client. Fails if a client is already stored; the first one stays.
    pub fn set(&self, client: Arc<dyn MessagingClient>) -> Result<()> {
        self.inner
            .set(client)
            .map_err(|_| ClientError::AlreadyInitialized)
    }

    /// The client, if the session is up
    pub fn get(&self) -> Option<Arc<dyn MessagingClient>> {
        self.inner.get().cloned()
    }

    /// Whether the session is up
    pub fn is_ready(&self) -> bool {
        self.inner.initialized()
    }
}

impl fmt::Debug for ClientSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}

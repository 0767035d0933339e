//! Messaging capability traits
//!
//! The HTTP layer and the startup sequencer only see these traits, so tests
//! can substitute a fake for the browser-backed client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::address::Address;
use crate::cancel::CancelFlag;
use crate::error::Result;

/// An authenticated messaging session
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Send a text message and wait until it has been handed to WhatsApp
    async fn send_text(&self, to: &Address, body: &str) -> Result<()>;
}

/// Creates authenticated sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Bring up a session, including any interactive login step
    ///
    /// Long waits must return [`ClientError::Cancelled`](crate::ClientError::Cancelled)
    /// once `cancel` is set.
    async fn launch(
        &self,
        options: &SessionOptions,
        cancel: CancelFlag,
    ) -> Result<Arc<dyn MessagingClient>>;
}

/// Session launch options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Whether to run the browser without a window
    pub headless: bool,
    /// Browser executable; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Persistent profile directory
    pub user_data_dir: Option<PathBuf>,
    /// QR scan deadline; `None` waits forever
    pub qr_timeout: Option<Duration>,
    /// Deadline for the login page to settle
    pub auth_timeout: Duration,
    /// Deadline for a single send
    pub send_timeout: Duration,
    /// Re-render rotated QR codes
    pub auto_refresh: bool,
    /// Exit the process when the browser dies
    pub kill_process_on_browser_close: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&wa_core::BrowserConfig::default())
    }
}

impl From<&wa_core::BrowserConfig> for SessionOptions {
    fn from(config: &wa_core::BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.as_ref().map(PathBuf::from),
            user_data_dir: config.user_data_dir.as_ref().map(PathBuf::from),
            qr_timeout: (config.qr_timeout_secs > 0)
                .then(|| Duration::from_secs(config.qr_timeout_secs)),
            auth_timeout: Duration::from_secs(config.auth_timeout_secs),
            send_timeout: Duration::from_secs(config.send_timeout_secs),
            auto_refresh: config.auto_refresh,
            kill_process_on_browser_close: config.kill_process_on_browser_close,
        }
    }
}

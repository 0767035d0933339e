//! Startup sequencer
//!
//! Brings the WhatsApp session up once, publishes it through the
//! [`ClientSlot`], then runs the optional test-message hook. Nothing here is
//! retried: a failed launch leaves the slot empty until the process restarts.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::cancel::CancelFlag;
use crate::client::{SessionLauncher, SessionOptions};
use crate::error::ClientError;
use crate::slot::ClientSlot;

/// Message sent once right after login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupHook {
    /// Destination, normalized before sending
    pub recipient: String,
    /// Message text
    pub message: String,
}

impl StartupHook {
    pub fn new(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
        }
    }

    /// Build the hook from configuration; `None` when no recipient is set
    pub fn from_config(config: &wa_core::StartupConfig) -> Option<Self> {
        config
            .test_recipient
            .as_ref()
            .map(|recipient| Self::new(recipient.clone(), config.test_message.clone()))
    }
}

/// What happened to the post-login hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Skipped,
    Sent,
    Failed,
}

/// Result of one startup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// The client is in the slot
    Ready { hook: HookOutcome },
    /// The session never came up; the slot stays empty
    Failed,
    /// Shutdown was requested before login finished
    Cancelled,
}

/// Run the startup sequence to completion
pub async fn run(
    launcher: Arc<dyn SessionLauncher>,
    options: SessionOptions,
    slot: ClientSlot,
    hook: Option<StartupHook>,
    cancel: CancelFlag,
) -> StartupOutcome {
    info!("Initializing WhatsApp client...");

    let client = match launcher.launch(&options, cancel).await {
        Ok(client) => client,
        Err(ClientError::Cancelled) => {
            info!("WhatsApp client initialization cancelled");
            return StartupOutcome::Cancelled;
        }
        Err(e) => {
            error!("WhatsApp client initialization failed: {}", e);
            return StartupOutcome::Failed;
        }
    };

    if let Err(e) = slot.set(Arc::clone(&client)) {
        // Only one sequencer runs per process, so this means a wiring bug
        warn!("Discarding new WhatsApp client: {}", e);
        return StartupOutcome::Ready {
            hook: HookOutcome::Skipped,
        };
    }
    info!("WhatsApp client ready");

    let Some(hook) = hook else {
        return StartupOutcome::Ready {
            hook: HookOutcome::Skipped,
        };
    };

    let to = Address::normalize(&hook.recipient);
    let outcome = match client.send_text(&to, &hook.message).await {
        Ok(()) => {
            info!("Test message sent to {}", to);
            HookOutcome::Sent
        }
        Err(e) => {
            error!("Failed to send test message to {}: {}", to, e);
            HookOutcome::Failed
        }
    };

    StartupOutcome::Ready { hook: outcome }
}

/// Startup sequence running in the background
#[derive(Debug)]
pub struct StartupTask {
    handle: JoinHandle<StartupOutcome>,
    cancel: CancelFlag,
}

impl StartupTask {
    /// Stop a pending login, including its blocking browser work
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }

    /// Wait for the sequence; `None` if it was aborted or panicked
    pub async fn wait(self) -> Option<StartupOutcome> {
        match self.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                debug!("Startup task did not finish: {}", e);
                None
            }
        }
    }
}

/// Run the startup sequence on a background task
pub fn spawn(
    launcher: Arc<dyn SessionLauncher>,
    options: SessionOptions,
    slot: ClientSlot,
    hook: Option<StartupHook>,
) -> StartupTask {
    let cancel = CancelFlag::new();
    let handle = tokio::spawn(run(launcher, options, slot, hook, cancel.clone()));
    StartupTask { handle, cancel }
}

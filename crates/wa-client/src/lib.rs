//! wa-client: WhatsApp Web client for wa-bridge
//!
//! This crate owns everything behind the HTTP surface:
//!
//! - [`Address`] normalization to the `@c.us` form WhatsApp Web expects
//! - the [`MessagingClient`] / [`SessionLauncher`] capability traits
//! - [`ClientSlot`], the write-once readiness slot shared with the API
//! - the [`startup`] sequencer that brings the session up
//! - [`BrowserLauncher`], a headless Chrome implementation driving web.whatsapp.com

pub mod address;
pub mod browser;
pub mod cancel;
pub mod client;
pub mod error;
pub mod slot;
pub mod startup;

pub use address::{Address, CANONICAL_SUFFIX};
pub use browser::{BrowserClient, BrowserLauncher};
pub use cancel::CancelFlag;
pub use client::{MessagingClient, SessionLauncher, SessionOptions};
pub use error::{ClientError, Result};
pub use slot::ClientSlot;
pub use startup::{HookOutcome, StartupHook, StartupOutcome, StartupTask};

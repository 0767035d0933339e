//! wa-core: shared configuration and error types for wa-bridge
//!
//! Every other crate in the workspace reads its settings from [`Config`].

pub mod config;
pub mod error;

pub use config::{ApiConfig, BrowserConfig, Config, StartupConfig};
pub use error::{Error, Result};

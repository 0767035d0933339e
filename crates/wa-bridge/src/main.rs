//! wa-bridge: HTTP to WhatsApp bridge
//!
//! Starts a WhatsApp Web session in Chrome and serves an HTTP API that
//! forwards messages to it.
//!
//! Usage:
//!   wa-bridge                      - Start the bridge
//!   wa-bridge --config <path>      - Start with a specific config file
//!   wa-bridge --no-test-message    - Skip the post-login test message
//!   wa-bridge --help               - Show help

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wa_client::{BrowserLauncher, ClientSlot, SessionLauncher, SessionOptions, StartupHook, startup};
use wa_core::Config;

/// Options for server mode
#[derive(Debug, Default, PartialEq, Eq)]
struct ServerArgs {
    /// Explicit config file
    config_path: Option<PathBuf>,
    /// Disable the post-login test message
    no_test_message: bool,
}

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Run the bridge
    Server(ServerArgs),
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(RunMode::Server(args)) => args,
        Ok(RunMode::Help) => {
            print_help();
            return Ok(());
        }
        Ok(RunMode::Version) => {
            println!("wa-bridge {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Run `wa-bridge --help` for usage.");
            std::process::exit(2);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = match &args.config_path {
        Some(path) => Config::from_toml_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting wa-bridge...");

    run_server(config, args).await
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> Result<RunMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut server = ServerArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| format!("{} requires a path", arg))?;
                server.config_path = Some(PathBuf::from(path));
            }
            "--no-test-message" => server.no_test_message = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(RunMode::Server(server))
}

/// Print help message
fn print_help() {
    println!("wa-bridge - HTTP to WhatsApp bridge");
    println!();
    println!("Usage:");
    println!("  wa-bridge                     Start the bridge");
    println!("  wa-bridge --config <path>     Load settings from <path> instead of ./wa-bridge.toml");
    println!("  wa-bridge --no-test-message   Do not send the test message after login");
    println!("  wa-bridge --help              Show this help message");
    println!("  wa-bridge --version           Show version");
    println!();
    println!("Endpoints:");
    println!("  POST /send-message   {{\"number\": \"628...\", \"message\": \"...\"}}");
    println!("  GET  /health");
    println!();
    println!("Environment Variables:");
    println!("  API_HOST                  Bind address (default: 0.0.0.0)");
    println!("  API_PORT                  HTTP API port (default: 3000)");
    println!("  API_REDACT_ERRORS         Hide client error details in 500 responses");
    println!("  API_ALLOWED_ORIGINS       Comma-separated CORS origins");
    println!("  WA_HEADLESS               Run Chrome headless (default: true)");
    println!("  WA_CHROME_PATH            Chrome/Chromium executable");
    println!("  WA_USER_DATA_DIR          Chrome profile dir, keeps the login");
    println!("  WA_QR_TIMEOUT             Seconds to wait for QR scan (default: 0 = forever)");
    println!("  WA_AUTH_TIMEOUT           Seconds to wait for WhatsApp Web (default: 60)");
    println!("  WA_SEND_TIMEOUT           Seconds a send may wait for the chat (default: 30)");
    println!("  WA_AUTO_REFRESH           Re-render rotated QR codes (default: true)");
    println!("  WA_KILL_ON_BROWSER_CLOSE  Exit when Chrome closes (default: true)");
    println!("  WA_TEST_RECIPIENT         Number that receives the test message");
    println!("  WA_TEST_MESSAGE           Text of the test message");
}

/// Start the client in the background and serve the HTTP API
async fn run_server(config: Config, args: ServerArgs) -> anyhow::Result<()> {
    let slot = ClientSlot::new();

    let hook = if args.no_test_message {
        None
    } else {
        StartupHook::from_config(&config.startup)
    };
    match &hook {
        Some(hook) => tracing::info!("Test message will be sent to {} after login", hook.recipient),
        None => tracing::info!("Test message disabled"),
    }

    // The listener does not wait for login; requests before then get 503
    let launcher: Arc<dyn SessionLauncher> = Arc::new(BrowserLauncher::new());
    let startup_task = startup::spawn(
        launcher,
        SessionOptions::from(&config.browser),
        slot.clone(),
        hook,
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down...");
    };

    let result = wa_api::start_server(&config.api, slot, shutdown).await;

    // Login may still be waiting for a QR scan on a blocking thread
    startup_task.cancel();

    result.map_err(|e| anyhow::anyhow!("HTTP API error: {}", e))?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<RunMode, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args_defaults_to_server() {
        assert_eq!(parse(&[]), Ok(RunMode::Server(ServerArgs::default())));
    }

    #[test]
    fn test_parse_args_help_and_version() {
        assert_eq!(parse(&["--help"]), Ok(RunMode::Help));
        assert_eq!(parse(&["-h"]), Ok(RunMode::Help));
        assert_eq!(parse(&["--version"]), Ok(RunMode::Version));
        assert_eq!(parse(&["--no-test-message", "-v"]), Ok(RunMode::Version));
    }

    #[test]
    fn test_parse_args_server_options() {
        assert_eq!(
            parse(&["--config", "/etc/wa-bridge.toml", "--no-test-message"]),
            Ok(RunMode::Server(ServerArgs {
                config_path: Some(PathBuf::from("/etc/wa-bridge.toml")),
                no_test_message: true,
            }))
        );
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse(&["--config"]).is_err());
        assert_eq!(parse(&["--bogus"]), Err("Unknown argument: --bogus".to_string()));
    }
}

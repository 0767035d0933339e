//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. The `wa-bridge.toml` config file
//! 3. Default values
//!
//! `${VAR_NAME}` inside the config file is replaced by the value of the
//! environment variable before parsing.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{Error, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "wa-bridge.toml";

/// Main configuration for wa-bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// WhatsApp Web browser session configuration
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Post-login test message
    #[serde(default)]
    pub startup: StartupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Replace client error text in 500 responses with a generic message
    #[serde(default)]
    pub redact_errors: bool,

    /// Allowed CORS origins. If unset, no CORS layer is installed.
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            redact_errors: false,
            allowed_origins: None,
        }
    }
}

impl ApiConfig {
    /// Get the socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| Error::Config(format!("Invalid address {}: {}", addr, e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run Chrome without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chrome/Chromium executable. Auto-detected when unset.
    #[serde(default)]
    pub chrome_path: Option<String>,

    /// Profile directory; keeps the WhatsApp login across restarts
    #[serde(default)]
    pub user_data_dir: Option<String>,

    /// How long to wait for the QR code to be scanned (0 = forever)
    #[serde(default)]
    pub qr_timeout_secs: u64,

    /// How long to wait for WhatsApp Web to show either the QR code or the chat list
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,

    /// How long a single send may wait for the chat to open
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// Re-render the QR code whenever WhatsApp rotates it
    #[serde(default = "default_true")]
    pub auto_refresh: bool,

    /// Exit the process when the browser goes away
    #[serde(default = "default_true")]
    pub kill_process_on_browser_close: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            user_data_dir: None,
            qr_timeout_secs: 0,
            auth_timeout_secs: default_auth_timeout(),
            send_timeout_secs: default_send_timeout(),
            auto_refresh: true,
            kill_process_on_browser_close: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Recipient of the test message. No message is sent when unset.
    #[serde(default)]
    pub test_recipient: Option<String>,

    /// Text of the test message
    #[serde(default = "default_test_message")]
    pub test_message: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            test_recipient: None,
            test_message: default_test_message(),
        }
    }
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_auth_timeout() -> u64 {
    60
}

fn default_send_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_test_message() -> String {
    "Hello admin! This is a test message from wa-bridge.".to_string()
}

impl Config {
    /// Expand `${VAR_NAME}` references with environment variable values.
    ///
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file
    ///
    /// Environment variables still take precedence over file values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Parse configuration from TOML text without applying env overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from the default location
    ///
    /// Uses `./wa-bridge.toml` when present, otherwise defaults plus
    /// environment variables.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    fn apply_env_overrides(&mut self) {
        // API
        if let Ok(host) = std::env::var("API_HOST") {
            if !host.is_empty() {
                self.api.host = host;
            }
        }
        if let Ok(port) = std::env::var("API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid API_PORT: {}", port),
            }
        }
        if let Some(v) = env_flag("API_REDACT_ERRORS") {
            self.api.redact_errors = v;
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins = Some(split_list(&origins));
        }

        // Browser
        if let Some(v) = env_flag("WA_HEADLESS") {
            self.browser.headless = v;
        }
        if let Ok(path) = std::env::var("WA_CHROME_PATH") {
            self.browser.chrome_path = Some(path);
        }
        if let Ok(dir) = std::env::var("WA_USER_DATA_DIR") {
            self.browser.user_data_dir = Some(dir);
        }
        if let Some(secs) = env_secs("WA_QR_TIMEOUT") {
            self.browser.qr_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("WA_AUTH_TIMEOUT") {
            self.browser.auth_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("WA_SEND_TIMEOUT") {
            self.browser.send_timeout_secs = secs;
        }
        if let Some(v) = env_flag("WA_AUTO_REFRESH") {
            self.browser.auto_refresh = v;
        }
        if let Some(v) = env_flag("WA_KILL_ON_BROWSER_CLOSE") {
            self.browser.kill_process_on_browser_close = v;
        }

        // Startup test message
        if let Ok(recipient) = std::env::var("WA_TEST_RECIPIENT") {
            self.startup.test_recipient = (!recipient.is_empty()).then_some(recipient);
        }
        if let Ok(message) = std::env::var("WA_TEST_MESSAGE") {
            if !message.is_empty() {
                self.startup.test_message = message;
            }
        }
    }
}

/// `"false"` (any case) disables, anything else enables
fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v.to_lowercase() != "false")
}

fn env_secs(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}: {}", name, raw);
            None
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(!config.redact_errors);
        assert!(config.allowed_origins.is_none());
    }

    #[test]
    fn test_api_config_socket_addr() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);

        let bad = ApiConfig {
            host: "not an ip".to_string(),
            ..Default::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_browser_config_default() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.qr_timeout_secs, 0);
        assert_eq!(config.auth_timeout_secs, 60);
        assert_eq!(config.send_timeout_secs, 30);
        assert!(config.auto_refresh);
        assert!(config.kill_process_on_browser_close);
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_startup_config_default_has_no_recipient() {
        let config = StartupConfig::default();
        assert!(config.test_recipient.is_none());
        assert!(!config.test_message.is_empty());
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("WA_BRIDGE_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${WA_BRIDGE_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        let result = Config::expand_env_vars("prefix_${WA_BRIDGE_NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("WA_BRIDGE_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_passthrough() {
        assert_eq!(Config::expand_env_vars("no_vars_here"), "no_vars_here");
        assert_eq!(Config::expand_env_vars("${}_content"), "_content");
        assert_eq!(Config::expand_env_vars("cost: $5"), "cost: $5");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[api]
host = "127.0.0.1"
port = 8080
redact_errors = true
allowed_origins = ["http://localhost:5173"]

[browser]
headless = false
chrome_path = "/usr/bin/chromium"
user_data_dir = "/var/lib/wa-bridge/profile"
qr_timeout_secs = 120
auth_timeout_secs = 30
auto_refresh = false
kill_process_on_browser_close = false

[startup]
test_recipient = "6281234567890"
test_message = "ping"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.port, 8080);
        assert!(config.api.redact_errors);
        assert_eq!(
            config.api.allowed_origins,
            Some(vec!["http://localhost:5173".to_string()])
        );

        assert!(!config.browser.headless);
        assert_eq!(config.browser.chrome_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(
            config.browser.user_data_dir.as_deref(),
            Some("/var/lib/wa-bridge/profile")
        );
        assert_eq!(config.browser.qr_timeout_secs, 120);
        assert_eq!(config.browser.auth_timeout_secs, 30);
        assert!(!config.browser.auto_refresh);
        assert!(!config.browser.kill_process_on_browser_close);

        assert_eq!(config.startup.test_recipient.as_deref(), Some("6281234567890"));
        assert_eq!(config.startup.test_message, "ping");
    }

    #[test]
    fn test_toml_missing_sections_use_defaults() {
        let config = Config::from_toml_str("[api]\nport = 9000\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert!(config.browser.headless);
        assert!(config.startup.test_recipient.is_none());
    }

    #[test]
    fn test_toml_invalid_is_config_error() {
        let err = Config::from_toml_str("[api\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_toml_expands_env_vars() {
        unsafe {
            std::env::set_var("WA_BRIDGE_TEST_PROFILE", "/tmp/profile");
        }

        let config =
            Config::from_toml_str("[browser]\nuser_data_dir = \"${WA_BRIDGE_TEST_PROFILE}\"\n")
                .unwrap();
        assert_eq!(config.browser.user_data_dir.as_deref(), Some("/tmp/profile"));

        unsafe {
            std::env::remove_var("WA_BRIDGE_TEST_PROFILE");
        }
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[startup]\ntest_message = \"from file\"").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.startup.test_message, "from file");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file("/nonexistent/wa-bridge.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("/nonexistent/wa-bridge.toml"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("http://a, http://b ,,"),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
    }
}

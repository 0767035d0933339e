//! WhatsApp Web session over headless Chrome
//!
//! Launches Chrome, logs in to web.whatsapp.com (showing the pairing QR code
//! in the terminal when needed) and sends messages by opening the
//! `/send?phone=..&text=..` deep link and clicking the send button.
//!
//! headless_chrome is a blocking API, so every browser interaction runs on
//! `spawn_blocking`.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use qrcode::QrCode;
use qrcode::render::unicode;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::address::Address;
use crate::cancel::CancelFlag;
use crate::client::{MessagingClient, SessionLauncher, SessionOptions};
use crate::error::{ClientError, Result};

const WHATSAPP_WEB_URL: &str = "https://web.whatsapp.com";

const CHAT_PANE_SELECTOR: &str = "#pane-side";
const QR_SELECTOR: &str = "div[data-ref]";
const SEND_BUTTON_SELECTOR: &str = r#"span[data-icon="send"], button[aria-label="Send"]"#;
const INVALID_NUMBER_SELECTOR: &str = r#"div[data-animate-modal-popup="true"]"#;

// WhatsApp Web refuses to load for the HeadlessChrome user agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const WATCHDOG_INTERVAL: Duration = Duration::from_secs(5);
const SEND_SETTLE_DELAY: Duration = Duration::from_secs(2);
// Effectively disables headless_chrome's idle shutdown; the session lives as long as the process
const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Launches [`BrowserClient`] sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserLauncher;

impl BrowserLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionLauncher for BrowserLauncher {
    async fn launch(
        &self,
        options: &SessionOptions,
        cancel: CancelFlag,
    ) -> Result<Arc<dyn MessagingClient>> {
        let options = options.clone();
        let client = tokio::task::spawn_blocking(move || BrowserClient::start(options, &cancel))
            .await
            .map_err(|e| ClientError::Launch(format!("Launch task failed: {}", e)))??;

        let client = Arc::new(client);
        if client.options.kill_process_on_browser_close {
            client.spawn_watchdog();
        }

        Ok(client)
    }
}

/// Logged-in WhatsApp Web tab
pub struct BrowserClient {
    browser: Arc<Browser>,
    tab: Arc<Tab>,
    options: SessionOptions,
    // One tab, so one chat navigation at a time
    tab_lock: TabLock,
}

impl BrowserClient {
    /// Launch Chrome and block until WhatsApp Web is logged in
    fn start(options: SessionOptions, cancel: &CancelFlag) -> Result<Self> {
        info!("Launching browser (headless: {})", options.headless);

        let args: Vec<String> = vec![
            format!("--user-agent={}", USER_AGENT),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
        ];
        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptionsBuilder::default()
            .headless(options.headless)
            .path(options.chrome_path.clone())
            .user_data_dir(options.user_data_dir.clone())
            .window_size(Some((1280, 900)))
            .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
            .args(os_args)
            .build()
            .map_err(|e| ClientError::Launch(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| ClientError::Launch(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ClientError::Launch(format!("Failed to open tab: {}", e)))?;

        info!("Opening {}", WHATSAPP_WEB_URL);
        tab.navigate_to(WHATSAPP_WEB_URL)
            .map_err(|e| ClientError::Login(format!("Failed to open WhatsApp Web: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| ClientError::Login(format!("WhatsApp Web did not load: {}", e)))?;

        wait_for_login(&tab, &options, cancel)?;

        Ok(Self {
            browser: Arc::new(browser),
            tab,
            options,
            tab_lock: TabLock::default(),
        })
    }

    /// Exit the process once the browser stops answering
    fn spawn_watchdog(&self) {
        let browser = Arc::clone(&self.browser);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(WATCHDOG_INTERVAL);
            loop {
                ticker.tick().await;

                let browser = Arc::clone(&browser);
                let alive = tokio::task::spawn_blocking(move || browser.get_version().is_ok())
                    .await
                    .unwrap_or(false);

                if !alive {
                    error!("Browser closed, shutting down");
                    std::process::exit(1);
                }
            }
        });
    }
}

#[async_trait]
impl MessagingClient for BrowserClient {
    async fn send_text(&self, to: &Address, body: &str) -> Result<()> {
        let url = send_url(to, body)?;

        let tab = Arc::clone(&self.tab);
        let timeout = self.options.send_timeout;
        let to = to.clone();

        self.tab_lock
            .run(move || {
                info!("Sending WhatsApp message to {}", to);
                send_blocking(&tab, &url, &to, timeout)
            })
            .await
    }
}

/// Serializes blocking work on the shared tab
///
/// The guard moves into the blocking closure, so the tab stays locked until
/// the work returns even when the awaiting future is dropped.
#[derive(Debug, Clone, Default)]
struct TabLock(Arc<Mutex<()>>);

impl TabLock {
    async fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = Arc::clone(&self.0).lock_owned().await;

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            work()
        })
        .await
        .map_err(|e| ClientError::Send(format!("Send task failed: {}", e)))?
    }
}

/// Poll until the chat list shows up, rendering QR codes meanwhile
fn wait_for_login(tab: &Tab, options: &SessionOptions, cancel: &CancelFlag) -> Result<()> {
    let started = Instant::now();
    let mut qr_shown_at: Option<Instant> = None;
    let mut last_qr: Option<String> = None;

    loop {
        if cancel.is_cancelled() {
            info!("Login cancelled, closing browser");
            return Err(ClientError::Cancelled);
        }

        if tab.find_element(CHAT_PANE_SELECTOR).is_ok() {
            info!("Logged in to WhatsApp Web");
            return Ok(());
        }

        if let Some(code) = current_qr(tab) {
            if last_qr.as_deref() != Some(code.as_str()) {
                if last_qr.is_none() || options.auto_refresh {
                    show_qr(&code);
                }
                qr_shown_at.get_or_insert_with(Instant::now);
                last_qr = Some(code);
            }
        }

        match qr_shown_at {
            Some(shown) => {
                if let Some(limit) = options.qr_timeout {
                    if shown.elapsed() > limit {
                        return Err(ClientError::Timeout(format!(
                            "QR code was not scanned within {}s",
                            limit.as_secs()
                        )));
                    }
                }
            }
            None => {
                if started.elapsed() > options.auth_timeout {
                    return Err(ClientError::Timeout(format!(
                        "WhatsApp Web did not show a QR code or chat list within {}s",
                        options.auth_timeout.as_secs()
                    )));
                }
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

fn current_qr(tab: &Tab) -> Option<String> {
    let element = tab.find_element(QR_SELECTOR).ok()?;
    element.get_attribute_value("data-ref").ok().flatten()
}

fn show_qr(data: &str) {
    match render_qr(data) {
        Some(rendered) => info!("Scan this QR code with WhatsApp on your phone:\n{}", rendered),
        None => warn!("Could not render QR code, raw pairing data: {}", data),
    }
}

/// Render a QR code as terminal block characters
fn render_qr(data: &str) -> Option<String> {
    let code = QrCode::new(data.as_bytes()).ok()?;
    let rendered = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build();
    Some(rendered)
}

/// Deep link that opens a chat with the text prefilled
fn send_url(to: &Address, body: &str) -> Result<Url> {
    let phone = to.user().trim_start_matches('+');
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ClientError::InvalidAddress(format!(
            "{} is not a phone number address",
            to
        )));
    }

    Url::parse_with_params(
        &format!("{}/send", WHATSAPP_WEB_URL),
        &[("phone", phone), ("text", body)],
    )
    .map_err(|e| ClientError::InvalidAddress(format!("{}: {}", to, e)))
}

fn send_blocking(tab: &Tab, url: &Url, to: &Address, timeout: Duration) -> Result<()> {
    debug!("Opening chat {}", to);

    tab.navigate_to(url.as_str())
        .map_err(|e| ClientError::Send(format!("Failed to open chat {}: {}", to, e)))?;
    tab.wait_until_navigated()
        .map_err(|e| ClientError::Send(format!("Chat {} did not load: {}", to, e)))?;

    let started = Instant::now();
    loop {
        if let Ok(button) = tab.find_element(SEND_BUTTON_SELECTOR) {
            button
                .click()
                .map_err(|e| ClientError::Send(format!("Failed to click send: {}", e)))?;
            // Leaving the page too early drops the outgoing message
            std::thread::sleep(SEND_SETTLE_DELAY);
            debug!("Message delivered to WhatsApp Web for {}", to);
            return Ok(());
        }

        if tab.find_element(INVALID_NUMBER_SELECTOR).is_ok() {
            return Err(ClientError::InvalidAddress(format!(
                "{} is not registered on WhatsApp",
                to
            )));
        }

        if started.elapsed() > timeout {
            return Err(ClientError::Timeout(format!(
                "chat {} did not open within {}s",
                to,
                timeout.as_secs()
            )));
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

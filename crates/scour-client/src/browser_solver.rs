use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;

use scour_core::captcha::detect_captcha;
use scour_core::error::AppError;
use scour_core::traits::CaptchaSolver;

#[derive(Debug, Clone)]
pub struct InteractiveConfig {
    /// Wall-clock budget for a human to get past the challenge.
    pub timeout: Duration,
    /// How often the rendered page is re-checked.
    pub poll_interval: Duration,
    /// Explicit Chrome/Chromium binary; otherwise well-known paths are tried.
    pub chrome_binary: Option<PathBuf>,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            chrome_binary: None,
        }
    }
}

impl InteractiveConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_chrome_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_binary = Some(path.into());
        self
    }
}

/// Interactive CAPTCHA stage: opens a *visible* Chromium window on the URL
/// and waits for someone to solve the challenge by hand.
///
/// The page is polled until the challenge heuristic stops firing. Each solve
/// launches and tears down its own browser, and blocks the caller for up to
/// [`InteractiveConfig::timeout`]; run it on a dedicated worker when other
/// fetches must keep flowing.
#[derive(Debug, Clone, Default)]
pub struct InteractiveSolver {
    config: InteractiveConfig,
}

impl InteractiveSolver {
    pub fn new(config: InteractiveConfig) -> Self {
        Self { config }
    }

    async fn launch(&self) -> Result<(Browser, tokio::task::JoinHandle<()>), AppError> {
        let mut builder = BrowserConfig::builder().with_head();
        if let Some(bin) = self
            .config
            .chrome_binary
            .clone()
            .or_else(find_chrome_binary)
        {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::CaptchaError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::CaptchaError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let pump = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok((browser, pump))
    }

    async fn wait_until_clear(&self, page: &Page) -> Result<String, AppError> {
        loop {
            let html = page
                .content()
                .await
                .map_err(|e| AppError::CaptchaError(format!("Failed to read page content: {e}")))?;
            if !detect_captcha(&html) {
                return Ok(html);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

impl CaptchaSolver for InteractiveSolver {
    async fn solve(&self, url: &str) -> Result<String, AppError> {
        tracing::warn!(url = %url, "Opening browser for manual CAPTCHA solving");
        let (mut browser, pump) = self.launch().await?;

        let outcome = tokio::time::timeout(self.config.timeout, async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| AppError::CaptchaError(format!("Failed to navigate to {url}: {e}")))?;
            tracing::info!(
                timeout_secs = self.config.timeout.as_secs(),
                "Please solve the CAPTCHA in the browser window"
            );
            self.wait_until_clear(&page).await
        })
        .await;

        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "Browser close failed");
        }
        let _ = browser.wait().await;
        pump.abort();

        match outcome {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.config.timeout.as_secs())),
        }
    }
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// `CHROME_BIN` wins, then well-known install paths. `None` lets
/// `chromiumoxide` do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    let candidates: &[&str] = &[
        // Snap wrapper strips CLI flags; use the real binary inside it
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

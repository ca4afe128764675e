//! Chromium-based renderer using chromiumoxide.
//!
//! Runs with automation-evasion measures active (user-agent override,
//! `AutomationControlled` blink feature disabled, `navigator.webdriver`
//! scrubbed) so the provider sites serve the same markup they serve a
//! regular browser.

use super::{RenderContext, Renderer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// User agent matching a current desktop Chrome build; the headless UA
/// advertises itself and gets served bot-wall markup.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Injected into every new document before the page's own scripts run.
const WEBDRIVER_SCRUB: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// CDP request timeout. Generous so slow single-board hosts (Raspberry Pi
/// deployments) do not trip protocol-level timeouts mid-navigation.
const PROTOCOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. Explicit env override
    if let Ok(p) = std::env::var("APPRAISER_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ARM hosts: prefer the distro-packaged build. The bundled
    //    chrome-for-testing downloads are x86-only.
    if cfg!(target_os = "linux") && cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
        for candidate in [
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/lib/chromium-browser/chromium-browser",
        ] {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer. One instance per pipeline run.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn launch(executable: Option<&Path>) -> Result<Self> {
        let chrome_path = executable
            .map(Path::to_path_buf)
            .or_else(find_chromium)
            .context("Chromium not found. Install chromium or set APPRAISER_CHROMIUM_PATH.")?;

        // --no-sandbox is unconditional: only known provider domains are
        // fetched, and the sandbox breaks container/root/Pi deployments.
        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(PROTOCOL_TIMEOUT)
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={USER_AGENT}"))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events for the life of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        let scrub = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(WEBDRIVER_SCRUB)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build evasion script params: {e}"))?;
        page.evaluate_on_new_document(scrub)
            .await
            .context("failed to install evasion script")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.context("failed to close browser")?;
        let _ = browser.wait().await;
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation failed: {url}"))?;

        // Wait for the load event; a misfire here is tolerable, the
        // document may already be usable.
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS evaluation failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn save_snapshot(&self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .with_context(|| format!("failed to capture snapshot to {}", path.display()))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

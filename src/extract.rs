//! XPath value extraction against rendered pages.
//!
//! Extraction is a two-phase operation: a bounded wait for the locator to
//! match, then an independent evaluation. A wait timeout is diagnostic
//! only — the DOM may already contain the match even when the wait signal
//! misfires, so evaluation is attempted regardless. Only an evaluation
//! failure (or a genuine absence) yields "absent", and absence is always
//! recoverable at the call site.

use crate::renderer::Renderer;
use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How often the bounded wait re-probes for the locator.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Extraction tuning, sourced from `RunConfig`.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Bounded wait for the locator to appear.
    pub wait_timeout: Duration,
    /// Where diagnostic snapshots land on evaluation errors.
    pub snapshot_dir: PathBuf,
}

/// Extracts text content from pages rendered by a shared browser session.
pub struct Extractor<'a> {
    renderer: &'a dyn Renderer,
    opts: ExtractOptions,
}

impl<'a> Extractor<'a> {
    pub fn new(renderer: &'a dyn Renderer, opts: ExtractOptions) -> Self {
        Self { renderer, opts }
    }

    /// Navigate to `url` and return the text content of the first node
    /// matched by `xpath`, or `None` when nothing matches.
    ///
    /// Attribute-node XPaths (e.g. `//object/@data`) yield the attribute
    /// value; `document.evaluate` cannot be asked for a bare string result
    /// through the element-focused driver APIs, so the expression is
    /// evaluated in page JS directly.
    ///
    /// Returns `Err` only for page-open/navigation failures. Evaluation
    /// errors are captured as a full-page snapshot plus a log line, and
    /// reported as `Ok(None)`.
    pub async fn extract_text(&self, url: &str, xpath: &str) -> Result<Option<String>> {
        let mut page = self.renderer.new_context().await?;

        if let Err(e) = page.navigate(url).await {
            let _ = page.close().await;
            return Err(e);
        }

        // Phase one: bounded wait for the locator to match.
        let probe = probe_script(xpath);
        let deadline = Instant::now() + self.opts.wait_timeout;
        let mut found = false;
        loop {
            // Probe errors during load are transient; keep polling.
            if let Ok(value) = page.evaluate(&probe).await {
                if value.as_bool() == Some(true) {
                    found = true;
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        if !found {
            warn!(%url, xpath, "wait for xpath was not successful");
        }

        // Phase two: evaluate anyway — the wait signal misfires on some
        // pages even when the node is present.
        let text = match page.evaluate(&text_script(xpath)).await {
            Ok(value) => value.as_str().map(str::to_string),
            Err(e) => {
                error!(%url, xpath, error = %format!("{e:#}"), "error pulling xpath from page");
                let snapshot = self
                    .opts
                    .snapshot_dir
                    .join(format!("xpath-error-{}.png", Utc::now().timestamp_millis()));
                match page.save_snapshot(&snapshot).await {
                    Ok(()) => info!(path = %snapshot.display(), "saved diagnostic snapshot"),
                    Err(snap_err) => {
                        warn!("could not capture diagnostic snapshot: {snap_err:#}")
                    }
                }
                None
            }
        };

        let _ = page.close().await;
        Ok(text)
    }
}

/// JS expression: does `xpath` currently match anything?
fn probe_script(xpath: &str) -> String {
    format!(
        "!!document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
        js_string(xpath)
    )
}

/// JS expression: text content of the first match, or null.
fn text_script(xpath: &str) -> String {
    format!(
        "(() => {{ const node = document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; return node ? node.textContent : null; }})()",
        js_string(xpath)
    )
}

/// Quote a Rust string as a JS string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

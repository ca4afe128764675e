//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (Chromium via chromiumoxide). One renderer session
//! lives for the duration of a pipeline run; each extraction opens a
//! short-lived context and closes it immediately after use.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL and wait for the page to load.
    ///
    /// There is intentionally no navigation deadline: some provider pages
    /// are slow and script-heavy, and a partial load is worse than a slow
    /// one. The external scheduler bounds run frequency, not run duration.
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// Evaluate a JavaScript expression against the live document.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;
    /// Capture a full-page PNG snapshot to `path`.
    async fn save_snapshot(&self, path: &Path) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

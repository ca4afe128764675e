//! Pipeline orchestrator.
//!
//! One run: load the asset registry, open a single browser session,
//! resolve each asset strictly sequentially through its provider adapter,
//! push resolved values to the ledger, and tear the session down. Every
//! per-asset failure is contained here; only a missing credential or an
//! unreadable registry aborts a run.

use crate::adapters::{Provider, RunContext};
use crate::config::RunConfig;
use crate::extract::{ExtractOptions, Extractor};
use crate::ledger::LedgerClient;
use crate::registry::{self, AssetRegistry};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::Result;
use tracing::{error, info, warn};

/// Run the full pipeline with a freshly launched Chromium session.
///
/// The registry must parse before a browser process is spawned: an
/// unreadable registry is a fatal startup error with no side effects.
pub async fn run(config: &RunConfig) -> Result<()> {
    let assets = registry::load(&config.assets_path)?;
    info!(
        count = assets.len(),
        path = %config.assets_path.display(),
        "loaded asset registry"
    );

    let renderer = ChromiumRenderer::launch(config.chromium_path.as_deref()).await?;
    info!("browser session started");
    run_with(&renderer, config, &assets).await
}

/// Run the pipeline over a loaded registry against an existing renderer
/// session.
///
/// Assets are processed sequentially on purpose: the shared session and
/// the evasion posture make concurrent navigation unreliable and harder
/// to diagnose.
pub async fn run_with(
    renderer: &dyn Renderer,
    config: &RunConfig,
    assets: &AssetRegistry,
) -> Result<()> {
    let ledger = LedgerClient::with_base_url(&config.api_token, &config.ledger_base_url);
    let ctx = RunContext {
        extractor: Extractor::new(
            renderer,
            ExtractOptions {
                wait_timeout: config.wait_timeout,
                snapshot_dir: config.snapshot_dir.clone(),
            },
        ),
        default_zipcode: &config.default_zipcode,
    };

    for (asset_id, metadata) in assets {
        let asset_id = asset_id.as_str();
        info!(asset_id, url = %metadata.url, "processing asset");

        let Some(provider) = Provider::for_url(&metadata.url) else {
            warn!(asset_id, url = %metadata.url, "unsupported asset url");
            continue;
        };

        let value = match provider.resolve(&ctx, asset_id, metadata).await {
            Ok(Some(value)) => value,
            // The adapter already logged why the asset was skipped
            Ok(None) => continue,
            Err(e) => {
                error!(asset_id, "asset resolution failed: {e:#}");
                continue;
            }
        };

        info!(asset_id, value, "resolved value");

        if config.dry_run {
            info!(asset_id, "dry run, skipping ledger update");
            continue;
        }

        match ledger.update_asset_balance(asset_id, value).await {
            Ok(()) => info!(asset_id, value, "updated ledger asset"),
            // Rejections are logged, never retried; the loop continues
            Err(e) => error!(asset_id, "failed to update ledger: {e}"),
        }
    }

    renderer.shutdown().await?;
    info!("assets updated");
    Ok(())
}

//! Run configuration assembled from CLI flags and the environment.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Ledger API endpoint the balances are written to.
pub const DEFAULT_LEDGER_BASE_URL: &str = "https://dev.lunchmoney.app/v1";

/// How long to wait for a locator to appear before evaluating anyway.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Where diagnostic page snapshots are written on extraction errors.
pub const DEFAULT_SNAPSHOT_DIR: &str = "/tmp";

/// ZIP code used for the vehicle provider's price-advisor document when the
/// registry entry does not carry one.
pub const DEFAULT_ZIPCODE: &str = "80110";

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Ledger API token. Required; validated before anything else happens.
    pub api_token: String,
    /// Path to the asset registry JSON file.
    pub assets_path: PathBuf,
    /// Resolve values but skip the ledger writes.
    pub dry_run: bool,
    /// Bounded wait for a locator to appear in a rendered page.
    pub wait_timeout: Duration,
    /// Directory for diagnostic full-page snapshots.
    pub snapshot_dir: PathBuf,
    /// Explicit Chromium executable, overriding discovery.
    pub chromium_path: Option<PathBuf>,
    /// Fallback ZIP code for vehicle valuations.
    pub default_zipcode: String,
    /// Ledger API base URL (overridable for testing).
    pub ledger_base_url: String,
}

impl RunConfig {
    /// Build the run configuration.
    ///
    /// The ledger token is the only hard requirement; a missing token is a
    /// fatal startup error, reported before any browser or network activity.
    pub fn load(dry_run: bool, assets_path: Option<PathBuf>) -> Result<Self> {
        let api_token = match std::env::var("LUNCH_MONEY_API_KEY") {
            Ok(token) if !token.trim().is_empty() => token,
            _ => bail!(
                "LUNCH_MONEY_API_KEY is not set. \
                 Export it or add it to a .env file in the working directory."
            ),
        };

        // --assets-path wins over ASSET_PATH, which wins over ./assets.json
        let assets_path = assets_path
            .or_else(|| std::env::var_os("ASSET_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("assets.json"));

        let wait_timeout = match std::env::var("APPRAISER_WAIT_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse()
                    .with_context(|| format!("invalid APPRAISER_WAIT_TIMEOUT_MS: {raw}"))?,
            ),
            Err(_) => Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
        };

        let snapshot_dir = std::env::var_os("APPRAISER_SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR));

        let chromium_path = std::env::var_os("APPRAISER_CHROMIUM_PATH").map(PathBuf::from);

        let default_zipcode =
            std::env::var("KBB_ZIPCODE").unwrap_or_else(|_| DEFAULT_ZIPCODE.to_string());

        let ledger_base_url = std::env::var("LUNCH_MONEY_API_URL")
            .unwrap_or_else(|_| DEFAULT_LEDGER_BASE_URL.to_string());

        Ok(Self {
            api_token,
            assets_path,
            dry_run,
            wait_timeout,
            snapshot_dir,
            chromium_path,
            default_zipcode,
            ledger_base_url,
        })
    }
}

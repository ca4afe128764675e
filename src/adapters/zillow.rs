//! Home values from Zillow, optionally corroborated by Redfin.
//!
//! When the registry entry carries a Redfin listing the resolved value is
//! the rounded average of both estimates; a missing Redfin value falls
//! back to the Zillow estimate alone.

use super::RunContext;
use crate::currency::parse_currency;
use crate::registry::AssetMetadata;
use anyhow::Result;
use tracing::{info, warn};

// If this breaks, load up a browser, identify the price, and copy the
// new xpath.
const ZILLOW_VALUE_XPATH: &str =
    "//*[@id=\"home-details-home-values\"]/div/div[1]/div/div/div[1]/div/p/h3";

const REDFIN_VALUE_XPATH: &str =
    "//*[@data-rf-test-id=\"abp-price\"]/div[@class=\"statsValue\"]";

/// Resolve a home's value, or skip the asset for this run.
pub async fn resolve(
    ctx: &RunContext<'_>,
    asset_id: &str,
    metadata: &AssetMetadata,
) -> Result<Option<f64>> {
    let Some(zillow_text) = ctx
        .extractor
        .extract_text(&metadata.url, ZILLOW_VALUE_XPATH)
        .await?
    else {
        warn!(asset_id, url = %metadata.url, "could not find home value");
        return Ok(None);
    };
    info!(asset_id, value = %zillow_text, "extracted home value");

    let Some(zillow_value) = parse_currency(&zillow_text) else {
        warn!(asset_id, text = %zillow_text, "could not parse home value text");
        return Ok(None);
    };

    let Some(redfin_url) = &metadata.redfin else {
        return Ok(Some(zillow_value));
    };

    // Corroborating source is best-effort: any miss falls back to the
    // primary value alone.
    match ctx.extractor.extract_text(redfin_url, REDFIN_VALUE_XPATH).await? {
        Some(redfin_text) => match parse_currency(&redfin_text) {
            Some(redfin_value) => {
                let averaged = average(zillow_value, redfin_value);
                info!(
                    asset_id,
                    zillow = zillow_value,
                    redfin = redfin_value,
                    averaged,
                    "averaged corroborating estimates"
                );
                Ok(Some(averaged))
            }
            None => {
                warn!(asset_id, text = %redfin_text, "could not parse corroborating value text");
                Ok(Some(zillow_value))
            }
        },
        None => {
            warn!(asset_id, url = %redfin_url, "could not find corroborating value");
            Ok(Some(zillow_value))
        }
    }
}

/// Midpoint of the two estimates, rounded to a whole ledger unit.
fn average(primary: f64, secondary: f64) -> f64 {
    ((primary + secondary) / 2.0).round()
}

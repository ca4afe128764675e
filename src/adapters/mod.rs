//! Provider-specific valuation adapters.
//!
//! A closed set of providers keyed by URL domain. Each adapter is a
//! decision procedure over one registry entry: fetch, extract, normalize,
//! adjust, and either produce one resolved value or skip the asset.
//! Adding a provider means adding one variant here, not growing a
//! conditional chain in the pipeline.

pub mod kbb;
pub mod zillow;

use crate::extract::Extractor;
use crate::registry::AssetMetadata;
use anyhow::Result;
use url::Url;

/// Immutable per-run context threaded explicitly from the orchestrator
/// into every adapter call.
pub struct RunContext<'a> {
    pub extractor: Extractor<'a>,
    /// Fallback ZIP code for vehicle valuations.
    pub default_zipcode: &'a str,
}

/// Supported valuation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Kelley Blue Book vehicle valuations.
    Kbb,
    /// Zillow home values, optionally corroborated by Redfin.
    Zillow,
}

impl Provider {
    /// Select the adapter for an asset by its URL's domain.
    pub fn for_url(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        let host = url.host_str()?;
        if host == "kbb.com" || host.ends_with(".kbb.com") {
            Some(Self::Kbb)
        } else if host == "zillow.com" || host.ends_with(".zillow.com") {
            Some(Self::Zillow)
        } else {
            None
        }
    }

    /// Resolve one asset to a ledger-ready value.
    ///
    /// `Ok(None)` means the asset is skipped for this run (a recoverable,
    /// already-logged extraction miss); `Err` is an adapter-level failure
    /// the orchestrator contains and logs.
    pub async fn resolve(
        self,
        ctx: &RunContext<'_>,
        asset_id: &str,
        metadata: &AssetMetadata,
    ) -> Result<Option<f64>> {
        match self {
            Self::Kbb => kbb::resolve(ctx, asset_id, metadata).await,
            Self::Zillow => zillow::resolve(ctx, asset_id, metadata).await,
        }
    }
}

/// Replace (or append) one query parameter on a URL, leaving everything
/// else untouched. Returns the input unchanged when it does not parse.
pub(crate) fn replace_query_param(raw: &str, key: &str, value: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut replaced = false;
    {
        let mut editor = url.query_pairs_mut();
        editor.clear();
        for (k, v) in &pairs {
            if k == key {
                editor.append_pair(key, value);
                replaced = true;
            } else {
                editor.append_pair(k, v);
            }
        }
        if !replaced {
            editor.append_pair(key, value);
        }
    }

    url.to_string()
}

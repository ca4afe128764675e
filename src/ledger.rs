//! Ledger sync — writes resolved asset values to the personal-finance
//! ledger's API.
//!
//! One outbound call per asset: set the asset's balance to the resolved
//! value as a decimal string. A rejection is logged by the caller and
//! never retried; the remaining asset loop is unaffected.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ledger rejected update: {0}")]
    Rejected(String),
}

#[derive(Debug, Serialize)]
struct UpdateAssetRequest {
    balance: String,
}

/// Thin client for the ledger's asset-update endpoint.
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl LedgerClient {
    /// The production base URL is `config::DEFAULT_LEDGER_BASE_URL`; tests
    /// point this at a local mock server.
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Set `asset_id`'s balance to `balance`.
    ///
    /// The ledger reports some failures inside a 2xx response body as an
    /// `error` payload; those surface as `LedgerError::Rejected` too.
    pub async fn update_asset_balance(
        &self,
        asset_id: &str,
        balance: f64,
    ) -> Result<(), LedgerError> {
        let url = format!("{}/assets/{}", self.base_url, asset_id);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&UpdateAssetRequest {
                balance: balance.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response.json().await?;
        if let Some(error) = body.get("error") {
            if !error.is_null() {
                return Err(LedgerError::Rejected(render_error(error)));
            }
        }

        Ok(())
    }
}

/// The ledger's error payload is sometimes a string, sometimes a list.
fn render_error(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

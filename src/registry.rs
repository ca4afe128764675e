//! Asset registry — the JSON file mapping ledger asset ids to the pages
//! their values are extracted from.
//!
//! Loaded once per run and treated as immutable for the run's duration.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default assumed yearly mileage when the registry does not override it.
pub const DEFAULT_YEARLY_MILEAGE: f64 = 12000.0;

/// Per-asset extraction metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    /// Page the value is extracted from. Its domain selects the adapter.
    pub url: String,
    /// Optional corroborating listing; when present the resolved value is
    /// the rounded average of both sources.
    pub redfin: Option<String>,
    /// Odometer reading at `mileage_date`, used to project current mileage.
    pub mileage_start: Option<f64>,
    /// ISO date the odometer reading was taken.
    pub mileage_date: Option<NaiveDate>,
    /// Miles driven per year for the projection.
    #[serde(default = "default_yearly_mileage")]
    pub yearly_mileage: f64,
    /// Flat amount added to the extracted value (e.g. aftermarket parts).
    pub adjustment: Option<f64>,
    /// ZIP code for the vehicle provider's price-advisor document.
    pub zipcode: Option<String>,
}

fn default_yearly_mileage() -> f64 {
    DEFAULT_YEARLY_MILEAGE
}

/// Ledger asset id → metadata. A `BTreeMap` keeps the processing order
/// stable run-to-run.
pub type AssetRegistry = BTreeMap<String, AssetMetadata>;

/// Load the registry from a JSON file. Unreadable or malformed input is
/// fatal to the run; nothing has been fetched or written at that point.
pub fn load(path: &Path) -> Result<AssetRegistry> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read asset registry at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("asset registry at {} is not valid JSON", path.display()))
}

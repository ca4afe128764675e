//! Appraiser — tracks market values of vehicles and real estate by
//! extracting valuation figures from provider pages and syncing them to a
//! personal-finance ledger as asset balances.

pub mod adapters;
pub mod config;
pub mod currency;
pub mod extract;
pub mod ledger;
pub mod pipeline;
pub mod registry;
pub mod renderer;

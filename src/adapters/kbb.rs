//! Vehicle valuations from Kelley Blue Book.
//!
//! The price is not in the primary page's DOM: the page embeds a
//! price-advisor SVG as an `<object>` resource, and the figure lives in a
//! text node of that nested document. Resolution is therefore two
//! extractions — the object's `data` reference first, then the price text
//! inside the referenced document.

use super::{replace_query_param, RunContext};
use crate::currency::parse_currency;
use crate::registry::AssetMetadata;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

// NOTE cannot use `string(//object/@data)` — the driver can only return
// node results, so the attribute node's text content is taken instead.
// There's a priceAdvisorWrapper div, but the object is not always nested
// within it.
const OBJECT_DATA_XPATH: &str = "//object/@data";

/// Price text inside the nested price-advisor SVG document.
const ADVISOR_PRICE_XPATH: &str = "//*[@id='RangeBox']/*[name()='text'][4]";

/// Resolve a vehicle's value, or skip the asset for this run.
pub async fn resolve(
    ctx: &RunContext<'_>,
    asset_id: &str,
    metadata: &AssetMetadata,
) -> Result<Option<f64>> {
    let mut url = metadata.url.clone();

    // Project the odometer forward from the known baseline so the quote
    // reflects today's mileage rather than a stale reading.
    if let (Some(start), Some(date)) = (metadata.mileage_start, metadata.mileage_date) {
        let mileage = projected_mileage(start, date, metadata.yearly_mileage, Utc::now());
        info!(asset_id, mileage, "projected current mileage");
        url = set_mileage(&url, mileage)?;
        debug!(asset_id, %url, "rewrote mileage parameter");
    }

    let Some(advisor_url) = ctx.extractor.extract_text(&url, OBJECT_DATA_XPATH).await? else {
        warn!(asset_id, %url, "could not find price advisor reference");
        return Ok(None);
    };

    let advisor_url = match advisor_zipcode(metadata, ctx.default_zipcode) {
        Some(zip) => replace_query_param(&advisor_url, "zipcode", &zip),
        None => {
            warn!(asset_id, "invalid zipcode, leaving advisor URL untouched");
            advisor_url
        }
    };

    let Some(price_text) = ctx
        .extractor
        .extract_text(&advisor_url, ADVISOR_PRICE_XPATH)
        .await?
    else {
        warn!(asset_id, %advisor_url, "could not find price in advisor document");
        return Ok(None);
    };
    info!(asset_id, price = %price_text, "extracted vehicle price");

    let Some(mut price) = parse_currency(&price_text) else {
        warn!(asset_id, text = %price_text, "could not parse price text");
        return Ok(None);
    };

    if let Some(adjustment) = metadata.adjustment {
        info!(asset_id, adjustment, "applying adjustment");
        price += adjustment;
    }

    Ok(Some(price))
}

/// Project the odometer forward: baseline plus yearly mileage prorated
/// over the fractional years elapsed (365.25-day years, so leap years
/// don't drift the estimate).
pub fn projected_mileage(
    mileage_start: f64,
    mileage_date: NaiveDate,
    yearly_mileage: f64,
    now: DateTime<Utc>,
) -> i64 {
    let baseline = mileage_date.and_time(NaiveTime::MIN).and_utc();
    let days_passed = (now - baseline).num_seconds() as f64 / 86_400.0;
    let fractional_year = days_passed / 365.25;
    (mileage_start + fractional_year * yearly_mileage).round() as i64
}

/// Substitute the `mileage` query parameter value in a provider URL.
fn set_mileage(url: &str, mileage: i64) -> Result<String> {
    let re = Regex::new(r"mileage=\d+")?;
    Ok(re.replace(url, format!("mileage={mileage}")).into_owned())
}

/// ZIP for the advisor document: registry entry first, then the
/// configured default. Must be exactly five digits.
fn advisor_zipcode(metadata: &AssetMetadata, default_zipcode: &str) -> Option<String> {
    let zip = metadata
        .zipcode
        .as_deref()
        .unwrap_or(default_zipcode)
        .trim()
        .to_string();

    if zip.len() == 5 && zip.chars().all(|c| c.is_ascii_digit()) {
        Some(zip)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn meta(url: &str) -> AssetMetadata {
        serde_json::from_value(serde_json::json!({ "url": url })).unwrap()
    }

    #[test]
    fn test_projection_after_exactly_one_mean_year() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // 365.25 days after midnight of the baseline date
        let now = date.and_time(NaiveTime::MIN).and_utc()
            + TimeDelta::seconds((365.25 * 86_400.0) as i64);
        assert_eq!(projected_mileage(30000.0, date, 12000.0, now), 42000);
    }

    #[test]
    fn test_projection_after_four_years() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        // 4 * 365.25 = 1461 days, an integral number of days
        let now = date.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1461);
        assert_eq!(projected_mileage(30000.0, date, 12000.0, now), 78000);
    }

    #[test]
    fn test_projection_rounds_to_nearest_mile() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let now = date.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(100);
        // 30000 + 12000 * 100/365.25 = 33285.42...
        assert_eq!(projected_mileage(30000.0, date, 12000.0, now), 33285);
    }

    #[test]
    fn test_set_mileage_rewrites_the_parameter() {
        let url = "https://www.kbb.com/honda/odyssey/2016/?condition=good&mileage=31000&pricetype=private-party";
        let out = set_mileage(url, 42000).unwrap();
        assert!(out.contains("mileage=42000"));
        assert!(!out.contains("mileage=31000"));
        assert!(out.contains("condition=good"));
    }

    #[test]
    fn test_set_mileage_without_parameter_is_a_noop() {
        let url = "https://www.kbb.com/honda/odyssey/2016/";
        assert_eq!(set_mileage(url, 42000).unwrap(), url);
    }

    #[test]
    fn test_zipcode_prefers_registry_entry() {
        let mut m = meta("https://www.kbb.com/x/");
        m.zipcode = Some("60601".into());
        assert_eq!(advisor_zipcode(&m, "80110"), Some("60601".into()));
    }

    #[test]
    fn test_zipcode_falls_back_to_default() {
        let m = meta("https://www.kbb.com/x/");
        assert_eq!(advisor_zipcode(&m, "80110"), Some("80110".into()));
    }

    #[test]
    fn test_invalid_zipcode_is_rejected() {
        let mut m = meta("https://www.kbb.com/x/");
        m.zipcode = Some("1234".into());
        assert_eq!(advisor_zipcode(&m, "80110"), None);
        m.zipcode = Some("8011a".into());
        assert_eq!(advisor_zipcode(&m, "80110"), None);
    }
}

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::{now_millis, CommodityCategory, MarketData, PriceRange, Prices, Quality, Trend};
use crate::utils::TtlCache;

const DATA_GOV_IN_URL: &str = "https://api.data.gov.in/resource";
const COMMODITY_CACHE_KEY: &str = "commodity_data";
const COMMODITY_CACHE_TTL_SECS: u64 = 30 * 60;
const COMMODITY_TIMEOUT_SECS: u64 = 20;

const PAGE_SIZE: usize = 100;
const PAGES_PER_BATCH: usize = 5;
const MAX_RETRIES: u32 = 3;
const PAGE_DELAY: Duration = Duration::from_secs(1);
const BATCH_DELAY: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_secs(3);

const RETAIL_MARKUP: f64 = 1.3;
pub const SOURCE: &str = "AGMARKNET via Data.gov.in";

lazy_static! {
    static ref COMMODITY_CACHE: TtlCache<Vec<MarketData>> = TtlCache::new(COMMODITY_CACHE_TTL_SECS);
}

const VEGETABLES: &[&str] = &[
    "onion", "tomato", "potato", "cabbage", "cauliflower", "brinjal", "eggplant", "carrot", "beans", "peas",
    "capsicum", "pepper", "cucumber", "radish", "beetroot", "spinach", "methi", "coriander", "mint",
    "lady finger", "okra", "bitter gourd", "bottle gourd", "ridge gourd", "pumpkin", "drumstick",
];
const FRUITS: &[&str] = &[
    "apple", "banana", "mango", "orange", "grapes", "papaya", "watermelon", "muskmelon", "pomegranate",
    "guava", "pineapple", "coconut", "lemon", "lime", "sweet lime", "sapota", "custard apple", "jackfruit",
    "litchi", "strawberry",
];
const GRAINS: &[&str] = &["rice", "wheat", "maize", "bajra", "jowar", "ragi", "barley", "paddy", "corn"];
const PULSES: &[&str] = &[
    "tur", "moong", "urad", "masoor", "chana", "arhar", "gram", "lentil", "peas", "rajma", "kidney bean",
    "soybean", "groundnut", "peanut",
];
const SPICES: &[&str] = &[
    "turmeric", "chili", "chilli", "coriander", "cumin", "pepper", "cardamom", "clove", "cinnamon", "ginger",
    "garlic", "dry chilli", "red chilli",
];
const OILSEEDS: &[&str] = &[
    "mustard", "sesame", "sunflower", "safflower", "castor", "linseed", "niger", "groundnut", "soybean", "coconut",
];

/// One row of the AGMARKNET daily price dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MandiRecord {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub commodity: String,
    #[serde(default)]
    pub arrival_date: Option<String>,
    #[serde(default)]
    pub min_price: Option<serde_json::Value>,
    #[serde(default)]
    pub max_price: Option<serde_json::Value>,
    #[serde(default)]
    pub modal_price: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DataGovResponse {
    #[serde(default)]
    records: Vec<MandiRecord>,
}

fn price(value: &Option<serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn categorize(commodity: &str) -> CommodityCategory {
    let name = commodity.to_lowercase();
    let lists = [
        (VEGETABLES, CommodityCategory::Vegetables),
        (FRUITS, CommodityCategory::Fruits),
        (GRAINS, CommodityCategory::Grains),
        (PULSES, CommodityCategory::Pulses),
        (SPICES, CommodityCategory::Spices),
        (OILSEEDS, CommodityCategory::Oilseeds),
    ];

    lists
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(CommodityCategory::Other)
}

/// Modal price against the min/max midpoint with a 10% band.
pub fn calculate_trend(min: f64, max: f64, modal: f64) -> Trend {
    let mid = (min + max) / 2.0;
    if modal > mid * 1.1 {
        Trend::Rising
    } else if modal < mid * 0.9 {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

/// `DD/MM/YYYY` arrival date as epoch millis. Anything unparseable or before 2000 is treated as now.
pub fn parse_arrival_date(raw: Option<&str>) -> i64 {
    raw.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%d/%m/%Y").ok())
        .filter(|d| d.year() >= 2000)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_else(now_millis)
}

pub fn parse_record(record: &MandiRecord) -> MarketData {
    let (min, max, modal) = (price(&record.min_price), price(&record.max_price), price(&record.modal_price));
    let now = now_millis();

    MarketData {
        id: None,
        commodity: record.commodity.clone(),
        category: categorize(&record.commodity),
        state: record.state.clone(),
        district: record.district.clone(),
        market: record.market.clone(),
        prices: Prices {
            wholesale: PriceRange { min, max, average: modal },
            retail: PriceRange {
                min: min * RETAIL_MARKUP,
                max: max * RETAIL_MARKUP,
                average: modal * RETAIL_MARKUP,
            },
        },
        unit: "per quintal".to_string(),
        quality: Quality::Good,
        trend: calculate_trend(min, max, modal),
        change_percent: None,
        last_updated: parse_arrival_date(record.arrival_date.as_deref()),
        source: SOURCE.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(COMMODITY_TIMEOUT_SECS))
        .user_agent("Mozilla/5.0")
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

enum PageError {
    Connection(String),
    Other(String),
}

async fn fetch_page(client: &reqwest::Client, api_key: &str, dataset_id: &str, limit: usize, offset: usize) -> Result<Vec<MandiRecord>, PageError> {
    let url = format!(
        "{}/{}?api-key={}&format=json&limit={}&offset={}",
        DATA_GOV_IN_URL,
        urlencoding::encode(dataset_id),
        urlencoding::encode(api_key),
        limit,
        offset
    );

    let response = client
        .get(&url)
        .header("Connection", "close")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                PageError::Connection(e.to_string())
            } else {
                PageError::Other(e.to_string())
            }
        })?;

    if !response.status().is_success() {
        return Err(PageError::Other(format!("Data.gov.in API error: {}", response.status())));
    }

    let body: DataGovResponse = response
        .json()
        .await
        .map_err(|e| PageError::Other(format!("Failed to parse Data.gov.in response: {}", e)))?;
    Ok(body.records)
}

/// Fetches `PAGES_PER_BATCH` pages starting at `start_page`.
/// The flag is false once a short page, an empty page or a hard failure ends the dataset.
async fn fetch_batch(client: &reqwest::Client, api_key: &str, dataset_id: &str, start_page: usize) -> (Vec<MandiRecord>, bool) {
    let mut records = Vec::new();

    for page in start_page..start_page + PAGES_PER_BATCH {
        let mut attempts = 0;
        let page_records = loop {
            attempts += 1;
            match fetch_page(client, api_key, dataset_id, PAGE_SIZE, page * PAGE_SIZE).await {
                Ok(rows) => break Some(rows),
                Err(PageError::Connection(e)) if attempts < MAX_RETRIES => {
                    log::warn!("⚠️ Connection issue on page {}, retrying ({} left): {}", page + 1, MAX_RETRIES - attempts, e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(PageError::Connection(e)) | Err(PageError::Other(e)) => {
                    log::error!("❌ Failed page {}: {}", page + 1, e);
                    break None;
                }
            }
        };

        let Some(rows) = page_records else {
            return (records, false);
        };

        let count = rows.len();
        log::debug!("🌾 Page {}: {} records", page + 1, count);
        records.extend(rows);
        if count < PAGE_SIZE {
            return (records, false);
        }

        tokio::time::sleep(PAGE_DELAY).await;
    }

    (records, true)
}

async fn fetch_from_data_gov_in(config: &AppConfig) -> Option<Vec<MarketData>> {
    let Some(api_key) = config.data_gov_in_api_key.as_deref() else {
        log::debug!("🌾 DATA_GOV_IN_API_KEY not set, cannot fetch commodity prices");
        return None;
    };

    let client = client();
    let mut all = Vec::new();
    let mut batch = 0;

    loop {
        let (records, more) = fetch_batch(&client, api_key, &config.data_gov_in_dataset_id, batch * PAGES_PER_BATCH).await;
        batch += 1;

        if records.is_empty() {
            break;
        }
        log::info!("🌾 Batch {} complete: {} records (total: {})", batch, records.len(), all.len() + records.len());
        all.extend(records);

        if !more {
            break;
        }
        tokio::time::sleep(BATCH_DELAY).await;
    }

    if all.is_empty() {
        log::warn!("⚠️ Data.gov.in returned no records");
        return None;
    }

    log::info!("✅ Fetched {} commodity records from Data.gov.in", all.len());
    Some(all.iter().map(parse_record).collect())
}

/// Full commodity price table, cached for 30 minutes. `None` when the dataset is unreachable.
pub async fn get_commodity_data(config: &AppConfig) -> Option<Vec<MarketData>> {
    if let Some(cached) = COMMODITY_CACHE.get(COMMODITY_CACHE_KEY) {
        return Some(cached);
    }

    match fetch_from_data_gov_in(config).await {
        Some(data) if !data.is_empty() => {
            COMMODITY_CACHE.set(COMMODITY_CACHE_KEY, data.clone());
            Some(data)
        }
        _ => {
            log::error!("❌ Failed to fetch commodity data from Data.gov.in");
            None
        }
    }
}

/// One uncached page of the dataset for lazy loading.
pub async fn get_paginated_data(config: &AppConfig, limit: usize, offset: usize) -> Option<Vec<MarketData>> {
    let api_key = config.data_gov_in_api_key.as_deref()?;

    match fetch_page(&client(), api_key, &config.data_gov_in_dataset_id, limit, offset).await {
        Ok(records) => Some(records.iter().map(parse_record).collect()),
        Err(PageError::Connection(e)) | Err(PageError::Other(e)) => {
            log::error!("❌ Error fetching paginated commodity data: {}", e);
            Some(Vec::new())
        }
    }
}

pub fn clear_cache() {
    COMMODITY_CACHE.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_categorize_order() {
        assert_eq!(categorize("Onion"), CommodityCategory::Vegetables);
        assert_eq!(categorize("Banana - Green"), CommodityCategory::Fruits);
        assert_eq!(categorize("Paddy(Dhan)(Common)"), CommodityCategory::Grains);
        assert_eq!(categorize("Bengal Gram(Gram)(Whole)"), CommodityCategory::Pulses);
        // "coriander" is a vegetable before it is a spice
        assert_eq!(categorize("Coriander(Leaves)"), CommodityCategory::Vegetables);
        assert_eq!(categorize("Mustard"), CommodityCategory::Oilseeds);
        assert_eq!(categorize("Cotton"), CommodityCategory::Other);
    }

    #[test]
    fn test_trend_band() {
        assert_eq!(calculate_trend(1000.0, 2000.0, 1700.0), Trend::Rising);
        assert_eq!(calculate_trend(1000.0, 2000.0, 1300.0), Trend::Falling);
        assert_eq!(calculate_trend(1000.0, 2000.0, 1500.0), Trend::Stable);
        assert_eq!(calculate_trend(1000.0, 2000.0, 1650.0), Trend::Stable);
    }

    #[test]
    fn test_arrival_date() {
        assert_eq!(parse_arrival_date(Some("14/02/2025")), 1739491200000);

        let before = now_millis();
        assert!(parse_arrival_date(Some("01/01/1999")) >= before);
        assert!(parse_arrival_date(Some("2025-02-14")) >= before);
        assert!(parse_arrival_date(None) >= before);
    }

    #[test]
    fn test_parse_record() {
        let record: MandiRecord = serde_json::from_value(json!({
            "state": "Maharashtra",
            "district": "Nashik",
            "market": "Lasalgaon",
            "commodity": "Onion",
            "arrival_date": "14/02/2025",
            "min_price": "1000",
            "max_price": "2000",
            "modal_price": 1800
        }))
        .unwrap();

        let data = parse_record(&record);
        assert_eq!(data.category, CommodityCategory::Vegetables);
        assert_eq!(data.prices.wholesale.average, 1800.0);
        assert!((data.prices.retail.max - 2600.0).abs() < 1e-9);
        assert_eq!(data.trend, Trend::Rising);
        assert_eq!(data.unit, "per quintal");
        assert_eq!(data.source, SOURCE);
        assert_eq!(data.market.as_deref(), Some("Lasalgaon"));
    }
}

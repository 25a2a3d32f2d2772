use futures::future::join_all;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::now_millis;
use crate::utils::TtlCache;

const NSE_QUOTE_URL: &str = "https://www.nseindia.com/api/quote-equity";
const TWELVE_DATA_QUOTE_URL: &str = "https://api.twelvedata.com/quote";
const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const STOCK_CACHE_TTL_SECS: u64 = 5 * 60;
const STOCK_TIMEOUT_SECS: u64 = 10;

lazy_static! {
    static ref STOCK_CACHE: TtlCache<StockQuote> = TtlCache::new(STOCK_CACHE_TTL_SECS);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: i64,
    pub last_updated: i64,
    pub source: String,
}

/// Upstream APIs mix JSON numbers and numeric strings.
fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(STOCK_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn fetch_json(request: reqwest::RequestBuilder, source: &str) -> Result<Value, String> {
    let response = request
        .send()
        .await
        .map_err(|e| format!("{} request failed: {}", source, e))?;

    if !response.status().is_success() {
        return Err(format!("{} API error: {}", source, response.status()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse {} response: {}", source, e))
}

pub fn parse_nse_quote(symbol: &str, data: &Value) -> Option<StockQuote> {
    let price_info = data.get("priceInfo")?;
    let high_low = &price_info["intraDayHighLow"];

    Some(StockQuote {
        symbol: symbol.to_string(),
        current_price: number(&price_info["lastPrice"]),
        previous_close: number(&price_info["previousClose"]),
        change: number(&price_info["change"]),
        change_percent: number(&price_info["pChange"]),
        day_high: number(&high_low["max"]),
        day_low: number(&high_low["min"]),
        volume: number(&data["preOpenMarket"]["totalTradedVolume"]) as i64,
        last_updated: now_millis(),
        source: "NSE India".to_string(),
    })
}

pub fn parse_twelve_data_quote(symbol: &str, data: &Value) -> Option<StockQuote> {
    if data.get("code").is_some() || data.get("status").and_then(Value::as_str) == Some("error") {
        return None;
    }

    Some(StockQuote {
        symbol: symbol.to_string(),
        current_price: number(&data["close"]),
        previous_close: number(&data["previous_close"]),
        change: number(&data["change"]),
        change_percent: number(&data["percent_change"]),
        day_high: number(&data["high"]),
        day_low: number(&data["low"]),
        volume: number(&data["volume"]) as i64,
        last_updated: now_millis(),
        source: "Twelve Data".to_string(),
    })
}

pub fn parse_alpha_vantage_quote(symbol: &str, data: &Value) -> Option<StockQuote> {
    let quote = data.get("Global Quote").filter(|q| q.as_object().is_some_and(|o| !o.is_empty()))?;

    let last_updated = quote["07. latest trading day"]
        .as_str()
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_else(now_millis);

    Some(StockQuote {
        symbol: symbol.to_string(),
        current_price: number(&quote["05. price"]),
        previous_close: number(&quote["08. previous close"]),
        change: number(&quote["09. change"]),
        change_percent: number(&quote["10. change percent"]),
        day_high: number(&quote["03. high"]),
        day_low: number(&quote["04. low"]),
        volume: number(&quote["06. volume"]) as i64,
        last_updated,
        source: "Alpha Vantage".to_string(),
    })
}

async fn fetch_from_nse(client: &reqwest::Client, symbol: &str) -> Result<Option<StockQuote>, String> {
    let url = format!("{}?symbol={}", NSE_QUOTE_URL, urlencoding::encode(symbol));
    let request = client
        .get(&url)
        .header("User-Agent", "Mozilla/5.0")
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US,en;q=0.9");

    let data = fetch_json(request, "NSE").await?;
    Ok(parse_nse_quote(symbol, &data))
}

async fn fetch_from_twelve_data(client: &reqwest::Client, symbol: &str, api_key: &str) -> Result<Option<StockQuote>, String> {
    let url = format!(
        "{}?symbol={}&exchange=NSE&apikey={}",
        TWELVE_DATA_QUOTE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(api_key)
    );
    let data = fetch_json(client.get(&url), "Twelve Data").await?;
    Ok(parse_twelve_data_quote(symbol, &data))
}

async fn fetch_from_alpha_vantage(client: &reqwest::Client, symbol: &str, api_key: &str) -> Result<Option<StockQuote>, String> {
    let url = format!(
        "{}?function=GLOBAL_QUOTE&symbol={}.BSE&apikey={}",
        ALPHA_VANTAGE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(api_key)
    );
    let data = fetch_json(client.get(&url), "Alpha Vantage").await?;
    Ok(parse_alpha_vantage_quote(symbol, &data))
}

fn log_miss(source: &str, symbol: &str, result: &Result<Option<StockQuote>, String>) {
    match result {
        Err(e) => log::warn!("⚠️ {} quote for {} failed: {}", source, symbol, e),
        Ok(None) => log::debug!("📈 {} has no quote for {}", source, symbol),
        Ok(Some(_)) => {}
    }
}

/// Live quote for an NSE symbol. NSE first, then Twelve Data, then Alpha Vantage.
/// Returns `None` when no source has data; nothing is fabricated.
pub async fn get_stock_data(config: &AppConfig, symbol: &str) -> Option<StockQuote> {
    let symbol = symbol.trim().to_uppercase();
    let cache_key = format!("stock_{}", symbol);
    if let Some(cached) = STOCK_CACHE.get(&cache_key) {
        return Some(cached);
    }

    let client = client();

    let mut result = fetch_from_nse(&client, &symbol).await;
    log_miss("NSE", &symbol, &result);

    if !matches!(result, Ok(Some(_))) {
        if let Some(key) = config.twelve_data_api_key.as_deref() {
            result = fetch_from_twelve_data(&client, &symbol, key).await;
            log_miss("Twelve Data", &symbol, &result);
        }
    }

    if !matches!(result, Ok(Some(_))) {
        if let Some(key) = config.alpha_vantage_api_key.as_deref() {
            result = fetch_from_alpha_vantage(&client, &symbol, key).await;
            log_miss("Alpha Vantage", &symbol, &result);
        }
    }

    match result {
        Ok(Some(quote)) => {
            log::info!("📈 {} = {:.2} ({})", symbol, quote.current_price, quote.source);
            STOCK_CACHE.set(&cache_key, quote.clone());
            Some(quote)
        }
        _ => {
            log::warn!("⚠️ No live quote available for {}", symbol);
            None
        }
    }
}

/// Quotes for several symbols fetched concurrently. Symbols without data are dropped.
pub async fn get_multiple_stocks(config: &AppConfig, symbols: &[String]) -> Vec<StockQuote> {
    join_all(symbols.iter().map(|s| get_stock_data(config, s)))
        .await
        .into_iter()
        .flatten()
        .collect()
}

pub fn clear_cache() {
    STOCK_CACHE.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nse_quote() {
        let data = json!({
            "priceInfo": {
                "lastPrice": 2456.75,
                "previousClose": 2445.3,
                "change": 11.45,
                "pChange": 0.47,
                "intraDayHighLow": { "min": 2440.0, "max": 2468.9 }
            },
            "preOpenMarket": { "totalTradedVolume": 125000 }
        });
        let quote = parse_nse_quote("RELIANCE", &data).unwrap();
        assert_eq!(quote.current_price, 2456.75);
        assert_eq!(quote.day_high, 2468.9);
        assert_eq!(quote.volume, 125000);
        assert_eq!(quote.source, "NSE India");

        assert!(parse_nse_quote("RELIANCE", &json!({ "msg": "blocked" })).is_none());
    }

    #[test]
    fn test_parse_twelve_data_strings_and_errors() {
        let data = json!({ "close": "3678.90", "previous_close": "3665.45", "change": "13.45", "percent_change": "0.37", "volume": "98000" });
        let quote = parse_twelve_data_quote("TCS", &data).unwrap();
        assert_eq!(quote.current_price, 3678.9);
        assert_eq!(quote.volume, 98000);

        let error = json!({ "code": 404, "message": "symbol not found", "status": "error" });
        assert!(parse_twelve_data_quote("TCS", &error).is_none());
    }

    #[test]
    fn test_parse_alpha_vantage_percent_and_date() {
        let data = json!({
            "Global Quote": {
                "05. price": "1456.25",
                "08. previous close": "1448.80",
                "09. change": "7.45",
                "10. change percent": "0.5142%",
                "07. latest trading day": "2025-03-10"
            }
        });
        let quote = parse_alpha_vantage_quote("INFY", &data).unwrap();
        assert_eq!(quote.change_percent, 0.5142);
        assert_eq!(quote.last_updated, 1741564800000);

        assert!(parse_alpha_vantage_quote("INFY", &json!({ "Global Quote": {} })).is_none());
    }

    #[tokio::test]
    async fn test_cached_quote_served_without_network() {
        let quote = StockQuote {
            symbol: "CACHETEST".into(),
            current_price: 10.0,
            previous_close: 9.0,
            change: 1.0,
            change_percent: 11.1,
            day_high: 10.5,
            day_low: 9.5,
            volume: 1,
            last_updated: 0,
            source: "NSE India".into(),
        };
        STOCK_CACHE.set("stock_CACHETEST", quote.clone());

        let config = AppConfig::from_env();
        assert_eq!(get_stock_data(&config, "cachetest").await, Some(quote));
    }
}

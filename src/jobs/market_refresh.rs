// Keeps the mirror caches warm so the first request after expiry does not
// pay for a full upstream fetch.

use crate::config::AppConfig;
use crate::services::{commodity_data_service, market_reference, stock_data_service};
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

pub const COMMODITY_REFRESH_SECS: u64 = 30 * 60;
pub const STOCK_REFRESH_SECS: u64 = 5 * 60;

/// Runs `tick` immediately, then once per `period`, on its own task.
fn spawn_every<F, Fut>(period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            tick().await;
        }
    })
}

/// Spawns the commodity and featured-stock refresh loops and returns their
/// handles. The commodity loop only runs with a data.gov.in key.
pub fn start_market_refresh(config: AppConfig) -> Vec<JoinHandle<()>> {
    log::info!(
        "📅 Starting market refresh (commodities every {} min, stocks every {} min)",
        COMMODITY_REFRESH_SECS / 60,
        STOCK_REFRESH_SECS / 60
    );

    let mut handles = Vec::with_capacity(2);

    if config.data_gov_in_api_key.is_some() {
        let commodity_config = config.clone();
        handles.push(spawn_every(Duration::from_secs(COMMODITY_REFRESH_SECS), move || {
            let config = commodity_config.clone();
            async move { refresh_commodities(&config).await }
        }));
    } else {
        log::warn!("⚠️ DATA_GOV_IN_API_KEY not set, commodity refresh disabled");
    }

    handles.push(spawn_every(Duration::from_secs(STOCK_REFRESH_SECS), move || {
        let config = config.clone();
        async move { refresh_stocks(&config).await }
    }));

    log::info!("✅ Market refresh started ({} loops)", handles.len());
    handles
}

async fn refresh_commodities(config: &AppConfig) {
    commodity_data_service::clear_cache();
    match commodity_data_service::get_commodity_data(config).await {
        Some(records) => log::info!("🌾 Commodity cache refreshed: {} records", records.len()),
        None => log::error!("❌ Commodity refresh returned no data"),
    }
}

async fn refresh_stocks(config: &AppConfig) {
    let symbols = market_reference::featured_symbols();
    stock_data_service::clear_cache();
    let quotes = stock_data_service::get_multiple_stocks(config, &symbols).await;

    if quotes.is_empty() {
        log::warn!("⚠️ Stock refresh: no upstream source answered");
    } else {
        log::debug!("📈 Stock cache refreshed: {}/{} symbols", quotes.len(), symbols.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(data_gov_in_api_key: Option<&str>) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: "0".into(),
            mongodb_uri: crate::config::DEFAULT_MONGODB_URI.into(),
            cors_origins: vec![],
            gemini_api_key: None,
            groq_api_key: None,
            google_search_api_key: None,
            google_search_engine_id: None,
            alpha_vantage_api_key: None,
            twelve_data_api_key: None,
            data_gov_in_api_key: data_gov_in_api_key.map(str::to_string),
            data_gov_in_dataset_id: crate::config::DEFAULT_DATA_GOV_IN_DATASET_ID.into(),
        }
    }

    #[actix_web::test]
    async fn test_tick_runs_immediately_and_repeats() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let handle = spawn_every(Duration::from_millis(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        handle.abort();
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[actix_web::test]
    async fn test_loops_are_spawned_per_configured_source() {
        let handles = start_market_refresh(config(None));
        assert_eq!(handles.len(), 1);
        handles.iter().for_each(JoinHandle::abort);

        let handles = start_market_refresh(config(Some("real-key")));
        assert_eq!(handles.len(), 2);
        for handle in handles {
            handle.abort();
            assert!(handle.await.unwrap_err().is_cancelled());
        }
    }
}

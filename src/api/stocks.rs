use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{error_json, not_found};
use crate::config::AppConfig;
use crate::models::{now_millis, Pagination};
use crate::services::market_reference::{self, FeaturedStock, FEATURED_STOCKS, INDICES};
use crate::services::{nse_stock_list_service, stock_data_service};

const HISTORY_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct StockFilters {
    pub exchange: Option<String>,
    pub sector: Option<String>,
    /// Substring of the symbol or company name.
    pub symbol: Option<String>,
}

pub fn filter_featured(filters: &StockFilters) -> Vec<FeaturedStock> {
    let exchange = filters.exchange.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let sector = filters.sector.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let needle = filters
        .symbol
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|v| !v.is_empty());

    FEATURED_STOCKS
        .iter()
        .filter(|s| exchange.map_or(true, |e| s.exchange.eq_ignore_ascii_case(e)))
        .filter(|s| sector.map_or(true, |e| s.sector.eq_ignore_ascii_case(e)))
        .filter(|s| {
            needle.as_deref().map_or(true, |n| {
                s.symbol.to_lowercase().contains(n) || s.name.to_lowercase().contains(n)
            })
        })
        .copied()
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/stocks",
    tag = "Stocks",
    params(StockFilters, ("page" = Option<u64>, Query,), ("limit" = Option<i64>, Query,)),
    responses((status = 200, description = "Paginated featured stocks"))
)]
pub async fn list_stocks(filters: web::Query<StockFilters>, pagination: web::Query<Pagination>) -> HttpResponse {
    let stocks = filter_featured(&filters);
    let total = stocks.len() as u64;
    let page: Vec<FeaturedStock> = stocks
        .into_iter()
        .skip(pagination.skip() as usize)
        .take(pagination.limit() as usize)
        .collect();

    HttpResponse::Ok().json(json!({
        "stocks": page,
        "totalPages": pagination.total_pages(total),
        "currentPage": pagination.page(),
        "total": total
    }))
}

pub async fn get_indices() -> HttpResponse {
    let now = now_millis();
    let indices: Vec<_> = INDICES
        .iter()
        .map(|i| {
            json!({
                "name": i.name,
                "value": i.value,
                "change": i.change,
                "changePercent": i.change_percent,
                "lastUpdated": now
            })
        })
        .collect();
    HttpResponse::Ok().json(indices)
}

pub async fn get_gainers() -> HttpResponse {
    HttpResponse::Ok().json(market_reference::top_gainers())
}

pub async fn get_losers() -> HttpResponse {
    HttpResponse::Ok().json(market_reference::top_losers())
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SymbolPage {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Whether another page follows the one starting at `offset`.
fn has_more(offset: usize, limit: usize, total: usize) -> bool {
    offset.saturating_add(limit) < total
}

pub async fn nse_list(query: web::Query<SymbolPage>) -> HttpResponse {
    let limit = query.limit.unwrap_or(nse_stock_list_service::DEFAULT_PAGE_SIZE).clamp(1, 500);
    let offset = query.offset.unwrap_or(0);
    let symbols = nse_stock_list_service::get_paginated_symbols(limit, offset);
    let total = nse_stock_list_service::total_count();

    HttpResponse::Ok().json(json!({
        "success": true,
        "symbols": symbols,
        "total": total,
        "limit": limit,
        "offset": offset,
        "hasMore": has_more(offset, limit, total)
    }))
}

#[derive(Debug, Deserialize)]
pub struct SymbolSearch {
    pub q: Option<String>,
}

pub async fn nse_search(query: web::Query<SymbolSearch>) -> HttpResponse {
    let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return error_json(HttpResponse::BadRequest(), "Search query is required");
    };
    let results = nse_stock_list_service::search_stocks(q);

    HttpResponse::Ok().json(json!({
        "success": true,
        "query": q,
        "count": results.len(),
        "results": results
    }))
}

#[utoipa::path(
    get,
    path = "/api/stocks/live/{symbol}",
    tag = "Stocks",
    responses(
        (status = 200, description = "Live quote", body = stock_data_service::StockQuote),
        (status = 503, description = "No upstream source answered")
    )
)]
pub async fn live_quote(config: web::Data<AppConfig>, symbol: web::Path<String>) -> HttpResponse {
    match stock_data_service::get_stock_data(&config, &symbol).await {
        Some(quote) => HttpResponse::Ok().json(json!({ "success": true, "data": quote })),
        None => error_json(
            HttpResponse::ServiceUnavailable(),
            format!("Live data for {} is currently unavailable", symbol.to_uppercase()),
        ),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub date: String,
    pub price: f64,
    pub volume: i64,
}

/// Random walk ending today, floored at 80% of the reference price.
pub fn synthetic_history<R: Rng>(stock: &FeaturedStock, rng: &mut R) -> Vec<HistoryPoint> {
    let today = Utc::now().date_naive();
    let floor = stock.current_price * 0.8;
    let mut price = stock.current_price;

    (0..=HISTORY_DAYS)
        .rev()
        .map(|days_ago| {
            price += (rng.gen::<f64>() - 0.5) * 50.0;
            HistoryPoint {
                date: (today - Duration::days(days_ago)).format("%Y-%m-%d").to_string(),
                price: price.max(floor),
                volume: rng.gen_range(1_000_000..6_000_000),
            }
        })
        .collect()
}

pub async fn get_stock(symbol: web::Path<String>) -> HttpResponse {
    let Some(stock) = market_reference::find_featured(&symbol) else {
        return not_found("Stock not found");
    };

    let history = synthetic_history(stock, &mut rand::thread_rng());
    let mut body = json!(stock);
    body["changePercent"] = json!(stock.change_percent());
    body["lastUpdated"] = json!(now_millis());
    body["historicalData"] = json!(history);

    HttpResponse::Ok().json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use rand::{rngs::StdRng, SeedableRng};

    #[::core::prelude::v1::test]
    fn test_has_more_at_the_edges() {
        assert!(has_more(0, 50, 51));
        assert!(!has_more(1, 50, 51));
        assert!(!has_more(usize::MAX, 50, 51));
    }

    #[actix_web::test]
    async fn test_nse_list_with_huge_offset_is_an_empty_last_page() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/stocks/nse/list?offset={}&limit=10", usize::MAX))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["hasMore"], false);
        assert!(body["symbols"].as_array().unwrap().is_empty());
    }

    #[::core::prelude::v1::test]
    fn test_filter_by_sector_and_name() {
        let it = filter_featured(&StockFilters { sector: Some("it".into()), ..Default::default() });
        assert_eq!(it.len(), 3);

        let maruti = filter_featured(&StockFilters { symbol: Some("suzuki".into()), ..Default::default() });
        assert_eq!(maruti[0].symbol, "MARUTI");
    }

    #[::core::prelude::v1::test]
    fn test_history_has_31_points_above_floor() {
        let stock = market_reference::find_featured("WIPRO").unwrap();
        let history = synthetic_history(stock, &mut StdRng::seed_from_u64(7));
        assert_eq!(history.len(), 31);
        assert!(history.iter().all(|p| p.price >= stock.current_price * 0.8));
        assert!(history.iter().all(|p| (1_000_000..6_000_000).contains(&p.volume)));
        assert_eq!(history.last().unwrap().date, Utc::now().date_naive().format("%Y-%m-%d").to_string());
    }

    #[actix_web::test]
    async fn test_unknown_symbol_is_404() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/stocks/NOPE").to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/stocks/infy").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["symbol"], "INFY");
        assert_eq!(body["historicalData"].as_array().unwrap().len(), 31);
    }

    #[actix_web::test]
    async fn test_static_routes_win_over_symbol() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let req = test::TestRequest::get().uri("/api/stocks/indices").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
        assert_eq!(body[0]["name"], "NIFTY 50");

        let req = test::TestRequest::get().uri("/api/stocks/nse/search?q=bank").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["results"].as_array().unwrap().iter().any(|s| s == "HDFCBANK"));
    }
}

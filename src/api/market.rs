use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, Bson, Document};
use serde::Deserialize;
use serde_json::json;

use crate::api::{aggregate_docs, find_all, find_page, server_error};
use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::models::{MarketData, Pagination};
use crate::services::commodity_data_service;
use crate::utils::ci_regex;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct MarketFilters {
    pub state: Option<String>,
    pub category: Option<String>,
    pub commodity: Option<String>,
    pub district: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn build_market_filter(filters: &MarketFilters) -> Document {
    let mut filter = doc! { "isActive": true };

    if let Some(state) = non_empty(&filters.state) {
        filter.insert("state", ci_regex(state));
    }
    if let Some(category) = non_empty(&filters.category) {
        filter.insert("category", category);
    }
    if let Some(commodity) = non_empty(&filters.commodity) {
        filter.insert("commodity", ci_regex(commodity));
    }
    if let Some(district) = non_empty(&filters.district) {
        filter.insert("district", ci_regex(district));
    }

    filter
}

fn collection(db: &MongoDB) -> mongodb::Collection<MarketData> {
    db.collection::<MarketData>(MarketData::COLLECTION)
}

#[utoipa::path(
    get,
    path = "/api/market",
    tag = "Market",
    params(MarketFilters, ("page" = Option<u64>, Query,), ("limit" = Option<i64>, Query,)),
    responses((status = 200, description = "Paginated mandi prices, newest first"))
)]
pub async fn list_market_data(
    db: web::Data<MongoDB>,
    filters: web::Query<MarketFilters>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    let filter = build_market_filter(&filters);

    match find_page(&collection(&db), filter, doc! { "lastUpdated": -1 }, &pagination).await {
        Ok((data, total)) => HttpResponse::Ok().json(json!({
            "data": data,
            "totalPages": pagination.total_pages(total),
            "currentPage": pagination.page(),
            "total": total
        })),
        Err(e) => server_error("Error fetching market data", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

pub async fn by_state(
    db: web::Data<MongoDB>,
    state: web::Path<String>,
    query: web::Query<CategoryQuery>,
) -> HttpResponse {
    let mut filter = doc! { "state": ci_regex(&state), "isActive": true };
    if let Some(category) = non_empty(&query.category) {
        filter.insert("category", category);
    }

    match find_all(&collection(&db), filter, doc! { "commodity": 1 }, None).await {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(e) => server_error("Error fetching state market data", e),
    }
}

pub async fn trending(db: web::Data<MongoDB>) -> HttpResponse {
    let collection = collection(&db);

    let rising = find_all(
        &collection,
        doc! { "trend": "rising", "isActive": true },
        doc! { "changePercent": -1 },
        Some(10),
    );
    let falling = find_all(
        &collection,
        doc! { "trend": "falling", "isActive": true },
        doc! { "changePercent": 1 },
        Some(10),
    );

    match futures::try_join!(rising, falling) {
        Ok((rising, falling)) => HttpResponse::Ok().json(json!({ "rising": rising, "falling": falling })),
        Err(e) => server_error("Error fetching trending data", e),
    }
}

/// Cheapest retail price first, across every state carrying the commodity.
pub async fn compare(db: web::Data<MongoDB>, commodity: web::Path<String>) -> HttpResponse {
    let filter = doc! { "commodity": ci_regex(&commodity), "isActive": true };

    match find_all(&collection(&db), filter, doc! { "prices.retail.average": 1 }, None).await {
        Ok(data) => {
            let rows: Vec<_> = data
                .into_iter()
                .map(|m| {
                    json!({
                        "_id": m.id.map(|id| id.to_hex()),
                        "state": m.state,
                        "district": m.district,
                        "prices": m.prices,
                        "unit": m.unit,
                        "quality": m.quality,
                        "lastUpdated": m.last_updated
                    })
                })
                .collect();
            HttpResponse::Ok().json(rows)
        }
        Err(e) => server_error("Error fetching price comparison", e),
    }
}

fn category_stats_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "isActive": true } },
        doc! { "$group": {
            "_id": "$category",
            "count": { "$sum": 1 },
            "avgPrice": { "$avg": "$prices.retail.average" }
        } },
        doc! { "$sort": { "count": -1 } },
    ]
}

fn state_stats_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "isActive": true } },
        doc! { "$group": { "_id": "$state", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": 10 },
    ]
}

async fn distinct_count(collection: &mongodb::Collection<MarketData>, field: &str) -> Result<usize, String> {
    let values = collection
        .distinct(field, doc! {})
        .await
        .map_err(|e| format!("Failed to count distinct {}: {}", field, e))?;
    Ok(values.iter().filter(|v| !matches!(v, Bson::Null)).count())
}

fn stats_json(docs: Vec<Document>) -> Vec<serde_json::Value> {
    docs.into_iter()
        .map(|d| serde_json::to_value(&d).unwrap_or(serde_json::Value::Null))
        .collect()
}

pub async fn stats(db: web::Data<MongoDB>) -> HttpResponse {
    let collection = collection(&db);

    let result = futures::try_join!(
        distinct_count(&collection, "commodity"),
        distinct_count(&collection, "state"),
        distinct_count(&collection, "market"),
        aggregate_docs(&collection, category_stats_pipeline()),
        aggregate_docs(&collection, state_stats_pipeline()),
    );

    match result {
        Ok((commodities, states, markets, categories, top_states)) => HttpResponse::Ok().json(json!({
            "totalCommodities": commodities,
            "totalStates": states,
            "totalMarkets": markets,
            "categories": stats_json(categories),
            "states": stats_json(top_states)
        })),
        Err(e) => server_error("Error fetching market statistics", e),
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LiveQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/market/live",
    tag = "Market",
    params(LiveQuery),
    responses(
        (status = 200, description = "Live AGMARKNET prices"),
        (status = 503, description = "Commodity feed unavailable")
    )
)]
pub async fn live_commodities(config: web::Data<AppConfig>, query: web::Query<LiveQuery>) -> HttpResponse {
    let data = match query.limit {
        Some(limit) => {
            commodity_data_service::get_paginated_data(&config, limit.clamp(1, 500), query.offset.unwrap_or(0)).await
        }
        None => commodity_data_service::get_commodity_data(&config).await,
    };

    match data.filter(|d| !d.is_empty()) {
        Some(data) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": data.len(),
            "data": data,
            "source": commodity_data_service::SOURCE,
            "lastUpdated": crate::models::now_millis()
        })),
        None => HttpResponse::ServiceUnavailable().json(json!({
            "success": false,
            "error": "Live commodity data is currently unavailable"
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_db;
    use crate::models::{CommodityCategory, Prices, PriceRange, Trend};
    use actix_web::{test, App};

    #[::core::prelude::v1::test]
    fn test_filter_uses_regex_except_category() {
        let filters = MarketFilters {
            state: Some("maharashtra".into()),
            category: Some("vegetables".into()),
            commodity: Some("onion".into()),
            district: None,
        };
        let filter = build_market_filter(&filters);
        assert_eq!(filter.get_str("category").unwrap(), "vegetables");
        assert_eq!(filter.get_document("state").unwrap().get_str("$options").unwrap(), "i");
        assert_eq!(filter.get_document("commodity").unwrap().get_str("$regex").unwrap(), "onion");
        assert!(!filter.contains_key("district"));
    }

    #[::core::prelude::v1::test]
    fn test_category_stats_average_retail_price() {
        let pipeline = category_stats_pipeline();
        let group = pipeline[1].get_document("$group").unwrap();
        assert_eq!(
            group.get_document("avgPrice").unwrap().get_str("$avg").unwrap(),
            "$prices.retail.average"
        );
        assert_eq!(state_stats_pipeline().last().unwrap().get_i32("$limit").unwrap(), 10);
    }

    #[actix_web::test]
    async fn test_live_without_key_is_unavailable() {
        let mut config = AppConfig::from_env();
        config.data_gov_in_api_key = None;
        commodity_data_service::clear_cache();

        let app = test::init_service(
            App::new().app_data(web::Data::new(config)).configure(crate::api::configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/market/live?limit=10").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    fn record(commodity: &str, state: &str, retail: f64, trend: Trend) -> MarketData {
        let now = crate::models::now_millis();
        MarketData {
            id: None,
            commodity: commodity.into(),
            category: CommodityCategory::Vegetables,
            state: state.into(),
            district: None,
            market: None,
            prices: Prices {
                wholesale: PriceRange::default(),
                retail: PriceRange { min: retail, max: retail, average: retail },
            },
            unit: "per kg".into(),
            quality: Default::default(),
            trend,
            change_percent: Some(1.0),
            last_updated: now,
            source: "test".into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_compare_sorts_by_retail_price() {
        let db = test_db().await;
        let collection = db.collection::<MarketData>(MarketData::COLLECTION);
        collection.delete_many(doc! { "commodity": "Testroot" }).await.unwrap();
        collection
            .insert_many(vec![
                record("Testroot", "Kerala", 60.0, Trend::Rising),
                record("Testroot", "Punjab", 35.0, Trend::Stable),
            ])
            .await
            .unwrap();

        let app = test::init_service(
            App::new().app_data(web::Data::new(db.clone())).configure(crate::api::configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/market/compare/testroot").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["state"], "Punjab");
        assert_eq!(body[1]["state"], "Kerala");

        collection.delete_many(doc! { "commodity": "Testroot" }).await.unwrap();
    }
}

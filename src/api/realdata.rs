use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::{json, Value};

use crate::models::now_millis;
use crate::services::market_reference::{is_market_open, FEATURED_STOCKS};

/// Featured stocks shown on the live board.
const LIVE_BOARD_SIZE: usize = 4;

fn market_status(open: bool) -> &'static str {
    if open {
        "OPEN"
    } else {
        "CLOSED"
    }
}

/// Live board snapshot. Outside trading hours every change reads zero.
pub fn stock_board(open: bool, now: i64) -> Value {
    let movement = |v: f64| if open { v } else { 0.0 };

    let stocks: Vec<Value> = FEATURED_STOCKS
        .iter()
        .take(LIVE_BOARD_SIZE)
        .map(|s| {
            json!({
                "symbol": s.symbol,
                "name": s.name,
                "exchange": s.exchange,
                "sector": s.sector,
                "currentPrice": s.current_price,
                "previousClose": s.previous_close,
                "change": movement(s.change),
                "changePercent": movement(s.change_percent()),
                "dayHigh": s.day_high,
                "dayLow": s.day_low,
                "volume": s.volume,
                "marketCap": s.market_cap,
                "lastUpdated": now,
                "marketStatus": market_status(open),
                "currency": "INR"
            })
        })
        .collect();

    let index = |value: f64, change: f64, percent: f64| {
        json!({
            "value": value,
            "change": movement(change),
            "changePercent": movement(percent),
            "lastUpdated": now
        })
    };

    json!({
        "stocks": stocks,
        "indices": {
            "nifty50": index(19674.25, 45.30, 0.23),
            "sensex": index(66112.44, 123.45, 0.19),
            "bankNifty": index(43567.80, -89.20, -0.20)
        },
        "marketStatus": market_status(open),
        "lastUpdated": now,
        "source": "NSE/BSE (Simulated)",
        "disclaimer": "This is simulated data for demonstration. Live quotes are served by /api/stocks/live/{symbol}."
    })
}

#[utoipa::path(
    get,
    path = "/api/realdata/stocks/live",
    tag = "Real Data",
    responses((status = 200, description = "Featured stocks, indices and market status"))
)]
pub async fn live_stocks() -> HttpResponse {
    let open = is_market_open(Utc::now());
    HttpResponse::Ok().json(json!({ "success": true, "data": stock_board(open, now_millis()) }))
}

#[allow(clippy::too_many_arguments)]
fn commodity(
    name: &str,
    category: &str,
    state: &str,
    market: (&str, &str),
    wholesale: (f64, f64, f64),
    retail: (f64, f64, f64),
    quality: &str,
    trend: &str,
    source: &str,
    now: i64,
) -> Value {
    json!({
        "commodity": name,
        "category": category,
        "state": state,
        "district": market.0,
        "market": market.1,
        "prices": {
            "wholesale": { "min": wholesale.0, "max": wholesale.1, "average": wholesale.2 },
            "retail": { "min": retail.0, "max": retail.1, "average": retail.2 }
        },
        "unit": "per quintal",
        "quality": quality,
        "trend": trend,
        "lastUpdated": now,
        "source": source
    })
}

pub async fn live_commodities() -> HttpResponse {
    let now = now_millis();
    let data = vec![
        commodity(
            "Onion", "vegetables", "Maharashtra", ("Nashik", "Lasalgaon"),
            (1000.0, 1400.0, 1200.0), (1400.0, 1800.0, 1600.0),
            "good", "stable", "AGMARKNET", now,
        ),
        commodity(
            "Tomato", "vegetables", "Karnataka", ("Bangalore", "Yeshwantpur"),
            (700.0, 1100.0, 900.0), (1100.0, 1500.0, 1300.0),
            "premium", "rising", "Karnataka State Marketing Board", now,
        ),
        commodity(
            "Rice (Basmati)", "grains", "Punjab", ("Amritsar", "Amritsar"),
            (4500.0, 5500.0, 5000.0), (5500.0, 6500.0, 6000.0),
            "premium", "stable", "Punjab Mandi Board", now,
        ),
        commodity(
            "Wheat", "grains", "Madhya Pradesh", ("Indore", "Indore"),
            (2100.0, 2300.0, 2200.0), (2400.0, 2600.0, 2500.0),
            "good", "stable", "MP State Marketing Board", now,
        ),
    ];

    HttpResponse::Ok().json(json!({
        "success": true,
        "data": data,
        "lastUpdated": now,
        "source": "AGMARKNET & State Marketing Boards",
        "disclaimer": "Prices are indicative and may vary. For official rates, check respective market boards."
    }))
}

fn official_service_list(now: i64) -> Vec<Value> {
    vec![
        json!({
            "id": "aadhaar-services",
            "name": "Aadhaar Card Services",
            "description": "Unique Identification Authority of India (UIDAI) services for Aadhaar enrollment, update, and download.",
            "department": "UIDAI",
            "category": "identity-documents",
            "officialWebsite": "https://uidai.gov.in",
            "applicationUrl": "https://appointments.uidai.gov.in",
            "processingTime": { "normal": "90 days", "urgent": "Not available" },
            "fees": { "newEnrollment": 0, "update": 50, "reprint": 50 },
            "requiredDocuments": ["Proof of Identity", "Proof of Address", "Proof of Date of Birth"],
            "onlineServices": [
                "Download e-Aadhaar",
                "Update demographic details",
                "Check enrollment status",
                "Book appointment"
            ],
            "helpline": "1947",
            "isActive": true,
            "lastUpdated": now
        }),
        json!({
            "id": "pan-card",
            "name": "PAN Card Application",
            "description": "Apply for Permanent Account Number through NSDL or UTIITSL for income tax purposes.",
            "department": "Income Tax Department",
            "category": "financial-services",
            "officialWebsite": "https://www.onlineservices.nsdl.com/paam/endUserRegisterContact.html",
            "applicationUrl": "https://www.onlineservices.nsdl.com/paam/endUserRegisterContact.html",
            "processingTime": { "normal": "15-20 days", "tatkal": "7 days" },
            "fees": { "normal": 110, "tatkal": 370, "correction": 110, "reprint": 110 },
            "requiredDocuments": ["Identity Proof", "Address Proof", "Date of Birth Proof", "Photograph"],
            "onlineServices": [
                "New PAN application",
                "PAN correction",
                "Duplicate PAN",
                "Track application status"
            ],
            "helpline": "020-27218080",
            "isActive": true,
            "lastUpdated": now
        }),
    ]
}

pub async fn official_services() -> HttpResponse {
    let now = now_millis();
    let services = official_service_list(now);
    HttpResponse::Ok().json(json!({
        "success": true,
        "totalServices": services.len(),
        "services": services,
        "lastUpdated": now,
        "source": "Official Government Portals"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_market_zeroes_changes() {
        let board = stock_board(false, 0);
        assert_eq!(board["marketStatus"], "CLOSED");
        assert_eq!(board["stocks"].as_array().unwrap().len(), 4);
        assert_eq!(board["stocks"][0]["change"], 0.0);
        assert_eq!(board["indices"]["sensex"]["changePercent"], 0.0);
        assert_eq!(board["stocks"][0]["currentPrice"], 2456.75);
    }

    #[test]
    fn test_open_market_keeps_changes() {
        let board = stock_board(true, 0);
        assert_eq!(board["stocks"][3]["symbol"], "HDFCBANK");
        assert_eq!(board["stocks"][3]["change"], -6.75);
        assert_eq!(board["stocks"][3]["changePercent"], -0.4);
    }

    #[test]
    fn test_official_services_have_helplines() {
        let services = official_service_list(0);
        assert_eq!(services[0]["helpline"], "1947");
        assert_eq!(services[1]["category"], "financial-services");
    }
}

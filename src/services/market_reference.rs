use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use serde::Serialize;

/// IST is UTC+05:30 all year.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const MARKET_OPEN_MINUTE: u32 = 9 * 60 + 15;
const MARKET_CLOSE_MINUTE: u32 = 15 * 60 + 30;

/// Reference quote for one of the portal's featured NSE equities.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedStock {
    pub symbol: &'static str,
    pub name: &'static str,
    pub exchange: &'static str,
    pub sector: &'static str,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: i64,
    pub market_cap: i64,
    pub pe: f64,
}

impl FeaturedStock {
    pub fn change_ratio(&self) -> f64 {
        if self.previous_close == 0.0 {
            0.0
        } else {
            self.change / self.previous_close
        }
    }

    pub fn change_percent(&self) -> f64 {
        (self.change_ratio() * 10000.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub name: &'static str,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

pub const FEATURED_STOCKS: [FeaturedStock; 8] = [
    FeaturedStock {
        symbol: "RELIANCE",
        name: "Reliance Industries Limited",
        exchange: "NSE",
        sector: "Energy",
        current_price: 2456.75,
        previous_close: 2445.30,
        change: 11.45,
        day_high: 2467.80,
        day_low: 2441.20,
        volume: 12_500_000,
        market_cap: 1_658_000_000_000,
        pe: 24.5,
    },
    FeaturedStock {
        symbol: "TCS",
        name: "Tata Consultancy Services",
        exchange: "NSE",
        sector: "IT",
        current_price: 3678.90,
        previous_close: 3665.45,
        change: 13.45,
        day_high: 3689.30,
        day_low: 3658.70,
        volume: 8_750_000,
        market_cap: 1_342_000_000_000,
        pe: 28.3,
    },
    FeaturedStock {
        symbol: "INFY",
        name: "Infosys Limited",
        exchange: "NSE",
        sector: "IT",
        current_price: 1456.25,
        previous_close: 1448.80,
        change: 7.45,
        day_high: 1462.90,
        day_low: 1445.60,
        volume: 15_600_000,
        market_cap: 602_000_000_000,
        pe: 26.8,
    },
    FeaturedStock {
        symbol: "HDFCBANK",
        name: "HDFC Bank Limited",
        exchange: "NSE",
        sector: "Banking",
        current_price: 1678.45,
        previous_close: 1685.20,
        change: -6.75,
        day_high: 1689.80,
        day_low: 1672.30,
        volume: 9_800_000,
        market_cap: 1_278_000_000_000,
        pe: 18.9,
    },
    FeaturedStock {
        symbol: "ICICIBANK",
        name: "ICICI Bank Limited",
        exchange: "NSE",
        sector: "Banking",
        current_price: 945.60,
        previous_close: 952.30,
        change: -6.70,
        day_high: 956.80,
        day_low: 941.20,
        volume: 11_200_000,
        market_cap: 658_000_000_000,
        pe: 16.2,
    },
    FeaturedStock {
        symbol: "WIPRO",
        name: "Wipro Limited",
        exchange: "NSE",
        sector: "IT",
        current_price: 445.30,
        previous_close: 442.80,
        change: 2.50,
        day_high: 448.90,
        day_low: 441.20,
        volume: 7_800_000,
        market_cap: 245_000_000_000,
        pe: 22.1,
    },
    FeaturedStock {
        symbol: "MARUTI",
        name: "Maruti Suzuki India Limited",
        exchange: "NSE",
        sector: "Auto",
        current_price: 10245.60,
        previous_close: 10198.30,
        change: 47.30,
        day_high: 10267.80,
        day_low: 10189.40,
        volume: 1_250_000,
        market_cap: 309_000_000_000,
        pe: 32.4,
    },
    FeaturedStock {
        symbol: "HINDUNILVR",
        name: "Hindustan Unilever Limited",
        exchange: "NSE",
        sector: "FMCG",
        current_price: 2567.80,
        previous_close: 2554.20,
        change: 13.60,
        day_high: 2578.90,
        day_low: 2549.30,
        volume: 2_100_000,
        market_cap: 602_000_000_000,
        pe: 58.7,
    },
];

pub const INDICES: [MarketIndex; 5] = [
    MarketIndex { name: "NIFTY 50", value: 19674.25, change: 145.30, change_percent: 0.74 },
    MarketIndex { name: "SENSEX", value: 65953.48, change: 498.58, change_percent: 0.76 },
    MarketIndex { name: "NIFTY BANK", value: 44821.15, change: 312.85, change_percent: 0.70 },
    MarketIndex { name: "NIFTY IT", value: 31245.80, change: 234.60, change_percent: 0.76 },
    MarketIndex { name: "NIFTY AUTO", value: 16789.45, change: -89.30, change_percent: -0.53 },
];

pub fn find_featured(symbol: &str) -> Option<&'static FeaturedStock> {
    FEATURED_STOCKS.iter().find(|s| s.symbol.eq_ignore_ascii_case(symbol))
}

pub fn featured_symbols() -> Vec<String> {
    FEATURED_STOCKS.iter().map(|s| s.symbol.to_string()).collect()
}

/// Best performers first, at most 10.
pub fn top_gainers() -> Vec<FeaturedStock> {
    let mut gainers: Vec<FeaturedStock> = FEATURED_STOCKS.iter().copied().filter(|s| s.change > 0.0).collect();
    gainers.sort_by(|a, b| b.change_ratio().total_cmp(&a.change_ratio()));
    gainers.truncate(10);
    gainers
}

/// Worst performers first, at most 10.
pub fn top_losers() -> Vec<FeaturedStock> {
    let mut losers: Vec<FeaturedStock> = FEATURED_STOCKS.iter().copied().filter(|s| s.change < 0.0).collect();
    losers.sort_by(|a, b| a.change_ratio().total_cmp(&b.change_ratio()));
    losers.truncate(10);
    losers
}

/// NSE trading session: Monday to Friday, 09:15 to 15:30 IST inclusive.
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let Some(ist) = FixedOffset::east_opt(IST_OFFSET_SECS) else {
        return false;
    };
    let local = now.with_timezone(&ist);
    let minute = local.hour() * 60 + local.minute();

    !matches!(local.weekday(), Weekday::Sat | Weekday::Sun)
        && (MARKET_OPEN_MINUTE..=MARKET_CLOSE_MINUTE).contains(&minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_market_hours_in_ist() {
        // 2024-01-15 is a Monday. 03:45 UTC is 09:15 IST.
        assert!(is_market_open(utc(2024, 1, 15, 3, 45)));
        assert!(is_market_open(utc(2024, 1, 15, 10, 0)));
        assert!(!is_market_open(utc(2024, 1, 15, 10, 1)));
        assert!(!is_market_open(utc(2024, 1, 15, 3, 44)));
        // Saturday
        assert!(!is_market_open(utc(2024, 1, 20, 6, 0)));
    }

    #[test]
    fn test_gainers_and_losers_ordering() {
        let gainers = top_gainers();
        assert_eq!(gainers.len(), 6);
        assert!(gainers.windows(2).all(|w| w[0].change_ratio() >= w[1].change_ratio()));

        let losers = top_losers();
        assert_eq!(losers.iter().map(|s| s.symbol).collect::<Vec<_>>(), vec!["ICICIBANK", "HDFCBANK"]);
    }

    #[test]
    fn test_find_featured_is_case_insensitive() {
        assert_eq!(find_featured("tcs").unwrap().name, "Tata Consultancy Services");
        assert!(find_featured("ZOMATO").is_none());
    }
}

use lazy_static::lazy_static;

use crate::utils::TtlCache;

const SYMBOL_CACHE_KEY: &str = "nse_symbols";
const SYMBOL_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_PAGE_SIZE: usize = 50;

lazy_static! {
    static ref SYMBOL_CACHE: TtlCache<Vec<String>> = TtlCache::new(SYMBOL_CACHE_TTL_SECS);
}

/// NIFTY 50, NIFTY NEXT 50 and other actively traded NSE equities.
const NSE_SYMBOLS: &[&str] = &[
    // NIFTY 50
    "ADANIENT", "ADANIPORTS", "APOLLOHOSP", "ASIANPAINT", "AXISBANK",
    "BAJAJ-AUTO", "BAJFINANCE", "BAJAJFINSV", "BPCL", "BHARTIARTL",
    "BRITANNIA", "CIPLA", "COALINDIA", "DIVISLAB", "DRREDDY",
    "EICHERMOT", "GRASIM", "HCLTECH", "HDFCBANK", "HDFCLIFE",
    "HEROMOTOCO", "HINDALCO", "HINDUNILVR", "ICICIBANK", "ITC",
    "INDUSINDBK", "INFY", "JSWSTEEL", "KOTAKBANK", "LT",
    "M&M", "MARUTI", "NTPC", "NESTLEIND", "ONGC",
    "POWERGRID", "RELIANCE", "SBILIFE", "SBIN", "SUNPHARMA",
    "TCS", "TATACONSUM", "TATAMOTORS", "TATASTEEL", "TECHM",
    "TITAN", "UPL", "ULTRACEMCO", "WIPRO", "SHREECEM",
    // NIFTY NEXT 50
    "ACC", "AMBUJACEM", "BANDHANBNK", "BERGEPAINT", "BEL",
    "BOSCHLTD", "COLPAL", "DABUR", "DLF", "GODREJCP",
    "GAIL", "HAVELLS", "HDFCAMC", "ICICIGI", "ICICIPRULI",
    "IGL", "INDIGO", "JINDALSTEL", "MARICO", "MCDOWELL-N",
    "MOTHERSON", "NMDC", "NYKAA", "PAGEIND", "PIDILITIND",
    "PNB", "PGHH", "SBICARD", "SIEMENS", "SRF",
    "TATAPOWER", "TORNTPHARM", "TRENT", "VEDL", "ZOMATO",
    "ZYDUSLIFE", "ADANIGREEN", "ADANITRANS", "ATGL", "BAJAJHLDNG",
    "BANKBARODA", "BIOCON", "CANBK", "CHOLAFIN", "DMART",
    "GLAND", "HINDPETRO", "IDFCFIRSTB", "IOC", "IRCTC",
    // Large and mid caps
    "ABB", "ABCAPITAL", "ABFRL", "AFFLE", "AJANTPHARM",
    "ALKEM", "APOLLOTYRE", "ASHOKLEY", "ASTRAL", "ATUL",
    "AUBANK", "AUROPHARMA", "BALKRISIND", "BALRAMCHIN", "BATAINDIA",
    "BAYERCROP", "BHARATFORG", "BHEL", "BSOFT", "CANFINHOME",
    "CASTROLIND", "CEATLTD", "CESC", "CHAMBLFERT", "COFORGE",
    "CONCOR", "COROMANDEL", "CROMPTON", "CUB", "CUMMINSIND",
    "DEEPAKNTR", "DELTACORP", "DIXON", "ESCORTS", "EXIDEIND",
    "FEDERALBNK", "FORTIS", "GLENMARK", "GMRINFRA", "GNFC",
    "GODREJPROP", "GRANULES", "GUJGASLTD", "HAL", "HINDCOPPER",
    "HINDZINC", "HONAUT", "IDEA", "IEX", "INDHOTEL",
    "INDIACEM", "INDIAMART", "INDIANB", "INDUSTOWER", "IPCALAB",
    "JKCEMENT", "JSWENERGY", "JUBLFOOD", "KAJARIACER", "KEI",
    "L&TFH", "LALPATHLAB", "LAURUSLABS", "LICHSGFIN", "LTTS",
    "LUPIN", "M&MFIN", "MANAPPURAM", "MCX", "METROPOLIS",
    "MFSL", "MGL", "MPHASIS", "MRF", "MUTHOOTFIN",
    "NATIONALUM", "NAUKRI", "NAVINFLUOR", "OBEROIRLTY", "OFSS",
    "OIL", "PEL", "PERSISTENT", "PETRONET", "PFC",
    "PFIZER", "PHOENIXLTD", "PIIND", "POLYCAB", "PRESTIGE",
    "RAMCOCEM", "RBLBANK", "RECLTD", "SAIL", "SUNTV",
    "SYNGENE", "TATACHEM", "TATACOMM", "TATAELXSI", "TORNTPOWER",
    "TVSMOTOR", "UBL", "VOLTAS", "WHIRLPOOL", "YESBANK",
    "ZEEL", "CDSL", "CAMS", "ANGELONE", "IRFC",
];

/// Symbol list in listing order with repeats removed.
fn symbols() -> Vec<String> {
    if let Some(cached) = SYMBOL_CACHE.get(SYMBOL_CACHE_KEY) {
        return cached;
    }

    let mut seen = std::collections::HashSet::new();
    let list: Vec<String> = NSE_SYMBOLS
        .iter()
        .filter(|s| seen.insert(**s))
        .map(|s| s.to_string())
        .collect();

    log::debug!("📈 Loaded {} NSE symbols", list.len());
    SYMBOL_CACHE.set(SYMBOL_CACHE_KEY, list.clone());
    list
}

pub fn get_paginated_symbols(limit: usize, offset: usize) -> Vec<String> {
    symbols().into_iter().skip(offset).take(limit).collect()
}

pub fn total_count() -> usize {
    symbols().len()
}

/// Case-insensitive substring match on the symbol.
pub fn search_stocks(query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    symbols()
        .into_iter()
        .filter(|s| s.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_window() {
        let first = get_paginated_symbols(DEFAULT_PAGE_SIZE, 0);
        assert_eq!(first.len(), DEFAULT_PAGE_SIZE);
        assert_eq!(first[0], "ADANIENT");

        let second = get_paginated_symbols(5, 50);
        assert_eq!(second[0], "ACC");

        assert!(get_paginated_symbols(10, total_count()).is_empty());
    }

    #[test]
    fn test_list_has_no_duplicates() {
        let all = get_paginated_symbols(usize::MAX, 0);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(all.len(), total_count());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let hits = search_stocks("tata");
        assert!(hits.contains(&"TATASTEEL".to_string()));
        assert!(hits.contains(&"TATAMOTORS".to_string()));
        assert!(hits.iter().all(|s| s.contains("TATA")));
    }
}

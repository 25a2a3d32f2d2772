use serde_json::Value;
use std::fmt::Write;

use crate::services::web_search::SearchResult;

pub const PORTAL_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant for the Digital India Portal.";

pub const AI_UNAVAILABLE_MESSAGE: &str =
    "I apologize, but the AI service is temporarily unavailable. Please try again in a moment.";

const MAX_COMMODITIES: usize = 20;

const INTRO: &str = "You are a helpful AI assistant for the Digital India Portal. You help users with:
- Indian government services (Aadhaar, PAN, Passport, etc.)
- Stock market information (NSE stocks, real-time prices)
- Commodity market data (agricultural products, state-wise pricing)
- Location-based services and recommendations
- General queries about India

Be concise, helpful, and specific. Use the page context to provide relevant answers.";

const HONESTY_INSTRUCTIONS: &str = "CRITICAL INSTRUCTIONS FOR DATA HONESTY:

1. WEB SEARCH PRIORITY (MOST IMPORTANT):
   - If web search results are provided above, CHECK THEM FIRST
   - Web search results contain CURRENT information from the internet
   - Use web search to fill gaps in local OpenStreetMap data
   - Always cite the source: \"According to [source], ...\"
   - Combine local data (distance, address) with web search data (hours, reviews, accessibility)

2. OPENING HOURS:
   - FIRST: Check web search results for opening hours
   - SECOND: Check if context shows \"Opening Hours: [value] ✓ DATA AVAILABLE\" → STATE THE HOURS EXACTLY
   - THIRD: Check context.place.openingHours field
   - FOURTH: Check context.place.allTags.opening_hours as backup
   - If found anywhere, provide the hours with source
   - If not found anywhere, say \"Opening hours not available. Call to confirm.\"

3. WHEELCHAIR ACCESSIBILITY:
   - FIRST: Check web search results for accessibility information
   - SECOND: Check if wheelchair data shows \"yes/no/limited\" in context
   - If found, state it clearly with source
   - If not found anywhere, say \"Accessibility not specified. Call to confirm.\"

4. MISSING DATA HANDLING:
   - Be completely honest when data is not available ANYWHERE (local + web search)
   - ALWAYS check web search results before saying \"not available\"
   - ALWAYS check the provided context thoroughly before saying \"not available\"
   - If you see a field with actual data (not \"Not available\" or \"Unknown\"), USE IT
   - If data is truly missing everywhere, suggest calling the phone number

5. GENERAL:
   - When the user asks about what's on screen, list the VISIBLE items shown above
   - Reference specific stock symbols, commodity names, or services from the visible list
   - Be specific and use the actual data from the context
   - Provide helpful, actionable advice

Provide a helpful, concise answer (2-3 sentences max) based on the context above:";

/// Renders a context value the way a page would display it. Empty strings,
/// zero, false and null count as absent.
fn present(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn field(value: &Value, key: &str) -> Option<String> {
    present(&value[key])
}

fn items<'a>(context: &'a Value, key: &str) -> &'a [Value] {
    context[key].as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Prefixes the message with the place name and address when the page shows a place.
pub fn search_query_for(message: &str, context: Option<&Value>) -> String {
    let place = context.map(|c| &c["place"]).filter(|p| p.is_object());
    match place {
        Some(place) => format!(
            "{} {} {}",
            field(place, "name").unwrap_or_default(),
            field(place, "address").unwrap_or_default(),
            message
        ),
        None => message.to_string(),
    }
}

pub fn build_ai_query_prompt(message: &str, context: Option<&Value>, results: Option<&[SearchResult]>) -> String {
    let mut prompt = String::from(INTRO);

    if let Some(results) = results.filter(|r| !r.is_empty()) {
        prompt.push_str("\n\n🌐 WEB SEARCH RESULTS (Current Information from Internet):");
        for (idx, result) in results.iter().enumerate() {
            let _ = write!(prompt, "\n\n{}. {}", idx + 1, result.title);
            if !result.snippet.is_empty() {
                let _ = write!(prompt, "\n   {}", result.snippet);
            }
            if !result.url.is_empty() {
                let _ = write!(prompt, "\n   Source: {}", result.url);
            }
        }
        prompt.push_str(
            "\n\nIMPORTANT: Use the web search results above to provide current, accurate information. Cite sources when relevant.",
        );
    }

    if let Some(context) = context.filter(|c| c.is_object()) {
        write_context(&mut prompt, context);
    }

    let _ = write!(prompt, "\n\nUser Question: {}\n\n{}", message, HONESTY_INSTRUCTIONS);
    prompt
}

fn write_context(prompt: &mut String, context: &Value) {
    prompt.push_str("\n\nCurrent Page Context:");
    let _ = write!(prompt, "\n- Page: {}", field(context, "pageName").unwrap_or_else(|| "Unknown".into()));
    let _ = write!(prompt, "\n- Description: {}", field(context, "description").unwrap_or_else(|| "N/A".into()));

    let place = &context["place"];
    if place.is_object() {
        prompt.push_str("\n\n📍 PLACE INFORMATION:");
        for (label, key) in [("Name", "name"), ("Category", "category"), ("Address", "address"), ("Distance", "distance")] {
            let _ = write!(prompt, "\n- {}: {}", label, field(place, key).unwrap_or_else(|| "Unknown".into()));
        }
        for (label, key) in [("Hours", "openingHours"), ("Phone", "phone"), ("Wheelchair", "wheelchair"), ("Brand", "brand")] {
            if let Some(v) = field(place, key) {
                let _ = write!(prompt, "\n- {}: {}", label, v);
            }
        }
        if field(place, "website").is_some() {
            prompt.push_str("\n- Website: Available");
        }
    }

    let services = items(context, "visibleServices");
    if !services.is_empty() {
        let _ = write!(
            prompt,
            "\n\n📋 VISIBLE SERVICES ON SCREEN ({} services with COMPLETE DATA):",
            services.len()
        );
        for (idx, service) in services.iter().enumerate() {
            let _ = write!(prompt, "\n{}. {}", idx + 1, field(service, "name").unwrap_or_default());
            if let Some(v) = field(service, "description") {
                let _ = write!(prompt, " - {}", v);
            }
            for (label, key) in [("Fee", "fee"), ("Processing", "processingTime"), ("Category", "category")] {
                if let Some(v) = field(service, key) {
                    let _ = write!(prompt, " | {}: {}", label, v);
                }
            }
        }
    }

    let stocks = items(context, "visibleStocks");
    if !stocks.is_empty() {
        let _ = write!(
            prompt,
            "\n\n📈 VISIBLE STOCKS ON SCREEN ({} stocks with COMPLETE DATA):",
            stocks.len()
        );
        for (idx, stock) in stocks.iter().enumerate() {
            let _ = write!(prompt, "\n{}. {}", idx + 1, field(stock, "symbol").unwrap_or_default());
            if let Some(v) = field(stock, "name") {
                let _ = write!(prompt, " ({})", v);
            }
            if let Some(v) = field(stock, "exchange") {
                let _ = write!(prompt, " [{}", v);
            }
            if let Some(v) = field(stock, "sector") {
                let _ = write!(prompt, " - {}]", v);
            }
            if let Some(v) = field(stock, "currentPrice").or_else(|| field(stock, "price")) {
                let _ = write!(prompt, " - Price: {}", v);
            }
            for (label, key) in [
                ("Change", "change"),
                ("Volume", "volume"),
                ("High", "dayHigh"),
                ("Low", "dayLow"),
                ("Market Cap", "marketCap"),
                ("Status", "marketStatus"),
            ] {
                if let Some(v) = field(stock, key) {
                    let _ = write!(prompt, " | {}: {}", label, v);
                }
            }
        }
    }

    if let Some(selected) = field(context, "selectedStock") {
        let _ = write!(prompt, "\n\n🎯 SELECTED STOCK IN CHART: {}", selected);
    }

    let commodities = items(context, "visibleCommodities");
    if !commodities.is_empty() {
        let _ = write!(
            prompt,
            "\n\n🌾 VISIBLE COMMODITIES ON SCREEN ({} commodities with COMPLETE DATA):",
            commodities.len()
        );
        for (idx, commodity) in commodities.iter().take(MAX_COMMODITIES).enumerate() {
            let name = field(commodity, "commodity").or_else(|| field(commodity, "name")).unwrap_or_default();
            let _ = write!(prompt, "\n{}. {}", idx + 1, name);
            if let Some(v) = field(commodity, "location") {
                let _ = write!(prompt, " - {}", v);
            }
            if let Some(v) = field(commodity, "wholesalePrice") {
                let _ = write!(prompt, " | Wholesale: {}", v);
            }
            if let Some(v) = field(commodity, "retailPrice") {
                let _ = write!(prompt, " | Retail: {}", v);
            }
            if let Some(v) = field(commodity, "unit") {
                let _ = write!(prompt, " {}", v);
            }
            if let Some(v) = field(commodity, "source") {
                let _ = write!(prompt, " | Source: {}", v);
            }
        }
    }

    if let Some(v) = field(context, "searchQuery") {
        let _ = write!(prompt, "\n\n🔍 USER IS SEARCHING FOR: \"{}\"", v);
    }
    if let Some(v) = field(context, "categoryFilter") {
        let _ = write!(prompt, "\n📂 ACTIVE CATEGORY FILTER: {}", v);
    }
    if let Some(v) = field(context, "stateFilter") {
        let _ = write!(prompt, "\n📍 ACTIVE STATE FILTER: {}", v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_ai_query_prompt("What is PAN?", None, None);
        assert!(prompt.starts_with("You are a helpful AI assistant for the Digital India Portal."));
        assert!(prompt.contains("User Question: What is PAN?"));
        assert!(!prompt.contains("Current Page Context"));
        assert!(prompt.ends_with("based on the context above:"));
    }

    #[test]
    fn test_web_results_are_numbered_with_sources() {
        let results = vec![SearchResult {
            title: "Passport Seva".into(),
            snippet: "Apply online".into(),
            url: "https://passportindia.gov.in".into(),
            source: "Google".into(),
        }];
        let prompt = build_ai_query_prompt("passport", None, Some(&results));
        assert!(prompt.contains("🌐 WEB SEARCH RESULTS"));
        assert!(prompt.contains("1. Passport Seva\n   Apply online\n   Source: https://passportindia.gov.in"));
    }

    #[test]
    fn test_stock_context_serialized_verbatim() {
        let context = json!({
            "pageName": "Stocks",
            "visibleStocks": [
                { "symbol": "TCS", "name": "Tata Consultancy Services", "exchange": "NSE", "sector": "IT", "price": 3678.9, "volume": 1234567 }
            ],
            "selectedStock": "TCS"
        });
        let prompt = build_ai_query_prompt("How is TCS doing?", Some(&context), None);
        assert!(prompt.contains("- Page: Stocks"));
        assert!(prompt.contains("- Description: N/A"));
        assert!(prompt.contains("1. TCS (Tata Consultancy Services) [NSE - IT] - Price: 3678.9 | Volume: 1234567"));
        assert!(prompt.contains("🎯 SELECTED STOCK IN CHART: TCS"));
    }

    #[test]
    fn test_commodities_capped_at_twenty() {
        let commodities: Vec<Value> = (0..25)
            .map(|i| json!({ "commodity": format!("Item{}", i), "wholesalePrice": 100 + i }))
            .collect();
        let context = json!({ "visibleCommodities": commodities });
        let prompt = build_ai_query_prompt("prices?", Some(&context), None);
        assert!(prompt.contains("(25 commodities with COMPLETE DATA)"));
        assert!(prompt.contains("\n20. Item19"));
        assert!(!prompt.contains("Item20"));
    }

    #[test]
    fn test_search_query_uses_place() {
        let context = json!({ "place": { "name": "Passport Seva Kendra", "address": "Koramangala" } });
        assert_eq!(
            search_query_for("opening hours", Some(&context)),
            "Passport Seva Kendra Koramangala opening hours"
        );
        assert_eq!(search_query_for("opening hours", None), "opening hours");
    }
}

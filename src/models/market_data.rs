use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::object_id_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommodityCategory {
    Vegetables,
    Fruits,
    Grains,
    Pulses,
    Spices,
    Oils,
    Oilseeds,
    Dairy,
    Meat,
    #[default]
    #[serde(other)]
    Other,
}

impl CommodityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommodityCategory::Vegetables => "vegetables",
            CommodityCategory::Fruits => "fruits",
            CommodityCategory::Grains => "grains",
            CommodityCategory::Pulses => "pulses",
            CommodityCategory::Spices => "spices",
            CommodityCategory::Oils => "oils",
            CommodityCategory::Oilseeds => "oilseeds",
            CommodityCategory::Dairy => "dairy",
            CommodityCategory::Meat => "meat",
            CommodityCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Premium,
    #[default]
    Good,
    Average,
    BelowAverage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PriceRange {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Prices {
    #[serde(default)]
    pub wholesale: PriceRange,
    #[serde(default)]
    pub retail: PriceRange,
}

pub const UNITS: [&str; 6] = ["per kg", "per quintal", "per ton", "per piece", "per dozen", "per liter"];

/// Mandi price record for one commodity in one market.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", with = "object_id_hex")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub commodity: String,
    pub category: CommodityCategory,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl MarketData {
    pub const COLLECTION: &'static str = "market_data";
}

/// Admin create/update body.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataInput {
    pub commodity: Option<String>,
    pub category: Option<CommodityCategory>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub market: Option<String>,
    pub prices: Option<Prices>,
    pub unit: Option<String>,
    pub quality: Option<Quality>,
    pub trend: Option<Trend>,
    pub change_percent: Option<f64>,
    pub source: Option<String>,
    pub is_active: Option<bool>,
}

impl MarketDataInput {
    fn validated_unit(&self) -> Result<Option<String>, String> {
        match &self.unit {
            Some(unit) if !UNITS.contains(&unit.as_str()) => Err(format!("Invalid unit: {}", unit)),
            other => Ok(other.clone()),
        }
    }

    pub fn into_market_data(self) -> Result<MarketData, String> {
        let unit = self.validated_unit()?;
        let now = super::now_millis();
        Ok(MarketData {
            id: None,
            commodity: self
                .commodity
                .filter(|s| !s.trim().is_empty())
                .ok_or("commodity is required")?,
            category: self.category.ok_or("category is required")?,
            state: self.state.filter(|s| !s.trim().is_empty()).ok_or("state is required")?,
            district: self.district,
            market: self.market,
            prices: self.prices.unwrap_or_default(),
            unit: unit.unwrap_or_else(default_unit),
            quality: self.quality.unwrap_or_default(),
            trend: self.trend.unwrap_or_default(),
            change_percent: self.change_percent,
            last_updated: now,
            source: self.source.unwrap_or_else(default_source),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    /// `$set` document for an update. Always refreshes `lastUpdated`.
    pub fn to_set_document(&self) -> Result<mongodb::bson::Document, String> {
        use super::bson_value;
        use mongodb::bson::doc;

        let unit = self.validated_unit()?;
        let now = super::now_millis();
        let mut set = doc! { "lastUpdated": now, "updatedAt": now };

        if let Some(v) = &self.commodity { set.insert("commodity", v.as_str()); }
        if let Some(v) = &self.category { set.insert("category", v.as_str()); }
        if let Some(v) = &self.state { set.insert("state", v.as_str()); }
        if let Some(v) = &self.district { set.insert("district", v.as_str()); }
        if let Some(v) = &self.market { set.insert("market", v.as_str()); }
        if let Some(v) = &self.prices { set.insert("prices", bson_value(v, "prices")?); }
        if let Some(v) = unit { set.insert("unit", v); }
        if let Some(v) = &self.quality { set.insert("quality", bson_value(v, "quality")?); }
        if let Some(v) = &self.trend { set.insert("trend", bson_value(v, "trend")?); }
        if let Some(v) = self.change_percent { set.insert("changePercent", v); }
        if let Some(v) = &self.source { set.insert("source", v.as_str()); }
        if let Some(v) = self.is_active { set.insert("isActive", v); }

        Ok(set)
    }
}

fn default_unit() -> String {
    "per kg".to_string()
}

fn default_source() -> String {
    "Government Market Committee".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_maps_to_other() {
        let c: CommodityCategory = serde_json::from_str("\"flowers\"").unwrap();
        assert_eq!(c, CommodityCategory::Other);
    }

    #[test]
    fn test_input_rejects_invalid_unit() {
        let input = MarketDataInput {
            commodity: Some("Onion".into()),
            category: Some(CommodityCategory::Vegetables),
            state: Some("Maharashtra".into()),
            unit: Some("per bucket".into()),
            ..Default::default()
        };
        assert!(input.into_market_data().is_err());
    }

    #[test]
    fn test_update_always_touches_last_updated() {
        let set = MarketDataInput::default().to_set_document().unwrap();
        assert!(set.contains_key("lastUpdated"));
        assert_eq!(set.len(), 2);
    }
}

pub mod chat_session;
pub mod discussion;
pub mod feedback;
pub mod market_data;
pub mod news;
pub mod service;
pub mod user;

pub use chat_session::*;
pub use discussion::*;
pub use feedback::*;
pub use market_data::*;
pub use news::*;
pub use service::*;
pub use user::*;

use serde::Deserialize;

/// Current time as epoch milliseconds, the timestamp format stored in every collection.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Converts an embedded value for use inside an update document.
pub fn bson_value<T: serde::Serialize>(value: &T, field: &str) -> Result<mongodb::bson::Bson, String> {
    mongodb::bson::to_bson(value).map_err(|e| format!("Invalid {}: {}", field, e))
}

/// `?page=&limit=` query parameters shared by the list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit() as u64)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit() as u64)
    }
}

/// Serializes `_id` as a hex string in JSON responses while keeping the
/// native ObjectId representation when writing BSON.
pub mod object_id_hex {
    use mongodb::bson::oid::ObjectId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(oid) if serializer.is_human_readable() => serializer.serialize_str(&oid.to_hex()),
            Some(oid) => oid.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ObjectId>, D::Error> {
        Option::<ObjectId>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination { page: 0, limit: 500 };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), Pagination::MAX_LIMIT);
        assert_eq!(p.skip(), 0);

        let p = Pagination { page: 3, limit: 20 };
        assert_eq!(p.skip(), 40);
        assert_eq!(p.total_pages(41), 3);
        assert_eq!(p.total_pages(0), 0);
    }

    #[test]
    fn test_huge_page_saturates_skip() {
        let p: Pagination = serde_json::from_value(serde_json::json!({
            "page": u64::MAX,
            "limit": 20
        }))
        .unwrap();
        assert_eq!(p.skip(), u64::MAX);
    }

    #[test]
    fn test_object_id_serializes_as_hex_in_json() {
        let id = ObjectId::new();
        let service = Service {
            id: Some(id),
            ..Service::default()
        };
        let value = serde_json::to_value(&service).unwrap();
        assert_eq!(value["_id"], serde_json::Value::String(id.to_hex()));
    }
}

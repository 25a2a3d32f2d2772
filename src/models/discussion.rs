use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::object_id_hex;

/// Board categories shared by news and discussions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BoardCategory {
    Service,
    Market,
    Commodity,
    Ai,
    Admin,
    General,
}

impl BoardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardCategory::Service => "service",
            BoardCategory::Market => "market",
            BoardCategory::Commodity => "commodity",
            BoardCategory::Ai => "ai",
            BoardCategory::Admin => "admin",
            BoardCategory::General => "general",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "service" => Some(BoardCategory::Service),
            "market" => Some(BoardCategory::Market),
            "commodity" => Some(BoardCategory::Commodity),
            "ai" => Some(BoardCategory::Ai),
            "admin" => Some(BoardCategory::Admin),
            "general" => Some(BoardCategory::General),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", with = "object_id_hex")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", with = "object_id_hex")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub title: String,
    pub content: String,
    pub author: String,
    pub author_name: String,
    pub category: BoardCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub last_activity: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Discussion {
    pub const COLLECTION: &'static str = "discussions";
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateDiscussionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ContentRequest {
    pub content: Option<String>,
}

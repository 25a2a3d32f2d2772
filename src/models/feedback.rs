use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::object_id_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Support,
    Complaint,
    Suggestion,
    Compliment,
    BugReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Open => "open",
            FeedbackStatus::InProgress => "in_progress",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub timestamp: i64,
}

/// Citizen feedback on a service listing, triaged by admins.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFeedback {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", with = "object_id_hex")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub priority: FeedbackPriority,
    #[serde(default)]
    pub status: FeedbackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub responses: Vec<FeedbackResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl ServiceFeedback {
    pub const COLLECTION: &'static str = "service_feedback";
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub service_id: Option<String>,
    #[serde(rename = "type")]
    pub feedback_type: Option<FeedbackType>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub priority: Option<FeedbackPriority>,
    pub rating: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CreateFeedbackRequest {
    pub fn into_feedback(self, user_id: Option<String>) -> Result<ServiceFeedback, String> {
        let service_id = self.service_id.filter(|s| !s.trim().is_empty()).ok_or("serviceId is required")?;
        ObjectId::parse_str(&service_id).map_err(|_| "Invalid serviceId".to_string())?;

        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err("rating must be between 1 and 5".to_string());
            }
        }

        let now = super::now_millis();
        Ok(ServiceFeedback {
            id: None,
            service_id,
            user_id: if self.is_anonymous { None } else { user_id },
            feedback_type: self.feedback_type.ok_or("type is required")?,
            subject: self.subject.filter(|s| !s.trim().is_empty()).ok_or("subject is required")?,
            message: self.message.filter(|s| !s.trim().is_empty()).ok_or("message is required")?,
            priority: self.priority.unwrap_or_default(),
            status: FeedbackStatus::Open,
            assigned_to: None,
            responses: Vec::new(),
            rating: self.rating,
            tags: self.tags,
            is_anonymous: self.is_anonymous,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateFeedbackRequest {
    pub status: Option<FeedbackStatus>,
    pub response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateFeedbackRequest {
        CreateFeedbackRequest {
            service_id: Some(ObjectId::new().to_hex()),
            feedback_type: Some(FeedbackType::Complaint),
            subject: Some("Long queue".into()),
            message: Some("Waited three hours at the Aadhaar centre".into()),
            priority: None,
            rating: Some(2),
            tags: vec![],
            is_anonymous: false,
        }
    }

    #[test]
    fn test_new_feedback_is_open_with_medium_priority() {
        let fb = request().into_feedback(Some("u1".into())).unwrap();
        assert_eq!(fb.status, FeedbackStatus::Open);
        assert_eq!(fb.priority, FeedbackPriority::Medium);
        assert_eq!(fb.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_anonymous_feedback_drops_user() {
        let mut req = request();
        req.is_anonymous = true;
        let fb = req.into_feedback(Some("u1".into())).unwrap();
        assert!(fb.user_id.is_none());
    }

    #[test]
    fn test_rejects_bad_rating_and_missing_fields() {
        let mut req = request();
        req.rating = Some(9);
        assert!(req.into_feedback(None).is_err());

        let mut req = request();
        req.subject = None;
        assert_eq!(req.into_feedback(None).unwrap_err(), "subject is required");
    }

    #[test]
    fn test_type_field_name() {
        let fb = request().into_feedback(None).unwrap();
        let value = serde_json::to_value(&fb).unwrap();
        assert_eq!(value["type"], "complaint");
        assert_eq!(value["status"], "open");
    }
}

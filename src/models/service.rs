use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::object_id_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceCategory {
    #[default]
    Healthcare,
    Education,
    Employment,
    Housing,
    Legal,
    Transportation,
    SocialServices,
    Utilities,
    Emergency,
    IdentityDocuments,
    FinancialServices,
    DigitalServices,
    SocialWelfare,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 13] = [
        ServiceCategory::Healthcare,
        ServiceCategory::Education,
        ServiceCategory::Employment,
        ServiceCategory::Housing,
        ServiceCategory::Legal,
        ServiceCategory::Transportation,
        ServiceCategory::SocialServices,
        ServiceCategory::Utilities,
        ServiceCategory::Emergency,
        ServiceCategory::IdentityDocuments,
        ServiceCategory::FinancialServices,
        ServiceCategory::DigitalServices,
        ServiceCategory::SocialWelfare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Healthcare => "healthcare",
            ServiceCategory::Education => "education",
            ServiceCategory::Employment => "employment",
            ServiceCategory::Housing => "housing",
            ServiceCategory::Legal => "legal",
            ServiceCategory::Transportation => "transportation",
            ServiceCategory::SocialServices => "social-services",
            ServiceCategory::Utilities => "utilities",
            ServiceCategory::Emergency => "emergency",
            ServiceCategory::IdentityDocuments => "identity-documents",
            ServiceCategory::FinancialServices => "financial-services",
            ServiceCategory::DigitalServices => "digital-services",
            ServiceCategory::SocialWelfare => "social-welfare",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ServiceContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OpeningHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Accessibility {
    #[serde(default)]
    pub wheelchair_accessible: bool,
    #[serde(default)]
    pub sign_language: bool,
    #[serde(default)]
    pub braille: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Rating {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Fees {
    #[serde(default)]
    pub normal: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_true() -> bool {
    true
}

/// Government service listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", with = "object_id_hex")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub department: String,
    #[serde(default)]
    pub contact: ServiceContact,
    #[serde(default)]
    pub hours: OpeningHours,
    #[serde(default)]
    pub eligibility: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Fees>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_website: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Service {
    pub const COLLECTION: &'static str = "services";
}

/// Body for admin create/update. Every field is optional on update.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ServiceCategory>,
    pub department: Option<String>,
    pub contact: Option<ServiceContact>,
    pub hours: Option<OpeningHours>,
    pub eligibility: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub accessibility: Option<Accessibility>,
    pub tags: Option<Vec<String>>,
    pub fees: Option<Fees>,
    pub processing_time: Option<String>,
    pub official_website: Option<String>,
    pub is_active: Option<bool>,
}

impl ServiceInput {
    /// Builds a new service, failing on the first missing required field.
    pub fn into_service(self) -> Result<Service, String> {
        let now = super::now_millis();
        Ok(Service {
            id: None,
            name: self.name.filter(|s| !s.trim().is_empty()).ok_or("name is required")?,
            description: self
                .description
                .filter(|s| !s.trim().is_empty())
                .ok_or("description is required")?,
            category: self.category.ok_or("category is required")?,
            department: self
                .department
                .filter(|s| !s.trim().is_empty())
                .ok_or("department is required")?,
            contact: self.contact.unwrap_or_default(),
            hours: self.hours.unwrap_or_default(),
            eligibility: self.eligibility.unwrap_or_default(),
            requirements: self.requirements.unwrap_or_default(),
            languages: self.languages.unwrap_or_default(),
            accessibility: self.accessibility.unwrap_or_default(),
            rating: Rating::default(),
            tags: self.tags.unwrap_or_default(),
            fees: self.fees,
            processing_time: self.processing_time,
            official_website: self.official_website,
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    /// `$set` document containing only the provided fields.
    pub fn to_set_document(&self) -> Result<mongodb::bson::Document, String> {
        use super::bson_value;
        use mongodb::bson::doc;

        let mut set = doc! { "updatedAt": super::now_millis() };

        if let Some(v) = &self.name { set.insert("name", v.as_str()); }
        if let Some(v) = &self.description { set.insert("description", v.as_str()); }
        if let Some(v) = &self.category { set.insert("category", v.as_str()); }
        if let Some(v) = &self.department { set.insert("department", v.as_str()); }
        if let Some(v) = &self.contact { set.insert("contact", bson_value(v, "contact")?); }
        if let Some(v) = &self.hours { set.insert("hours", bson_value(v, "hours")?); }
        if let Some(v) = &self.eligibility { set.insert("eligibility", v.clone()); }
        if let Some(v) = &self.requirements { set.insert("requirements", v.clone()); }
        if let Some(v) = &self.languages { set.insert("languages", v.clone()); }
        if let Some(v) = &self.accessibility { set.insert("accessibility", bson_value(v, "accessibility")?); }
        if let Some(v) = &self.tags { set.insert("tags", v.clone()); }
        if let Some(v) = &self.fees { set.insert("fees", bson_value(v, "fees")?); }
        if let Some(v) = &self.processing_time { set.insert("processingTime", v.as_str()); }
        if let Some(v) = &self.official_website { set.insert("officialWebsite", v.as_str()); }
        if let Some(v) = self.is_active { set.insert("isActive", v); }

        Ok(set)
    }
}

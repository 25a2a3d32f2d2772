use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Guide,
    Article,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EducationResource {
    pub title: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub url: &'static str,
}

pub const EDUCATION_RESOURCES: [EducationResource; 2] = [
    EducationResource {
        title: "How to Apply for Public Benefits",
        description: "Step-by-step guide to applying for government assistance programs",
        resource_type: ResourceType::Guide,
        url: "/resources/benefits-guide",
    },
    EducationResource {
        title: "Understanding Your Rights",
        description: "Know your rights when accessing public services",
        resource_type: ResourceType::Article,
        url: "/resources/rights-guide",
    },
];

#[utoipa::path(
    get,
    path = "/api/resources/education",
    tag = "Resources",
    responses((status = 200, description = "Citizen guides and articles"))
)]
pub async fn education() -> HttpResponse {
    HttpResponse::Ok().json(EDUCATION_RESOURCES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_education_lists_guides() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let req = test::TestRequest::get().uri("/api/resources/education").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["type"], "guide");
    }
}

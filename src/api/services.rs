use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use serde_json::json;

use crate::api::{find_all, find_page, not_found, parse_object_id, server_error};
use crate::database::MongoDB;
use crate::models::{Pagination, Service};
use crate::utils::ci_regex;

const ACCESSIBILITY_FIELDS: [&str; 3] = ["wheelchairAccessible", "signLanguage", "braille"];

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ServiceFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub language: Option<String>,
    /// Comma-separated accessibility flags, e.g. `wheelchairAccessible,braille`.
    pub accessibility: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn add_location(filter: &mut Document, city: Option<&str>, state: Option<&str>) {
    if let Some(city) = city {
        filter.insert("contact.address.city", ci_regex(city));
    }
    if let Some(state) = state {
        filter.insert("contact.address.state", ci_regex(state));
    }
}

pub fn build_services_filter(filters: &ServiceFilters) -> Document {
    let mut filter = doc! { "isActive": true };

    if let Some(category) = non_empty(&filters.category) {
        filter.insert("category", category);
    }
    add_location(&mut filter, non_empty(&filters.city), non_empty(&filters.state));
    if let Some(language) = non_empty(&filters.language) {
        filter.insert("languages", language);
    }
    if let Some(features) = non_empty(&filters.accessibility) {
        for feature in features.split(',').map(str::trim) {
            if ACCESSIBILITY_FIELDS.contains(&feature) {
                filter.insert(format!("accessibility.{}", feature), true);
            }
        }
    }
    if let Some(search) = non_empty(&filters.search) {
        filter.insert("$text", doc! { "$search": search });
    }

    filter
}

fn text_score_sort(searching: bool) -> Document {
    if searching {
        doc! { "score": { "$meta": "textScore" } }
    } else {
        doc! { "name": 1 }
    }
}

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Services",
    params(ServiceFilters, ("page" = Option<u64>, Query,), ("limit" = Option<i64>, Query,)),
    responses((status = 200, description = "Paginated active services"))
)]
pub async fn list_services(
    db: web::Data<MongoDB>,
    filters: web::Query<ServiceFilters>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    let filter = build_services_filter(&filters);
    let sort = text_score_sort(non_empty(&filters.search).is_some());
    let collection = db.collection::<Service>(Service::COLLECTION);

    match find_page(&collection, filter, sort, &pagination).await {
        Ok((services, total)) => HttpResponse::Ok().json(json!({
            "services": services,
            "totalPages": pagination.total_pages(total),
            "currentPage": pagination.page(),
            "total": total
        })),
        Err(e) => server_error("Error fetching services", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    tag = "Services",
    responses(
        (status = 200, description = "Service", body = Service),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service(db: web::Data<MongoDB>, id: web::Path<String>) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };

    match db.collection::<Service>(Service::COLLECTION).find_one(doc! { "_id": oid }).await {
        Ok(Some(service)) => HttpResponse::Ok().json(service),
        Ok(None) => not_found("Service not found"),
        Err(e) => server_error("Error fetching service", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub state: Option<String>,
}

pub async fn get_by_category(
    db: web::Data<MongoDB>,
    category: web::Path<String>,
    location: web::Query<LocationQuery>,
) -> HttpResponse {
    let mut filter = doc! { "category": category.as_str(), "isActive": true };
    add_location(&mut filter, non_empty(&location.city), non_empty(&location.state));

    match find_all(&db.collection::<Service>(Service::COLLECTION), filter, doc! { "name": 1 }, None).await {
        Ok(services) => HttpResponse::Ok().json(services),
        Err(e) => server_error("Error fetching services by category", e),
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SearchLocation {
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub location: Option<SearchLocation>,
}

#[derive(Debug, Default)]
pub struct GroupedResults {
    pub exact: Vec<Service>,
    pub related: Vec<Service>,
    pub suggested: Vec<Service>,
}

/// Name hits are exact, description hits are related, everything else is suggested.
pub fn group_results(query: Option<&str>, services: Vec<Service>) -> GroupedResults {
    let needle = query.map(str::to_lowercase);
    let mut grouped = GroupedResults::default();

    for service in services {
        match &needle {
            Some(q) if service.name.to_lowercase().contains(q) => grouped.exact.push(service),
            Some(q) if service.description.to_lowercase().contains(q) => grouped.related.push(service),
            _ => grouped.suggested.push(service),
        }
    }
    grouped
}

/// First 5 distinct categories and first 10 distinct tags, in result order.
pub fn search_suggestions(services: &[Service]) -> (Vec<&'static str>, Vec<String>) {
    let mut categories: Vec<&'static str> = Vec::new();
    let mut tags: Vec<String> = Vec::new();

    for service in services {
        let category = service.category.as_str();
        if !categories.contains(&category) {
            categories.push(category);
        }
        for tag in &service.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }

    categories.truncate(5);
    tags.truncate(10);
    (categories, tags)
}

#[utoipa::path(
    post,
    path = "/api/services/search",
    tag = "Services",
    request_body = SearchRequest,
    responses((status = 200, description = "Grouped search results"))
)]
pub async fn search_services(db: web::Data<MongoDB>, request: web::Json<SearchRequest>) -> HttpResponse {
    let query = non_empty(&request.query);

    let mut filter = doc! { "isActive": true };
    if let Some(q) = query {
        filter.insert("$text", doc! { "$search": q });
    }
    if let Some(location) = &request.location {
        add_location(&mut filter, non_empty(&location.city), non_empty(&location.state));
    }

    let services = match find_all(
        &db.collection::<Service>(Service::COLLECTION),
        filter,
        text_score_sort(query.is_some()),
        None,
    )
    .await
    {
        Ok(services) => services,
        Err(e) => return server_error("Error searching services", e),
    };

    let total = services.len();
    let (categories, related_terms) = search_suggestions(&services);
    let grouped = group_results(query, services);

    HttpResponse::Ok().json(json!({
        "results": {
            "exact": grouped.exact,
            "related": grouped.related,
            "suggested": grouped.suggested
        },
        "total": total,
        "suggestions": {
            "categories": categories,
            "relatedTerms": related_terms
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceCategory;

    fn service(name: &str, description: &str, category: ServiceCategory, tags: &[&str]) -> Service {
        Service {
            name: name.into(),
            description: description.into(),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Service::default()
        }
    }

    #[test]
    fn test_category_filter_is_exact_and_active_only() {
        let filters = ServiceFilters {
            category: Some("healthcare".into()),
            ..Default::default()
        };
        let filter = build_services_filter(&filters);
        assert_eq!(filter.get_str("category").unwrap(), "healthcare");
        assert_eq!(filter.get_bool("isActive").unwrap(), true);
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_accessibility_and_location_filters() {
        let filters = ServiceFilters {
            city: Some("Pune".into()),
            accessibility: Some("wheelchairAccessible, braille,$where".into()),
            search: Some("passport".into()),
            ..Default::default()
        };
        let filter = build_services_filter(&filters);
        assert!(filter.get_bool("accessibility.wheelchairAccessible").unwrap());
        assert!(filter.get_bool("accessibility.braille").unwrap());
        assert!(!filter.contains_key("accessibility.$where"));
        assert_eq!(
            filter.get_document("contact.address.city").unwrap().get_str("$regex").unwrap(),
            "Pune"
        );
        assert_eq!(filter.get_document("$text").unwrap().get_str("$search").unwrap(), "passport");
    }

    #[test]
    fn test_group_results_and_suggestions() {
        let services = vec![
            service("Passport Seva", "Apply for passport", ServiceCategory::IdentityDocuments, &["passport", "travel"]),
            service("DigiLocker", "Store passport and other documents", ServiceCategory::DigitalServices, &["documents"]),
            service("EPFO", "Provident fund", ServiceCategory::FinancialServices, &["pf", "travel"]),
        ];

        let (categories, tags) = search_suggestions(&services);
        assert_eq!(categories, vec!["identity-documents", "digital-services", "financial-services"]);
        assert_eq!(tags, vec!["passport", "travel", "documents", "pf"]);

        let grouped = group_results(Some("Passport"), services);
        assert_eq!(grouped.exact.len(), 1);
        assert_eq!(grouped.related[0].name, "DigiLocker");
        assert_eq!(grouped.suggested[0].name, "EPFO");
    }
}

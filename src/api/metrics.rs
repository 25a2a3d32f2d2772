use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static AI_REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static AI_FAILURE_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_ai_request_count() {
    AI_REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Counts transient provider failures. Missing keys are not counted.
pub fn increment_ai_failure_count() {
    AI_FAILURE_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub ai_requests_total: u64,
    pub ai_provider_failures_total: u64,
}

pub fn render() -> String {
    format!(
        "# HELP http_requests_total Total number of HTTP requests\n\
         # TYPE http_requests_total counter\n\
         http_requests_total {}\n\
         \n\
         # HELP ai_requests_total Total number of AI completion requests\n\
         # TYPE ai_requests_total counter\n\
         ai_requests_total {}\n\
         \n\
         # HELP ai_provider_failures_total Total number of failed AI provider calls\n\
         # TYPE ai_provider_failures_total counter\n\
         ai_provider_failures_total {}\n",
        REQUEST_COUNT.load(Ordering::Relaxed),
        AI_REQUEST_COUNT.load(Ordering::Relaxed),
        AI_FAILURE_COUNT.load(Ordering::Relaxed),
    )
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", body = MetricsResponse)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        increment_ai_request_count();
        let text = render();
        assert!(text.contains("# TYPE ai_requests_total counter"));
        assert!(text.contains("http_requests_total "));
        assert!(text.contains("ai_provider_failures_total "));
        assert!(AI_REQUEST_COUNT.load(Ordering::Relaxed) >= 1);
    }
}

use actix_web::{web, HttpResponse, Responder};

use crate::core::error::StoreError;
use crate::web::models::HealthResponse;
use crate::web::server::AppState;

/// Liveness check
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus text exposition
pub async fn metrics(data: web::Data<AppState>) -> Result<HttpResponse, StoreError> {
    let body = data.metrics.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::server::testing::{test_app, TestContext};
    use actix_web::test;

    #[actix_web::test]
    async fn test_health() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn test_metrics_endpoint() {
        let ctx = TestContext::new();
        ctx.state.metrics.orders_created.inc();
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("storefront_orders_created_total 1"));
    }
}

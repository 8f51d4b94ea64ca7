use actix_web::{web, HttpResponse};
use log::{info, warn};

use crate::core::error::StoreError;
use crate::core::order::{OrderRequest, OrderStatus};
use crate::storage::attachments::{store_uploads, RejectedUpload, UploadRequest};
use crate::web::models::{AttachmentUploadResponse, OrderCreatedResponse};
use crate::web::server::AppState;

/// Order intake from the public order form
pub async fn create_order(
    data: web::Data<AppState>,
    body: web::Json<OrderRequest>,
) -> Result<HttpResponse, StoreError> {
    let request = body.into_inner();

    let service = match data.store.get_service(request.service_id).await {
        Ok(found) => found.service,
        Err(StoreError::NotFound(_)) => {
            return Err(StoreError::validation("Selected service does not exist"))
        }
        Err(e) => return Err(e),
    };

    let order = data.store.create_order(request.validate(&service)?).await?;
    data.metrics.orders_created.inc();

    Ok(HttpResponse::Created().json(OrderCreatedResponse {
        success: true,
        id: order.id,
        order_id: order.order_id,
    }))
}

/// Attach files to a freshly created order
pub async fn upload_attachments(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UploadRequest>,
) -> Result<HttpResponse, StoreError> {
    let order = data.store.get_order_by_reference(&path.into_inner()).await?;
    if order.status != OrderStatus::Received {
        return Err(StoreError::validation(
            "Attachments can only be added to new orders",
        ));
    }

    let mut outcome = store_uploads(
        data.attachments.as_ref(),
        &data.policy,
        &order.order_id,
        order.attachment_files.len(),
        body.into_inner().files,
    )
    .await;

    if !outcome.stored.is_empty() {
        let (_, overflow) = data
            .store
            .add_attachments(order.id, &outcome.stored, data.policy.max_files)
            .await?;

        // A concurrent upload filled the order first
        for file in overflow {
            if let Err(e) = data.attachments.remove(&file).await {
                warn!("Failed to remove unattached file {}: {}", file.url, e);
            }
            outcome.stored.retain(|stored| stored.url != file.url);
            outcome.rejected.push(RejectedUpload {
                name: file.name,
                reason: format!("At most {} files per order", data.policy.max_files),
            });
        }
        info!("Stored {} attachment(s) for {}", outcome.stored.len(), order.order_id);
    }

    for rejected in &outcome.rejected {
        warn!(
            "Rejected attachment {} for {}: {}",
            rejected.name, order.order_id, rejected.reason
        );
    }
    data.metrics.attachments_rejected.inc_by(outcome.rejected.len() as u64);
    data.metrics.attachments_stored.inc_by(outcome.stored.len() as u64);

    Ok(HttpResponse::Ok().json(AttachmentUploadResponse {
        success: outcome.rejected.is_empty(),
        stored: outcome.stored,
        rejected: outcome.rejected,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::server::testing::{test_app, TestContext};
    use actix_web::test;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};

    async fn first_service(ctx: &TestContext) -> i64 {
        ctx.state.store.list_services(true, Some("websites")).await.unwrap()[0]
            .service
            .id
    }

    #[actix_web::test]
    async fn test_create_order() {
        let ctx = TestContext::new();
        let service_id = first_service(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customerName": "Asha Verma",
                "customerPhone": "+91 98765 43210",
                "serviceId": service_id,
                "requirements": "Five page site with a contact form",
                "budgetRange": "5k-10k",
                "language": "hi"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: OrderCreatedResponse = test::read_body_json(resp).await;
        assert!(body.success);
        assert!(body.order_id.starts_with("TAL-"));

        let order = ctx.state.store.get_order(body.id).await.unwrap();
        assert_eq!(order.customer_whatsapp.as_deref(), Some("+91 98765 43210"));
        assert_eq!(order.status, OrderStatus::Received);
        assert_eq!(ctx.state.metrics.orders_created.get(), 1);
    }

    #[actix_web::test]
    async fn test_invalid_orders_rejected() {
        let ctx = TestContext::new();
        let service_id = first_service(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Asha",
                "customer_phone": "98765",
                "service_id": service_id,
                "requirements": "x"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "VALIDATION_FAILED");

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Asha",
                "customer_phone": "9876543210",
                "service_id": 9999,
                "requirements": "x"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error_code"], "VALIDATION_FAILED");
    }

    #[actix_web::test]
    async fn test_upload_attachments() {
        let ctx = TestContext::new();
        let service_id = first_service(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Asha",
                "customer_phone": "9876543210",
                "service_id": service_id,
                "requirements": "Logo attached"
            }))
            .to_request();
        let created: OrderCreatedResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/attachments", created.order_id))
            .set_json(json!({
                "files": [
                    {"name": "logo.png", "type": "image/png", "data": STANDARD.encode(b"png-bytes")},
                    {"name": "setup.exe", "type": "application/x-msdownload", "data": STANDARD.encode(b"mz")}
                ]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["stored"].as_array().unwrap().len(), 1);
        assert_eq!(body["rejected"][0]["name"], "setup.exe");

        let order = ctx.state.store.get_order(created.id).await.unwrap();
        assert_eq!(order.attachment_files.len(), 1);
        assert_eq!(order.attachment_files[0].name, "logo.png");
        assert!(ctx.upload_dir.path().join("order-attachments").is_dir());

        let req = test::TestRequest::post()
            .uri("/api/orders/TAL-19990101-0001/attachments")
            .set_json(json!({ "files": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_concurrent_uploads_respect_file_limit() {
        let ctx = TestContext::new();
        let service_id = first_service(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Asha",
                "customer_phone": "9876543210",
                "service_id": service_id,
                "requirements": "Screens attached"
            }))
            .to_request();
        let created: OrderCreatedResponse = test::call_and_read_body_json(&app, req).await;

        let batch = |prefix: &str| {
            let files: Vec<Value> = (0..3)
                .map(|i| {
                    json!({
                        "name": format!("{}-{}.png", prefix, i),
                        "type": "image/png",
                        "data": STANDARD.encode(b"png-bytes"),
                    })
                })
                .collect();
            test::TestRequest::post()
                .uri(&format!("/api/orders/{}/attachments", created.order_id))
                .set_json(json!({ "files": files }))
                .to_request()
        };

        let (first, second) = tokio::join!(
            test::call_service(&app, batch("a")),
            test::call_service(&app, batch("b"))
        );
        assert_eq!(first.status(), 200);
        assert_eq!(second.status(), 200);
        let first: Value = test::read_body_json(first).await;
        let second: Value = test::read_body_json(second).await;

        let count = |body: &Value, key: &str| body[key].as_array().map_or(0, Vec::len);
        assert_eq!(count(&first, "stored") + count(&second, "stored"), 5);
        assert_eq!(count(&first, "rejected") + count(&second, "rejected"), 1);

        let order = ctx.state.store.get_order(created.id).await.unwrap();
        assert_eq!(order.attachment_files.len(), 5);
        let on_disk = std::fs::read_dir(ctx.upload_dir.path().join("order-attachments"))
            .unwrap()
            .count();
        assert_eq!(on_disk, 5);
    }
}

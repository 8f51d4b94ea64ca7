use actix_web::{web, HttpResponse};

use crate::auth::AdminGuard;
use crate::core::catalog::{CategoryInput, ServiceInput};
use crate::core::error::StoreError;
use crate::web::models::GenericResponse;
use crate::web::server::AppState;

pub async fn list_categories(
    _admin: AdminGuard,
    data: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    Ok(HttpResponse::Ok().json(data.store.list_categories().await?))
}

pub async fn create_category(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    body: web::Json<CategoryInput>,
) -> Result<HttpResponse, StoreError> {
    let category = data.store.create_category(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CategoryInput>,
) -> Result<HttpResponse, StoreError> {
    let category = data
        .store
        .update_category(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

pub async fn get_category(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, StoreError> {
    Ok(HttpResponse::Ok().json(data.store.get_category(path.into_inner()).await?))
}

/// Refused while services still belong to the category
pub async fn delete_category(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, StoreError> {
    data.store.delete_category(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Category deleted")))
}

/// Every service, active or not, with its category
pub async fn list_services(
    _admin: AdminGuard,
    data: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    Ok(HttpResponse::Ok().json(data.store.list_services(false, None).await?))
}

pub async fn create_service(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    body: web::Json<ServiceInput>,
) -> Result<HttpResponse, StoreError> {
    let service = data.store.create_service(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(service))
}

pub async fn update_service(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ServiceInput>,
) -> Result<HttpResponse, StoreError> {
    let service = data
        .store
        .update_service(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(service))
}

pub async fn delete_service(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, StoreError> {
    data.store.delete_service(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Service deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::server::testing::{test_app, TestContext};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_admin_routes_need_session() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/admin/categories").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/admin/categories")
            .insert_header(("Authorization", ctx.admin_bearer()))
            .to_request();
        let categories: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(categories.len(), 4);

        let req = test::TestRequest::get()
            .uri(&format!("/api/admin/categories/{}", categories[0]["id"]))
            .insert_header(("Authorization", ctx.admin_bearer()))
            .to_request();
        let category: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(category["slug"], categories[0]["slug"]);
    }

    #[actix_web::test]
    async fn test_category_lifecycle() {
        let ctx = TestContext::new();
        let auth = ctx.admin_bearer();
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({ "name_en": "Video", "name_hi": "वीडियो", "slug": "video" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_i64().unwrap();

        // Duplicate slug
        let req = test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({ "name_en": "Video 2", "name_hi": "वीडियो", "slug": "video" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);

        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({
                "name_en": "Reel Editing",
                "name_hi": "रील एडिटिंग",
                "price": 1499.0,
                "delivery_time": 2,
                "features_en": "3 Reels\nCaptions",
                "category_id": id
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let service: Value = test::read_body_json(resp).await;
        assert_eq!(service["is_active"], true);

        // In use
        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/categories/{}", id))
            .insert_header(("Authorization", auth.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/services/{}", service["id"]))
            .insert_header(("Authorization", auth.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/categories/{}", id))
            .insert_header(("Authorization", auth))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn test_service_with_unknown_category_rejected() {
        let ctx = TestContext::new();
        let auth = ctx.admin_bearer();
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({
                "name_en": "Ghost",
                "name_hi": "घोस्ट",
                "price": 10.0,
                "delivery_time": 1,
                "category_id": 999
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::get()
            .uri("/api/admin/services")
            .insert_header(("Authorization", auth))
            .to_request();
        let services: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(services.len(), 20);
        assert!(services[0]["category_name"].is_string());
    }
}

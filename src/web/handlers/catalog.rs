use actix_web::{web, HttpResponse};

use crate::core::catalog::{Language, LocalizedService};
use crate::core::error::StoreError;
use crate::core::order::{BUDGET_OPTIONS, DELIVERY_OPTIONS};
use crate::core::whatsapp;
use crate::web::models::{
    ContactQuery, LangQuery, LocalizedOption, OptionsResponse, ServicesQuery, WhatsAppLinkResponse,
};
use crate::web::server::AppState;

/// All categories
pub async fn list_categories(data: web::Data<AppState>) -> Result<HttpResponse, StoreError> {
    let categories = data.store.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// Active services in one language, optionally for one category
pub async fn list_services(
    data: web::Data<AppState>,
    query: web::Query<ServicesQuery>,
) -> Result<HttpResponse, StoreError> {
    let lang = Language::from_code(query.lang.as_deref());
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "all");

    let services: Vec<LocalizedService> = data
        .store
        .list_services(true, category)
        .await?
        .iter()
        .map(|s| s.service.localize(lang, &s.category_slug))
        .collect();

    Ok(HttpResponse::Ok().json(services))
}

/// One active service
pub async fn get_service(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<LangQuery>,
) -> Result<HttpResponse, StoreError> {
    let found = data.store.get_service(path.into_inner()).await?;
    if !found.service.is_active {
        return Err(StoreError::not_found("Service"));
    }
    Ok(HttpResponse::Ok().json(found.service.localize(query.language(), &found.category_slug)))
}

/// Budget and delivery option lists for the order form
pub async fn get_options(query: web::Query<LangQuery>) -> HttpResponse {
    let lang = query.language();
    HttpResponse::Ok().json(OptionsResponse {
        budget_ranges: LocalizedOption::list(&BUDGET_OPTIONS, lang),
        delivery_preferences: LocalizedOption::list(&DELIVERY_OPTIONS, lang),
    })
}

/// Deep-link to the business WhatsApp number, either a general inquiry or an
/// order request for one service
pub async fn whatsapp_contact(
    data: web::Data<AppState>,
    query: web::Query<ContactQuery>,
) -> Result<HttpResponse, StoreError> {
    let lang = Language::from_code(query.lang.as_deref());

    let (kind, message) = match query.service_id {
        Some(id) => {
            let found = data.store.get_service(id).await?;
            if !found.service.is_active {
                return Err(StoreError::not_found("Service"));
            }
            let message = whatsapp::service_order_message(
                lang,
                found.service.name(lang),
                found.service.price,
            );
            ("service_order", message)
        }
        None => ("inquiry", whatsapp::inquiry_message(lang)),
    };

    let url = whatsapp::deep_link(&data.config.whatsapp_number, &message)?;
    data.metrics.whatsapp_link(kind);

    Ok(HttpResponse::Ok().json(WhatsAppLinkResponse { url, message }))
}

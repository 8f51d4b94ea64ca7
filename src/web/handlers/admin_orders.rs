use actix_web::{http::header, web, HttpResponse};
use chrono::Utc;
use log::info;

use crate::auth::AdminGuard;
use crate::core::catalog::normalize_optional;
use crate::core::error::StoreError;
use crate::core::export::{export_filename, orders_to_csv};
use crate::core::filter::{OrderFilter, OrderFilterQuery};
use crate::core::order::{OrderStatus, Priority};
use crate::core::whatsapp::{deep_link, order_message};
use crate::web::models::{
    ExportQuery, GenericResponse, NotesUpdateRequest, PriorityUpdateRequest, StatusUpdateRequest,
    WhatsAppLinkResponse, WhatsAppMessageRequest,
};
use crate::web::server::AppState;

/// Counters and recent orders
pub async fn dashboard(
    _admin: AdminGuard,
    data: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    Ok(HttpResponse::Ok().json(data.store.dashboard().await?))
}

/// Orders matching the search/status/priority filter, newest first
pub async fn list_orders(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    query: web::Query<OrderFilterQuery>,
) -> Result<HttpResponse, StoreError> {
    let filter = OrderFilter::from_query(&query)?;
    let orders = data.store.list_orders().await?;
    Ok(HttpResponse::Ok().json(filter.apply(orders)))
}

/// CSV download of the filtered orders, or of every order with `all=true`
pub async fn export_orders(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, StoreError> {
    let all = query.export_all();
    let mut orders = data.store.list_orders().await?;
    if !all {
        orders = OrderFilter::from_query(&query.filter())?.apply(orders).orders;
    }

    let csv = orders_to_csv(&orders)?;
    let filename = export_filename(all, Utc::now().date_naive());
    info!("Exporting {} order(s) as {}", orders.len(), filename);

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(csv))
}

pub async fn get_order(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, StoreError> {
    Ok(HttpResponse::Ok().json(data.store.get_order(path.into_inner()).await?))
}

pub async fn update_status(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, StoreError> {
    let status: OrderStatus = body.status.parse()?;
    let order = data.store.set_order_status(path.into_inner(), status).await?;
    data.metrics.status_changed(status);
    Ok(HttpResponse::Ok().json(order))
}

pub async fn update_priority(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<PriorityUpdateRequest>,
) -> Result<HttpResponse, StoreError> {
    let priority: Priority = body.priority.parse()?;
    let order = data.store.set_order_priority(path.into_inner(), priority).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn update_notes(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<NotesUpdateRequest>,
) -> Result<HttpResponse, StoreError> {
    let notes = normalize_optional(body.into_inner().admin_notes);
    let order = data.store.set_admin_notes(path.into_inner(), notes).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Build the customer message link and flag the order as messaged
pub async fn whatsapp_message(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<WhatsAppMessageRequest>,
) -> Result<HttpResponse, StoreError> {
    let id = path.into_inner();
    let order = data.store.get_order(id).await?;

    let message = order_message(&order, body.kind);
    let url = deep_link(order.contact_number(), &message)?;
    data.store.mark_whatsapp_sent(id).await?;
    data.metrics.order_message(body.kind);

    Ok(HttpResponse::Ok().json(WhatsAppLinkResponse { url, message }))
}

pub async fn delete_order(
    _admin: AdminGuard,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, StoreError> {
    data.store.delete_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Order deleted")))
}

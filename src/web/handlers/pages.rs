use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use log::{error, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{request_token, SessionStore};
use crate::core::catalog::{Language, ServiceWithCategory};
use crate::core::error::StoreError;
use crate::core::filter::{OrderFilter, OrderFilterQuery};
use crate::core::i18n::{page_strings, translate};
use crate::core::order::{Order, OrderStatus, Priority, BUDGET_OPTIONS, DELIVERY_OPTIONS};
use crate::core::whatsapp;
use crate::web::models::{LangQuery, LocalizedOption};
use crate::web::server::AppState;

/// Home page query
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub lang: Option<String>,
    pub category: Option<String>,
}

fn render(data: &AppState, status: StatusCode, template: &str, context: &Value) -> HttpResponse {
    match data.templates.render(template, context) {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            error!("Template rendering error: {}", e);
            HttpResponse::InternalServerError().body(format!("Template error: {}", e))
        }
    }
}

/// Context shared by every public page: strings, language toggle and the
/// header WhatsApp link
fn page_context(data: &AppState, lang: Language, title: &str) -> Value {
    let inquiry = whatsapp::deep_link(&data.config.whatsapp_number, &whatsapp::inquiry_message(lang))
        .unwrap_or_else(|e| {
            warn!("No WhatsApp link for the header: {}", e);
            String::new()
        });

    json!({
        "title": title,
        "lang": lang.code(),
        "other_lang": lang.toggled().code(),
        "t": page_strings(lang),
        "whatsapp_url": inquiry,
    })
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Value::Object(base), Value::Object(extra)) = (&mut base, extra) {
        base.extend(extra);
    }
    base
}

fn service_card(data: &AppState, lang: Language, entry: &ServiceWithCategory) -> Value {
    let service = &entry.service;
    let localized = service.localize(lang, &entry.category_slug);
    let message = whatsapp::service_order_message(lang, &localized.name, service.price);
    let whatsapp_url = whatsapp::deep_link(&data.config.whatsapp_number, &message).unwrap_or_default();

    json!({
        "id": localized.id,
        "name": localized.name,
        "short_description": localized.short_description,
        "description": localized.description,
        "features": localized.features,
        "price": service.price.to_string(),
        "delivery_days": localized.delivery_days,
        "image_url": localized.image_url,
        "whatsapp_url": whatsapp_url,
        "order_url": format!("/order/{}?lang={}", localized.id, lang.code()),
    })
}

/// Serve the home page
pub async fn index(data: web::Data<AppState>, query: web::Query<HomeQuery>) -> Result<HttpResponse, StoreError> {
    let lang = Language::from_code(query.lang.as_deref());
    let categories = data.store.list_categories().await?;

    // Only a known slug is echoed back into links
    let selected = query
        .category
        .as_deref()
        .map(str::trim)
        .and_then(|slug| categories.iter().find(|c| c.slug == slug))
        .map(|c| c.slug.as_str());

    let all_services = data.store.list_services(true, None).await?;
    let shown: Vec<Value> = all_services
        .iter()
        .filter(|s| selected.map_or(true, |slug| s.category_slug == slug))
        .map(|s| service_card(&data, lang, s))
        .collect();

    let prices = all_services.iter().map(|s| s.service.price);
    let days = all_services.iter().map(|s| s.service.delivery_time);
    let starting_price = prices.fold(f64::INFINITY, f64::min);

    let category_links: Vec<Value> = categories
        .iter()
        .map(|c| {
            json!({
                "name": c.name(lang),
                "url": format!("/?lang={}&category={}", lang.code(), c.slug),
                "selected": selected == Some(c.slug.as_str()),
            })
        })
        .collect();

    let context = merge(
        page_context(&data, lang, "Taliyo Technologies"),
        json!({
            "categories": category_links,
            "all_url": format!("/?lang={}", lang.code()),
            "all_selected": selected.is_none(),
            "toggle_url": match selected {
                Some(slug) => format!("/?lang={}&category={}", lang.toggled().code(), slug),
                None => format!("/?lang={}", lang.toggled().code()),
            },
            "services": shown,
            "stats": {
                "services": all_services.len(),
                "min_days": days.clone().min().unwrap_or(0),
                "max_days": days.max().unwrap_or(0),
                "starting_price": if starting_price.is_finite() { starting_price.to_string() } else { String::new() },
            },
        }),
    );

    Ok(render(&data, StatusCode::OK, "index", &context))
}

/// Serve the order form for one service
pub async fn order_form(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<LangQuery>,
) -> Result<HttpResponse, StoreError> {
    let lang = query.language();
    let entry = match data.store.get_service(path.into_inner()).await {
        Ok(entry) if entry.service.is_active => entry,
        Ok(_) | Err(StoreError::NotFound(_)) => return Ok(not_found_page(&data, lang)),
        Err(e) => return Err(e),
    };

    let card = service_card(&data, lang, &entry);
    let context = merge(
        page_context(&data, lang, &format!("{} | Taliyo Technologies", entry.service.name(lang))),
        json!({
            "toggle_url": format!("/order/{}?lang={}", entry.service.id, lang.toggled().code()),
            "home_url": format!("/?lang={}", lang.code()),
            "service": card,
            "budget_options": LocalizedOption::list(&BUDGET_OPTIONS, lang),
            "delivery_options": LocalizedOption::list(&DELIVERY_OPTIONS, lang),
        }),
    );

    Ok(render(&data, StatusCode::OK, "order", &context))
}

fn order_row(order: &Order) -> Value {
    json!({
        "id": order.id,
        "order_id": order.order_id,
        "customer_name": order.customer_name,
        "customer_phone": order.customer_phone,
        "customer_email": order.customer_email,
        "contact_number": order.contact_number(),
        "service_name": order.service_name,
        "service_price": order.service_price.map(|p| p.to_string()),
        "requirements": order.requirements,
        "budget_range": order.budget_range,
        "delivery_preference": order.delivery_preference,
        "additional_notes": order.additional_notes,
        "admin_notes": order.admin_notes,
        "status": order.status,
        "status_label": order.status.label(),
        "priority": order.priority,
        "priority_label": order.priority.label(),
        "whatsapp_sent": order.whatsapp_sent,
        "attachments": order.attachment_files,
        "created": order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        "status_options": OrderStatus::ALL.iter().map(|s| json!({
            "value": s.as_str(),
            "label": s.label(),
            "selected": *s == order.status,
        })).collect::<Vec<_>>(),
        "priority_options": Priority::ALL.iter().map(|p| json!({
            "value": p.as_str(),
            "label": p.label(),
            "selected": *p == order.priority,
        })).collect::<Vec<_>>(),
    })
}

/// Admin console: login form without a session, dashboard with one
pub async fn admin(
    req: HttpRequest,
    data: web::Data<AppState>,
    sessions: web::Data<SessionStore>,
    query: web::Query<OrderFilterQuery>,
) -> Result<HttpResponse, StoreError> {
    let session = request_token(&req).and_then(|token| sessions.validate(&token));
    let Some(session) = session else {
        let context = json!({
            "title": "Admin Login | Taliyo Technologies",
            "login_enabled": data.config.admin_secret_key.is_some(),
        });
        return Ok(render(&data, StatusCode::OK, "admin_login", &context));
    };

    let filter = OrderFilter::from_query(&query).unwrap_or_else(|e| {
        warn!("Ignoring admin console filter: {}", e);
        OrderFilter::default()
    });
    let dashboard = data.store.dashboard().await?;
    let filtered = filter.apply(data.store.list_orders().await?);
    let services = data.store.list_services(false, None).await?;
    let categories = data.store.list_categories().await?;

    let selected_status = filter.status;
    let selected_priority = filter.priority;
    let context = json!({
        "title": "Admin | Taliyo Technologies",
        "email": session.email,
        "stats": dashboard.stats,
        "orders": filtered.orders.iter().map(order_row).collect::<Vec<_>>(),
        "shown": filtered.shown,
        "total": filtered.total,
        "search": query.search.clone().unwrap_or_default(),
        "status_filter": OrderStatus::ALL.iter().map(|s| json!({
            "value": s.as_str(),
            "label": s.label(),
            "selected": Some(*s) == selected_status,
        })).collect::<Vec<_>>(),
        "priority_filter": Priority::ALL.iter().map(|p| json!({
            "value": p.as_str(),
            "label": p.label(),
            "selected": Some(*p) == selected_priority,
        })).collect::<Vec<_>>(),
        "services": services,
        "categories": categories,
    });

    Ok(render(&data, StatusCode::OK, "admin", &context))
}

fn not_found_page(data: &AppState, lang: Language) -> HttpResponse {
    let context = merge(
        page_context(
            data,
            lang,
            &format!("{} | Taliyo Technologies", translate(lang, "notFound.title")),
        ),
        json!({
            "home_url": format!("/?lang={}", lang.code()),
            "toggle_url": format!("/?lang={}", lang.toggled().code()),
        }),
    );
    render(data, StatusCode::NOT_FOUND, "404", &context)
}

/// 404 Not Found handler
pub async fn not_found(req: HttpRequest, data: web::Data<AppState>) -> HttpResponse {
    let lang = web::Query::<LangQuery>::from_query(req.query_string())
        .map(|q| q.language())
        .unwrap_or_default();
    not_found_page(&data, lang)
}

use std::sync::Arc;

use actix_files as fs;
use actix_web::{middleware, web, App, HttpServer};
use handlebars::Handlebars;
use log::{error, info};

use crate::auth::SessionStore;
use crate::config::Config;
use crate::core::error::{StoreError, StoreResult};
use crate::metrics::Metrics;
use crate::storage::attachments::{AttachmentPolicy, AttachmentStore};
use crate::storage::Store;
use crate::web::handlers;

/// Shared application state for web handlers
pub struct AppState {
    pub store: Arc<Store>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub policy: AttachmentPolicy,
    pub config: Config,
    pub metrics: Metrics,
    pub templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<Store>, attachments: Arc<dyn AttachmentStore>) -> StoreResult<Self> {
        let mut templates = Handlebars::new();
        templates
            .register_templates_directory(".hbs", &config.templates)
            .map_err(|e| {
                error!("Error registering Handlebars templates: {}", e);
                StoreError::Internal(format!("Template error: {}", e))
            })?;

        Ok(Self {
            store,
            attachments,
            policy: AttachmentPolicy::default(),
            config,
            metrics: Metrics::new()?,
            templates,
        })
    }
}

/// JSON body limit, sized for a full batch of base64-encoded attachments
const JSON_LIMIT: usize = 72 * 1024 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| StoreError::validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| StoreError::validation(err.to_string()).into())
}

/// Register every API and page route
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::system::health))
                // Public catalog
                .route("/catalog/categories", web::get().to(handlers::catalog::list_categories))
                .route("/catalog/services", web::get().to(handlers::catalog::list_services))
                .route("/catalog/services/{id}", web::get().to(handlers::catalog::get_service))
                .route("/catalog/options", web::get().to(handlers::catalog::get_options))
                .route("/contact/whatsapp", web::get().to(handlers::catalog::whatsapp_contact))
                // Order intake
                .route("/orders", web::post().to(handlers::orders::create_order))
                .route(
                    "/orders/{order_id}/attachments",
                    web::post().to(handlers::orders::upload_attachments),
                )
                // Admin session
                .route("/admin/login", web::post().to(handlers::auth::login))
                .route("/admin/logout", web::post().to(handlers::auth::logout))
                .route("/admin/session", web::get().to(handlers::auth::session))
                .route("/admin/dashboard", web::get().to(handlers::admin_orders::dashboard))
                // Admin catalog
                .route("/admin/categories", web::get().to(handlers::admin_catalog::list_categories))
                .route("/admin/categories", web::post().to(handlers::admin_catalog::create_category))
                .route("/admin/categories/{id}", web::get().to(handlers::admin_catalog::get_category))
                .route("/admin/categories/{id}", web::put().to(handlers::admin_catalog::update_category))
                .route("/admin/categories/{id}", web::delete().to(handlers::admin_catalog::delete_category))
                .route("/admin/services", web::get().to(handlers::admin_catalog::list_services))
                .route("/admin/services", web::post().to(handlers::admin_catalog::create_service))
                .route("/admin/services/{id}", web::put().to(handlers::admin_catalog::update_service))
                .route("/admin/services/{id}", web::delete().to(handlers::admin_catalog::delete_service))
                // Admin orders
                .route("/admin/orders", web::get().to(handlers::admin_orders::list_orders))
                .route("/admin/orders/export", web::get().to(handlers::admin_orders::export_orders))
                .route("/admin/orders/{id}", web::get().to(handlers::admin_orders::get_order))
                .route("/admin/orders/{id}", web::delete().to(handlers::admin_orders::delete_order))
                .route("/admin/orders/{id}/status", web::put().to(handlers::admin_orders::update_status))
                .route("/admin/orders/{id}/priority", web::put().to(handlers::admin_orders::update_priority))
                .route("/admin/orders/{id}/notes", web::put().to(handlers::admin_orders::update_notes))
                .route("/admin/orders/{id}/whatsapp", web::post().to(handlers::admin_orders::whatsapp_message)),
        )
        .route("/metrics", web::get().to(handlers::system::metrics))
        // Page routes
        .route("/", web::get().to(handlers::pages::index))
        .route("/order/{service_id}", web::get().to(handlers::pages::order_form))
        .route("/admin", web::get().to(handlers::pages::admin));
}

/// Start the storefront web server
pub async fn start_web_server(state: web::Data<AppState>, sessions: web::Data<SessionStore>) -> std::io::Result<()> {
    let (bind, port) = state.config.address();
    let upload_dir = state.config.upload_dir.clone();
    info!("Starting web server on http://{}:{}", bind, port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(sessions.clone())
            // Stored attachments
            .service(fs::Files::new("/files", upload_dir.clone()))
            .configure(routes)
            // Default route for 404
            .default_service(web::route().to(handlers::pages::not_found))
    })
    .bind((bind, port))?
    .run()
    .await
}

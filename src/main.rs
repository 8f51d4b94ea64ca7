use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Data;
use log::{error, info, warn};

mod auth;
mod config;
mod core;
mod metrics;
mod storage;
mod web;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::storage::attachments::LocalAttachmentStore;
use crate::storage::Store;
use crate::web::server::{start_web_server, AppState};

/// How often expired admin sessions are dropped
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting Taliyo storefront...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    for key in config.missing_required() {
        warn!("{} is not set", key);
    }

    let store = match Store::open(&config.database) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database ready");

    let attachments = Arc::new(LocalAttachmentStore::new(&config.upload_dir, &config.public_url));
    info!("Attachments stored under {}", attachments.root().display());
    let sessions = Data::new(SessionStore::new(&config));
    let state = match AppState::new(config, store, attachments) {
        Ok(state) => Data::new(state),
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    let purge_sessions = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purge_sessions.purge_expired();
            if purged > 0 {
                info!("Purged {} expired admin session(s)", purged);
            }
        }
    });

    info!("Storefront is now running. Press Ctrl+C to stop.");
    tokio::select! {
        result = start_web_server(state, sessions) => {
            if let Err(e) = &result {
                error!("Web server error: {}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down storefront...");
            Ok(())
        }
    }
}

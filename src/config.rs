use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub database: PathBuf,
    pub upload_dir: PathBuf,
    /// Base URL used when building attachment links
    pub public_url: String,
    pub templates: PathBuf,
    /// Admin login is disabled while this is unset
    pub admin_secret_key: Option<String>,
    pub admin_emails: Vec<String>,
    pub whatsapp_number: String,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
    whatsapp_number_set: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let whatsapp_number = var("WHATSAPP_NUMBER");

        Ok(Self {
            bind: load(&var, "STOREFRONT_BIND", "127.0.0.1")?,
            port: load(&var, "STOREFRONT_PORT", "8080")?,
            database: load(&var, "STOREFRONT_DATABASE", "./data/storefront.db")?,
            upload_dir: load(&var, "STOREFRONT_UPLOAD_DIR", "./data/uploads")?,
            public_url: load::<String>(&var, "STOREFRONT_PUBLIC_URL", "http://localhost:8080")?
                .trim_end_matches('/')
                .to_string(),
            templates: load(&var, "STOREFRONT_TEMPLATES", "./src/web/templates")?,
            admin_secret_key: var("ADMIN_SECRET_KEY"),
            admin_emails: var("ADMIN_EMAILS")
                .map(|list| {
                    list.split(',')
                        .map(|e| e.trim().to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            whatsapp_number_set: whatsapp_number.is_some(),
            whatsapp_number: whatsapp_number.unwrap_or_else(|| "919876543210".to_string()),
            session_ttl_days: load(&var, "SESSION_TTL_DAYS", "60")?,
            cookie_secure: load(&var, "COOKIE_SECURE", "false")?,
        })
    }

    /// Required variables that were not set
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.admin_secret_key.is_none() {
            missing.push("ADMIN_SECRET_KEY");
        }
        if !self.whatsapp_number_set {
            missing.push("WHATSAPP_NUMBER");
        }
        missing
    }

    pub fn address(&self) -> (String, u16) {
        (self.bind.clone(), self.port)
    }
}

fn load<T>(var: &impl Fn(&str) -> Option<String>, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{} not set, using default: {}", key, default);
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {} value: {}", key, e);
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }
    })
}

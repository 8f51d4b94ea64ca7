//! Admin sessions
//!
//! Staff log in with the shared admin secret (and optionally an allow-listed
//! email). A successful login creates an opaque session token that is kept in
//! memory and handed back as the `admin_session` cookie.

use std::future::{ready, Ready};

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::core::error::{StoreError, StoreResult};

pub const SESSION_COOKIE: &str = "admin_session";

/// Logged-in admin
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminSession {
    pub token: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Compare two secrets without an early exit on the first differing byte
fn secrets_match(expected: &str, supplied: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let supplied = Sha256::digest(supplied.as_bytes());
    expected
        .iter()
        .zip(supplied.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// In-memory session table
pub struct SessionStore {
    secret_key: Option<String>,
    admin_emails: Vec<String>,
    ttl: Duration,
    cookie_secure: bool,
    sessions: DashMap<String, AdminSession>,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            secret_key: config.admin_secret_key.clone(),
            admin_emails: config.admin_emails.clone(),
            ttl: Duration::days(config.session_ttl_days),
            cookie_secure: config.cookie_secure,
            sessions: DashMap::new(),
        }
    }

    pub fn is_valid_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        !email.is_empty() && self.admin_emails.iter().any(|allowed| *allowed == email)
    }

    /// Check the credentials and open a session
    pub fn authenticate(&self, secret_key: &str, email: Option<&str>) -> StoreResult<AdminSession> {
        let expected = self.secret_key.as_deref().ok_or_else(|| {
            warn!("Admin login attempted but ADMIN_SECRET_KEY is not configured");
            StoreError::Unauthorized("Admin login is disabled".into())
        })?;

        if !secrets_match(expected, secret_key) {
            return Err(StoreError::Unauthorized("Invalid admin secret key".into()));
        }

        let email = email.map(str::trim).filter(|e| !e.is_empty());
        if let Some(email) = email {
            if !self.is_valid_admin_email(email) {
                return Err(StoreError::Unauthorized(format!(
                    "{} is not an admin account",
                    email
                )));
            }
        }

        let now = Utc::now();
        let session = AdminSession {
            token: Uuid::new_v4().to_string(),
            email: email.map(str::to_lowercase),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        info!(
            "Admin session opened for {}",
            session.email.as_deref().unwrap_or("secret key")
        );
        Ok(session)
    }

    /// Look up a live session, dropping it if it has expired
    pub fn validate(&self, token: &str) -> Option<AdminSession> {
        let session = self.sessions.get(token).map(|s| s.value().clone())?;
        if session.is_expired(Utc::now()) {
            debug!("Session expired, removing");
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Remove every expired session, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before - self.sessions.len()
    }

    pub fn session_cookie(&self, session: &AdminSession) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, session.token.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(CookieDuration::seconds(self.ttl.num_seconds()))
            .finish()
    }

    /// Cookie that clears the session on the client
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(CookieDuration::ZERO)
            .finish()
    }
}

/// Session token from the cookie or an `Authorization: Bearer` header
pub fn request_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor that only succeeds for requests carrying a live admin session
#[derive(Debug, Clone)]
pub struct AdminGuard(pub AdminSession);

impl FromRequest for AdminGuard {
    type Error = StoreError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let sessions = match req.app_data::<web::Data<SessionStore>>() {
            Some(sessions) => sessions,
            None => {
                return ready(Err(StoreError::Internal(
                    "Session store is not configured".into(),
                )))
            }
        };

        let result = request_token(req)
            .and_then(|token| sessions.validate(&token))
            .map(AdminGuard)
            .ok_or_else(|| StoreError::Unauthorized("Admin session required".into()));
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpResponse};

    fn store(secret: Option<&str>) -> SessionStore {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.admin_secret_key = secret.map(str::to_string);
        config.admin_emails = vec!["owner@taliyo.in".to_string()];
        SessionStore::new(&config)
    }

    #[test]
    fn test_secret_comparison() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3cre"));
        assert!(!secrets_match("s3cret", ""));
    }

    #[test]
    fn test_authenticate_rules() {
        let sessions = store(Some("s3cret"));
        assert!(sessions.authenticate("wrong", None).is_err());
        assert!(sessions
            .authenticate("s3cret", Some("stranger@example.com"))
            .is_err());

        let session = sessions.authenticate("s3cret", Some(" Owner@Taliyo.in ")).unwrap();
        assert_eq!(session.email.as_deref(), Some("owner@taliyo.in"));
        assert_eq!(sessions.validate(&session.token), Some(session.clone()));

        assert!(sessions.revoke(&session.token));
        assert!(sessions.validate(&session.token).is_none());
    }

    #[test]
    fn test_login_disabled_without_secret() {
        let sessions = store(None);
        assert!(matches!(
            sessions.authenticate("", None),
            Err(StoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_sessions_are_purged() {
        let sessions = store(Some("s3cret"));
        let session = sessions.authenticate("s3cret", None).unwrap();
        sessions.sessions.alter(&session.token, |_, mut s| {
            s.expires_at = Utc::now() - Duration::minutes(1);
            s
        });

        assert_eq!(sessions.purge_expired(), 1);
        assert!(sessions.validate(&session.token).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let sessions = store(Some("s3cret"));
        let session = sessions.authenticate("s3cret", None).unwrap();
        let cookie = sessions.session_cookie(&session);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(60)));
    }

    async fn whoami(guard: AdminGuard) -> HttpResponse {
        HttpResponse::Ok().body(guard.0.token)
    }

    #[actix_web::test]
    async fn test_guard_reads_cookie_and_bearer() {
        let sessions = web::Data::new(store(Some("s3cret")));
        let session = sessions.authenticate("s3cret", None).unwrap();

        let app = actix_test::init_service(
            App::new()
                .app_data(sessions.clone())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/me").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = actix_test::TestRequest::get()
            .uri("/me")
            .cookie(sessions.session_cookie(&session))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", session.token)))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, session.token.as_bytes());
    }
}

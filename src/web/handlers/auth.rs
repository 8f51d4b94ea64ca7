use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;

use crate::auth::{request_token, AdminGuard, SessionStore};
use crate::core::error::StoreError;
use crate::web::models::{GenericResponse, LoginRequest, SessionResponse};
use crate::web::server::AppState;

/// Exchange the admin secret for a session cookie
pub async fn login(
    data: web::Data<AppState>,
    sessions: web::Data<SessionStore>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, StoreError> {
    let session = sessions
        .authenticate(&body.secret_key, body.email.as_deref())
        .map_err(|e| {
            data.metrics.failed_logins.inc();
            warn!("Admin login failed: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok()
        .cookie(sessions.session_cookie(&session))
        .json(SessionResponse {
            authenticated: true,
            email: session.email,
            expires_at: Some(session.expires_at),
        }))
}

/// Drop the current session, if any, and clear the cookie
pub async fn logout(req: HttpRequest, sessions: web::Data<SessionStore>) -> HttpResponse {
    if let Some(token) = request_token(&req) {
        sessions.revoke(&token);
    }
    HttpResponse::Ok()
        .cookie(sessions.removal_cookie())
        .json(GenericResponse::ok("Logged out"))
}

/// Current session details
pub async fn session(guard: AdminGuard) -> HttpResponse {
    let session = guard.0;
    HttpResponse::Ok().json(SessionResponse {
        authenticated: true,
        email: session.email,
        expires_at: Some(session.expires_at),
    })
}

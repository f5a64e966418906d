use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, info};

use radar_db::Database;
use radar_session::{AuthError, SessionAuthority};
use radar_types::api::{LoginRequest, SessionResponse};

use crate::error::{ApiError, json_body};
use crate::middleware::session_token;

pub const SESSION_COOKIE: &str = "session";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionAuthority,
    /// Mark the session cookie `Secure` (only sent over HTTPS).
    pub secure_cookies: bool,
}

impl AppStateInner {
    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(time::Duration::seconds(self.sessions.ttl().num_seconds()))
            .build()
    }
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// POST /api/auth/login — `{ username, password }`. On success sets the
/// session cookie and echoes `{ username, isAdmin }`.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("username and password required".into()));
    }

    // Argon2 verification is CPU-bound; keep it off the async workers
    let st = state.clone();
    let issued = tokio::task::spawn_blocking(move || st.sessions.issue(&req.username, &req.password))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })??;

    info!("Admin '{}' logged in", issued.credential.subject);

    let cookie = state.session_cookie(issued.token);
    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            username: issued.credential.subject,
            is_admin: issued.credential.is_admin,
        }),
    ))
}

/// GET /api/auth/session — claims of the presented credential. A stale or
/// undecodable cookie is cleared in the same response.
pub async fn session(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Response {
    let token = session_token(&headers);

    match state.sessions.validate(token.as_deref()) {
        Ok(claims) => Json(SessionResponse {
            username: claims.subject,
            is_admin: claims.is_admin,
        })
        .into_response(),
        Err(e @ (AuthError::Expired | AuthError::Malformed)) => {
            (jar.remove(removal_cookie()), ApiError::from(e)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /api/auth/logout — tells the client to drop its credential. There is
/// no server-side revocation list.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> impl IntoResponse {
    let token = session_token(&headers);
    if let Some(claims) = state.sessions.revoke(token.as_deref()) {
        info!("Admin '{}' logged out", claims.subject);
    }

    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

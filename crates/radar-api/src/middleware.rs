use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use radar_session::SessionClaims;
use tracing::{debug, warn};

use crate::auth::{AppState, SESSION_COOKIE};
use crate::error::ApiError;

/// Claims of the admin session that passed `require_admin`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

/// Session token from the `session` cookie, or from an
/// `Authorization: Bearer` header for non-browser clients.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Gate for every admin-only route. Rejects uniformly before the handler
/// runs, so no partial admin action can happen.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers());

    let claims = state.sessions.validate(token.as_deref()).map_err(|e| {
        warn!("Refused {} {}: {}", req.method(), req.uri().path(), e);
        e
    })?;

    if !claims.is_admin {
        warn!("Refused {} {}: '{}' is not an admin", req.method(), req.uri().path(), claims.subject);
        return Err(ApiError::Forbidden);
    }

    debug!("Admin '{}' authorized for {} {}", claims.subject, req.method(), req.uri().path());
    req.extensions_mut().insert(AdminSession(claims));
    Ok(next.run(req).await)
}

/// For public routes whose output depends on the viewer. An unusable
/// credential counts as no credential.
pub fn viewer_is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    let token = session_token(headers);
    matches!(state.sessions.validate(token.as_deref()), Ok(claims) if claims.is_admin)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(session_token(&headers), None);
    }
}

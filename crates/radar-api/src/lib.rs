pub mod auth;
pub mod error;
pub mod finished;
pub mod investments;
pub mod ledger;
pub mod likes;
pub mod middleware;

#[cfg(test)]
mod router_tests;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use tracing::error;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

/// All HTTP routes. Admin-only routes share one gate.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/investment", get(investments::list).post(investments::create))
        .route("/api/investment/{id}", get(investments::get))
        .route(
            "/api/investment/{id}/like",
            post(likes::toggle).put(likes::cast).delete(likes::retract),
        )
        .route("/api/finished-investments", get(finished::list))
        .route("/healthz", get(health));

    let admin_routes = Router::new()
        .route("/api/investment/{id}", put(investments::update).delete(investments::delete))
        .route("/api/investment/{id}/approve", post(investments::approve))
        .route("/api/finished-investments", post(finished::create))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_admin));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let st = state.clone();
    tokio::task::spawn_blocking(move || f(&*st))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}

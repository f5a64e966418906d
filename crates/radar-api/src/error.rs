//! Maps handler failures to status codes and a small JSON body.
//!
//! Authorization failures (401/403) are kept apart from storage failures
//! (500) so a client can tell "log in again" from "retry later".

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use radar_session::AuthError;
use thiserror::Error;
use tracing::error;

use crate::ledger::VoteError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("admin capability required")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("investment {0} not found")]
    NotFound(i64),

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::Encoding(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.reason(),
            Self::Forbidden => "forbidden",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::Internal => "internal",
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(e)
    }
}

impl From<VoteError> for ApiError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::NotFound(id) => Self::NotFound(id),
            VoteError::Storage(e) => Self::Storage(e),
            // Absorbed by the like handlers before reaching here
            VoteError::AlreadyVoted(_) | VoteError::NotVoted(_) => Self::Internal,
        }
    }
}

/// Unwraps a JSON body, turning axum's plain-text rejection (bad syntax,
/// unknown field, wrong content type) into a `validation` error.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                Self::Storage(e) => error!("Storage error: {:#}", e),
                other => error!("{}", other),
            }
        }

        // Never leak storage or encoding details to the client
        let message = if status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "reason": self.reason(),
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

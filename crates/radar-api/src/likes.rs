use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use radar_types::api::{LikeRequest, LikeResponse};
use radar_types::models::VoterMembership;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, json_body};
use crate::investments::to_investment;
use crate::ledger::VoteLedger;
use crate::middleware::viewer_is_admin;

const MAX_VOTER_TOKEN: usize = 128;

#[derive(Debug, Clone, Copy)]
enum Direction {
    Toggle,
    Cast,
    Retract,
}

/// POST /api/investment/{id}/like — like or unlike depending on whether the
/// presented membership already contains the investment.
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let is_admin = viewer_is_admin(&state, &headers);
    apply(state, id, json_body(body)?, is_admin, Direction::Toggle).await
}

/// PUT /api/investment/{id}/like — like; repeating it changes nothing.
pub async fn cast(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let is_admin = viewer_is_admin(&state, &headers);
    apply(state, id, json_body(body)?, is_admin, Direction::Cast).await
}

/// DELETE /api/investment/{id}/like — unlike; repeating it changes nothing.
pub async fn retract(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let is_admin = viewer_is_admin(&state, &headers);
    apply(state, id, json_body(body)?, is_admin, Direction::Retract).await
}

/// Unapproved suggestions look absent to non-admins here too, and their
/// counter does not move.
async fn apply(
    state: AppState,
    id: i64,
    req: LikeRequest,
    is_admin: bool,
    direction: Direction,
) -> Result<Json<LikeResponse>, ApiError> {
    let mut membership = membership_from(req)?;

    let (row, membership) = blocking(&state, move |st| {
        let visible = st.db.get_investment(id)?.is_some_and(|row| row.approved || is_admin);
        if !visible {
            return Err(ApiError::NotFound(id));
        }

        let ledger = VoteLedger::new(&st.db);
        let row = match direction {
            Direction::Toggle => ledger.toggle(&mut membership, id)?.0,
            Direction::Cast => ledger.cast_idempotent(&mut membership, id)?,
            Direction::Retract => ledger.retract_idempotent(&mut membership, id)?,
        };
        Ok((row, membership))
    })
    .await?;

    let liked = membership.has_voted(id);
    debug!(
        "Voter {} {:?} on investment {}: liked={} likes={}",
        membership.voter_token, direction, id, liked, row.likes
    );

    Ok(Json(LikeResponse {
        investment: to_investment(row),
        liked,
        membership,
    }))
}

fn membership_from(req: LikeRequest) -> Result<VoterMembership, ApiError> {
    let voter_token = match req.voter_token.map(|t| t.trim().to_string()) {
        Some(t) if t.len() > MAX_VOTER_TOKEN => {
            return Err(ApiError::Validation("voterToken too long".into()));
        }
        Some(t) if !t.is_empty() => t,
        _ => Uuid::new_v4().to_string(),
    };

    Ok(VoterMembership {
        voter_token,
        liked: req.liked.into_iter().collect(),
    })
}

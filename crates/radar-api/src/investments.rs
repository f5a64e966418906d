use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};

use radar_db::models::{InvestmentPatch, InvestmentRow, NewInvestment};
use radar_types::api::{CreateInvestmentRequest, UpdateInvestmentRequest};
use radar_types::models::Investment;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, json_body};
use crate::middleware::{AdminSession, viewer_is_admin};

/// GET /api/investment — approved suggestions, most-liked first.
/// Admins also see suggestions awaiting approval.
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    let include_unapproved = viewer_is_admin(&state, &headers);

    let rows = blocking(&state, move |st| Ok(st.db.list_investments(include_unapproved)?)).await?;

    let investments: Vec<Investment> = rows.into_iter().map(to_investment).collect();
    Ok(Json(investments))
}

/// POST /api/investment — a citizen suggestion. Starts unapproved.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateInvestmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    req.validate().map_err(ApiError::Validation)?;

    let new = NewInvestment {
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        kind: req.kind.trim().to_string(),
        location: req.location.trim().to_string(),
        lat: req.lat,
        lng: req.lng,
        author_name: req.author_name.trim().to_string(),
        author_address: req.author_address.trim().to_string(),
    };

    let row = blocking(&state, move |st| Ok(st.db.insert_investment(&new)?)).await?;
    info!("New suggestion {} '{}'", row.id, row.title);

    Ok((StatusCode::CREATED, Json(to_investment(row))))
}

/// GET /api/investment/{id} — unapproved suggestions look absent to non-admins.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |st| Ok(st.db.get_investment(id)?))
        .await?
        .ok_or(ApiError::NotFound(id))?;

    if !row.approved && !viewer_is_admin(&state, &headers) {
        return Err(ApiError::NotFound(id));
    }

    Ok(Json(to_investment(row)))
}

/// PUT /api/investment/{id} — admin partial update.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AdminSession(admin)): Extension<AdminSession>,
    body: Result<Json<UpdateInvestmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    req.validate().map_err(ApiError::Validation)?;

    let patch = InvestmentPatch {
        title: req.title.map(|s| s.trim().to_string()),
        description: req.description.map(|s| s.trim().to_string()),
        kind: req.kind.map(|s| s.trim().to_string()),
        location: req.location.map(|s| s.trim().to_string()),
        lat: req.lat,
        lng: req.lng,
        author_name: req.author_name.map(|s| s.trim().to_string()),
        author_address: req.author_address.map(|s| s.trim().to_string()),
        approved: req.approved,
    };

    let row = blocking(&state, move |st| {
        let current = st.db.get_investment(id)?.ok_or(ApiError::NotFound(id))?;
        let lat = patch.lat.unwrap_or(current.lat);
        let lng = patch.lng.unwrap_or(current.lng);
        if lat.is_some() != lng.is_some() {
            return Err(ApiError::Validation("lat and lng must be set or cleared together".into()));
        }

        st.db.update_investment(id, &patch)?.ok_or(ApiError::NotFound(id))
    })
    .await?;
    info!("Admin '{}' updated investment {}", admin.subject, id);

    Ok(Json(to_investment(row)))
}

/// POST /api/investment/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AdminSession(admin)): Extension<AdminSession>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |st| Ok(st.db.approve_investment(id)?))
        .await?
        .ok_or(ApiError::NotFound(id))?;
    info!("Admin '{}' approved investment {}", admin.subject, id);

    Ok(Json(to_investment(row)))
}

/// DELETE /api/investment/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AdminSession(admin)): Extension<AdminSession>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(&state, move |st| Ok(st.db.delete_investment(id)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound(id));
    }
    info!("Admin '{}' deleted investment {}", admin.subject, id);

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn to_investment(row: InvestmentRow) -> Investment {
    Investment {
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on investment {}", row.created_at, row.id);
            chrono::DateTime::default()
        }),
        id: row.id,
        title: row.title,
        description: row.description,
        kind: row.kind,
        location: row.location,
        lat: row.lat,
        lng: row.lng,
        likes: row.likes,
        author_name: row.author_name,
        author_address: row.author_address,
        approved: row.approved,
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
pub(crate) fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

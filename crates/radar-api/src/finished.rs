use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use radar_db::models::{FinishedInvestmentRow, NewFinishedInvestment};
use radar_types::api::CreateFinishedInvestmentRequest;
use radar_types::models::FinishedInvestment;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, json_body};
use crate::investments::parse_timestamp;
use crate::middleware::AdminSession;

/// GET /api/finished-investments
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |st| Ok(st.db.list_finished_investments()?)).await?;
    let finished: Vec<FinishedInvestment> = rows.into_iter().map(to_finished).collect();
    Ok(Json(finished))
}

/// POST /api/finished-investments — admin only.
pub async fn create(
    State(state): State<AppState>,
    Extension(AdminSession(admin)): Extension<AdminSession>,
    body: Result<Json<CreateFinishedInvestmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    req.validate().map_err(ApiError::Validation)?;

    let new = NewFinishedInvestment {
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        budget: req.budget,
        completed: req.completed,
        region: req.region.trim().to_string(),
        kind: req.kind.trim().to_string(),
        location: req.location.trim().to_string(),
        lat: req.lat,
        lng: req.lng,
        completed_date: req.completed_date.trim().to_string(),
        contractor: req.contractor.trim().to_string(),
    };

    let row = blocking(&state, move |st| Ok(st.db.insert_finished_investment(&new)?)).await?;
    info!("Admin '{}' added finished investment {}", admin.subject, row.id);

    Ok((StatusCode::CREATED, Json(to_finished(row))))
}

fn to_finished(row: FinishedInvestmentRow) -> FinishedInvestment {
    FinishedInvestment {
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on finished investment {}", row.created_at, row.id);
            chrono::DateTime::default()
        }),
        id: row.id,
        title: row.title,
        description: row.description,
        budget: row.budget,
        completed: row.completed,
        region: row.region,
        kind: row.kind,
        location: row.location,
        lat: row.lat,
        lng: row.lng,
        completed_date: row.completed_date,
        contractor: row.contractor,
    }
}

use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use pawhaven_db::Contribution;
use pawhaven_db::models::{NewStrayMapEntry, StrayMapRow};
use pawhaven_types::api::{Claims, StrayMapCreate, StrayMapQuery, StrayMapResponse};
use pawhaven_types::enums::LocationType;

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::geo;
use crate::leaderboard::award_best_effort;
use crate::run_blocking;
use crate::state::AppState;

const CREATE_POINTS: i64 = 10;

fn entry_response(row: StrayMapRow) -> StrayMapResponse {
    StrayMapResponse {
        id: convert::uuid(&row.id, "stray map id"),
        user_id: convert::uuid(&row.user_id, "stray map user id"),
        name: row.name,
        description: row.description,
        contact_info: row.contact_info,
        latitude: row.latitude,
        longitude: row.longitude,
        location_type: convert::enum_or(
            &row.location_type,
            LocationType::StrayAnimal,
            "location_type",
        ),
        created_at: convert::timestamp(&row.created_at, "stray map created_at"),
        updated_at: convert::timestamp(&row.updated_at, "stray map updated_at"),
    }
}

pub async fn list_entries(
    State(state): State<AppState>,
    Query(q): Query<StrayMapQuery>,
) -> ApiResult<Json<Vec<StrayMapResponse>>> {
    let filter = q.location_type.map(|t| t.as_str());
    let rows = run_blocking(&state, move |db| db.list_stray_map_entries(filter)).await?;
    Ok(Json(rows.into_iter().map(entry_response).collect()))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StrayMapResponse>> {
    let id = id.to_string();
    let row = run_blocking(&state, move |db| db.get_stray_map_entry(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Map entry not found"))?;
    Ok(Json(entry_response(row)))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StrayMapCreate>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    geo::validate_point(req.latitude, req.longitude)?;

    let entry = NewStrayMapEntry {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.to_string(),
        name: req.name.trim().to_string(),
        description: req.description,
        contact_info: req.contact_info,
        latitude: req.latitude,
        longitude: req.longitude,
        location_type: req.location_type.as_str().to_string(),
    };
    let row = run_blocking(&state, move |db| db.create_stray_map_entry(&entry)).await?;
    info!("Map entry {} ({}) added by {}", row.id, row.location_type, claims.sub);

    award_best_effort(&state, claims.sub, CREATE_POINTS, Contribution::MapContribution).await;
    Ok((StatusCode::CREATED, Json(entry_response(row))))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let eid = id.to_string();
    let entry = run_blocking(&state, move |db| db.get_stray_map_entry(&eid))
        .await?
        .ok_or_else(|| ApiError::not_found("Map entry not found"))?;
    if entry.user_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("Only the creator can delete this entry"));
    }

    run_blocking(&state, move |db| db.delete_stray_map_entry(&entry.id)).await?;
    info!("Map entry {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

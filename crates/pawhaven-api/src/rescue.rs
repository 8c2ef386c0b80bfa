use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use pawhaven_db::Contribution;
use pawhaven_db::models::{NewChat, NewRescueReport, RescueReportRow};
use pawhaven_types::api::{
    Claims, NearbyQuery, RescueReportCreate, RescueReportResponse, RescueReportUpdate,
};
use pawhaven_types::enums::{AlertLevel, ChatKind, RescueStatus};

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::geo;
use crate::leaderboard::{award_best_effort, award_chat_best_effort};
use crate::run_blocking;
use crate::state::AppState;

const CREATE_POINTS: i64 = 10;
const RESOLVE_POINTS_PER_MESSAGE: i64 = 2;

fn report_response(row: RescueReportRow) -> RescueReportResponse {
    RescueReportResponse {
        report_id: convert::uuid(&row.id, "rescue report id"),
        user_id: convert::uuid(&row.user_id, "rescue reporter id"),
        user_full_name: convert::full_name(
            row.reporter_first_name.as_deref(),
            row.reporter_last_name.as_deref(),
        ),
        user_first_name: row.reporter_first_name,
        user_last_name: row.reporter_last_name,
        location: row.location,
        latitude: row.latitude,
        longitude: row.longitude,
        photo: row.photo,
        status: convert::enum_or(&row.status, RescueStatus::Pending, "rescue status"),
        alert_type: convert::enum_or(&row.alert_type, AlertLevel::Medium, "alert_type"),
        description: row.description,
        chat_id: convert::opt_uuid(row.chat_id.as_deref(), "rescue chat id"),
        created_at: convert::timestamp(&row.created_at, "rescue created_at"),
        updated_at: convert::timestamp(&row.updated_at, "rescue updated_at"),
    }
}

/// Check any coordinate that is present. A report may carry neither.
pub(crate) fn validate_coords(lat: Option<f64>, lon: Option<f64>) -> ApiResult<()> {
    geo::validate_point(lat.unwrap_or(0.0), lon.unwrap_or(0.0))
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<RescueReportRow> {
    let id = id.to_string();
    run_blocking(state, move |db| db.get_rescue_report(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Rescue report not found"))
}

async fn load_own(state: &AppState, claims: &Claims, id: Uuid) -> ApiResult<RescueReportRow> {
    let report = load(state, id).await?;
    if report.user_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("Only the reporter can modify this report"));
    }
    Ok(report)
}

pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RescueReportCreate>,
) -> ApiResult<impl IntoResponse> {
    if req.location.trim().is_empty() {
        return Err(ApiError::bad_request("Location is required"));
    }
    validate_coords(req.latitude, req.longitude)?;

    let report = NewRescueReport {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.to_string(),
        description: req.description,
        location: req.location.trim().to_string(),
        latitude: req.latitude,
        longitude: req.longitude,
        photo: req.photo,
        status: req.status.as_str().to_string(),
        alert_type: req.alert_type.as_str().to_string(),
    };
    let chat = NewChat {
        id: Uuid::new_v4().to_string(),
        kind: ChatKind::Rescue.as_str().to_string(),
        related_entity_id: Some(report.id.clone()),
        creator_id: claims.sub.to_string(),
    };

    let row = run_blocking(&state, move |db| db.create_rescue_report(&report, &chat)).await?;
    info!("Rescue report {} created by {}", row.id, claims.sub);

    award_best_effort(&state, claims.sub, CREATE_POINTS, Contribution::Rescue).await;
    Ok((StatusCode::CREATED, Json(report_response(row))))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<Json<Vec<RescueReportResponse>>> {
    let rows = run_blocking(&state, |db| db.list_rescue_reports()).await?;
    Ok(Json(rows.into_iter().map(report_response).collect()))
}

pub async fn nearby_reports(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(q): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<RescueReportResponse>>> {
    geo::validate_point(q.lat, q.lon)?;
    geo::validate_radius(q.radius_km)?;

    let rows = run_blocking(&state, |db| db.list_located_rescue_reports(None)).await?;
    Ok(Json(
        rows.into_iter()
            .filter(|r| geo::within((q.lat, q.lon), r.latitude, r.longitude, q.radius_km))
            .map(report_response)
            .collect(),
    ))
}

pub async fn get_report(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RescueReportResponse>> {
    Ok(Json(report_response(load(&state, id).await?)))
}

pub async fn get_by_chat(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> ApiResult<Json<RescueReportResponse>> {
    let chat = chat_id.to_string();
    let row = run_blocking(&state, move |db| db.get_rescue_report_by_chat(&chat))
        .await?
        .ok_or_else(|| ApiError::not_found("Rescue report not found"))?;
    Ok(Json(report_response(row)))
}

/// Creator-only partial update. Moving into Resolved rewards the chat's
/// participants once the update has committed.
pub async fn update_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<RescueReportUpdate>,
) -> ApiResult<Json<RescueReportResponse>> {
    let mut report = load_own(&state, &claims, id).await?;

    if let Some(location) = update.location {
        if location.trim().is_empty() {
            return Err(ApiError::bad_request("Location is required"));
        }
        report.location = location.trim().to_string();
    }
    report.latitude = update.latitude.or(report.latitude);
    report.longitude = update.longitude.or(report.longitude);
    validate_coords(report.latitude, report.longitude)?;
    report.photo = update.photo.or(report.photo);
    report.description = update.description.or(report.description);
    if let Some(status) = update.status {
        report.status = status.as_str().to_string();
    }
    if let Some(alert) = update.alert_type {
        report.alert_type = alert.as_str().to_string();
    }

    let chat = report.chat_id.clone();
    let rid = report.id.clone();
    let (resolved_now, row) = run_blocking(&state, move |db| {
        let resolved_now = db.update_rescue_report(&report)?;
        Ok((resolved_now, db.get_rescue_report(&rid)?))
    })
    .await?;
    let row = row.ok_or_else(|| ApiError::not_found("Rescue report not found"))?;

    if resolved_now {
        info!("Rescue report {} resolved", id);
        if let Some(chat) = chat {
            award_chat_best_effort(&state, chat, RESOLVE_POINTS_PER_MESSAGE, Contribution::None)
                .await;
        }
    }
    Ok(Json(report_response(row)))
}

pub async fn delete_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let report = load_own(&state, &claims, id).await?;
    let rid = report.id;
    run_blocking(&state, move |db| db.delete_rescue_report(&rid)).await?;
    info!("Rescue report {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use pawhaven_db::Contribution;
use pawhaven_db::models::{LostFoundRow, NewChat, NewLostFoundReport};
use pawhaven_types::api::{Claims, LostFoundCreate, LostFoundResponse, LostFoundUpdate, NearbyQuery};
use pawhaven_types::enums::{ChatKind, LostFoundStatus, PetGender};

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::geo;
use crate::leaderboard::award_best_effort;
use crate::rescue::validate_coords;
use crate::run_blocking;
use crate::state::AppState;

const CREATE_POINTS: i64 = 5;

fn report_response(row: LostFoundRow) -> LostFoundResponse {
    LostFoundResponse {
        report_id: convert::uuid(&row.id, "lost-found report id"),
        user_id: convert::uuid(&row.user_id, "lost-found reporter id"),
        user_full_name: convert::full_name(
            row.reporter_first_name.as_deref(),
            row.reporter_last_name.as_deref(),
        ),
        user_first_name: row.reporter_first_name,
        user_last_name: row.reporter_last_name,
        pet_name: row.pet_name,
        pet_type: row.pet_type,
        gender: convert::enum_or(&row.gender, PetGender::Unknown, "gender"),
        description: row.description,
        location: row.location,
        latitude: row.latitude,
        longitude: row.longitude,
        photo: row.photo,
        status: convert::enum_or(&row.status, LostFoundStatus::Lost, "lost-found status"),
        chat_id: convert::opt_uuid(row.chat_id.as_deref(), "lost-found chat id"),
        created_at: convert::timestamp(&row.created_at, "lost-found created_at"),
        updated_at: convert::timestamp(&row.updated_at, "lost-found updated_at"),
    }
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<LostFoundRow> {
    let id = id.to_string();
    run_blocking(state, move |db| db.get_lost_found_report(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Lost & found report not found"))
}

async fn load_own(state: &AppState, claims: &Claims, id: Uuid) -> ApiResult<LostFoundRow> {
    let report = load(state, id).await?;
    if report.user_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("Only the reporter can modify this report"));
    }
    Ok(report)
}

pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LostFoundCreate>,
) -> ApiResult<impl IntoResponse> {
    if req.location.trim().is_empty() {
        return Err(ApiError::bad_request("Location is required"));
    }
    validate_coords(req.latitude, req.longitude)?;

    let report = NewLostFoundReport {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.to_string(),
        pet_name: req.pet_name,
        pet_type: req.pet_type,
        gender: req.gender.as_str().to_string(),
        description: req.description,
        location: req.location.trim().to_string(),
        latitude: req.latitude,
        longitude: req.longitude,
        photo: req.photo,
        status: req.status.as_str().to_string(),
    };
    let chat = NewChat {
        id: Uuid::new_v4().to_string(),
        kind: ChatKind::LostPet.as_str().to_string(),
        related_entity_id: Some(report.id.clone()),
        creator_id: claims.sub.to_string(),
    };

    let row = run_blocking(&state, move |db| db.create_lost_found_report(&report, &chat)).await?;
    info!("Lost & found report {} created by {}", row.id, claims.sub);

    award_best_effort(&state, claims.sub, CREATE_POINTS, Contribution::LostPet).await;
    Ok((StatusCode::CREATED, Json(report_response(row))))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<Json<Vec<LostFoundResponse>>> {
    let rows = run_blocking(&state, |db| db.list_lost_found_reports()).await?;
    Ok(Json(rows.into_iter().map(report_response).collect()))
}

pub async fn nearby_reports(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(q): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<LostFoundResponse>>> {
    geo::validate_point(q.lat, q.lon)?;
    geo::validate_radius(q.radius_km)?;

    let rows = run_blocking(&state, |db| db.list_located_lost_found_reports(None)).await?;
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
) -> ApiResult<Json<LostFoundResponse>> {
    Ok(Json(report_response(load(&state, id).await?)))
}

pub async fn get_by_chat(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> ApiResult<Json<LostFoundResponse>> {
    let chat = chat_id.to_string();
    let row = run_blocking(&state, move |db| db.get_lost_found_report_by_chat(&chat))
        .await?
        .ok_or_else(|| ApiError::not_found("Lost & found report not found"))?;
    Ok(Json(report_response(row)))
}

pub async fn update_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<LostFoundUpdate>,
) -> ApiResult<Json<LostFoundResponse>> {
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
    report.pet_name = update.pet_name.or(report.pet_name);
    report.pet_type = update.pet_type.or(report.pet_type);
    report.description = update.description.or(report.description);
    report.photo = update.photo.or(report.photo);
    if let Some(gender) = update.gender {
        report.gender = gender.as_str().to_string();
    }
    if let Some(status) = update.status {
        report.status = status.as_str().to_string();
    }
    if let Some(chat_id) = update.chat_id {
        let chat = chat_id.to_string();
        let exists = {
            let chat = chat.clone();
            run_blocking(&state, move |db| db.get_chat(&chat)).await?.is_some()
        };
        if !exists {
            return Err(ApiError::not_found("Chat not found"));
        }
        report.chat_id = Some(chat);
    }

    let rid = report.id.clone();
    let row = run_blocking(&state, move |db| {
        db.update_lost_found_report(&report)?;
        db.get_lost_found_report(&rid)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Lost & found report not found"))?;
    Ok(Json(report_response(row)))
}

pub async fn delete_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let report = load_own(&state, &claims, id).await?;
    let rid = report.id;
    run_blocking(&state, move |db| db.delete_lost_found_report(&rid)).await?;
    info!("Lost & found report {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, error, info};
use uuid::Uuid;

use pawhaven_db::Contribution;
use pawhaven_db::models::{LeaderboardRow, NewLeaderboardEntry};
use pawhaven_types::api::{Claims, LeaderboardCreate, LeaderboardResponse};

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::run_blocking;
use crate::state::AppState;
use crate::users::require_admin;

fn entry_response(row: LeaderboardRow, rank: usize) -> LeaderboardResponse {
    LeaderboardResponse {
        id: convert::uuid(&row.id, "leaderboard id"),
        user_id: convert::uuid(&row.user_id, "leaderboard user id"),
        full_name: convert::full_name(Some(&row.first_name), Some(&row.last_name))
            .unwrap_or_default(),
        score: row.score,
        last_active: row.last_active,
        rescues: row.rescues,
        adoptions: row.adoptions,
        lost_pets: row.lost_pets,
        map_contributions: row.map_contributions,
        avatar: row.avatar,
        rank,
    }
}

/// Award `points` to one user after the primary write has committed.
/// Failures are logged and swallowed.
pub(crate) async fn award_best_effort(
    state: &AppState,
    user_id: Uuid,
    points: i64,
    contribution: Contribution,
) {
    let uid = user_id.to_string();
    match run_blocking(state, move |db| db.award(&uid, points, contribution)).await {
        Ok(()) => debug!("Awarded {} points ({:?}) to {}", points, contribution, user_id),
        Err(e) => error!("Leaderboard award for {} failed: {}", user_id, e),
    }
}

/// Award every sender in `chat_id` per message. Failures are logged and
/// swallowed.
pub(crate) async fn award_chat_best_effort(
    state: &AppState,
    chat_id: String,
    points_per_message: i64,
    contribution: Contribution,
) {
    let chat = chat_id.clone();
    let result = run_blocking(state, move |db| {
        db.award_chat_participants(&chat, points_per_message, contribution)
    })
    .await;
    match result {
        Ok(n) => info!("Awarded {} participants of chat {}", n, chat_id),
        Err(e) => error!("Chat award for {} failed: {}", chat_id, e),
    }
}

pub async fn list_entries(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LeaderboardResponse>>> {
    let rows = run_blocking(&state, |db| db.list_leaderboard()).await?;
    Ok(Json(
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| entry_response(row, i + 1))
            .collect(),
    ))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let uid = user_id.to_string();
    let (row, rank) = run_blocking(&state, move |db| db.get_leaderboard_entry(&uid))
        .await?
        .ok_or_else(|| ApiError::not_found("Leaderboard entry not found"))?;
    Ok(Json(entry_response(row, rank)))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LeaderboardCreate>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&state, &claims).await?;

    let uid = req.user_id.to_string();
    let (user, existing) = {
        let uid = uid.clone();
        run_blocking(&state, move |db| {
            Ok((db.get_user_by_id(&uid)?, db.get_leaderboard_entry(&uid)?))
        })
        .await?
    };
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if existing.is_some() {
        return Err(ApiError::conflict("Leaderboard entry already exists"));
    }

    let entry = NewLeaderboardEntry {
        id: Uuid::new_v4().to_string(),
        user_id: uid.clone(),
        score: req.score,
        rescues: req.rescues,
        adoptions: req.adoptions,
        lost_pets: req.lost_pets,
        map_contributions: req.map_contributions,
    };
    let (row, rank) = run_blocking(&state, move |db| {
        db.create_leaderboard_entry(&entry)?;
        db.get_leaderboard_entry(&uid)
    })
    .await?
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("leaderboard entry vanished after insert")))?;

    info!("Leaderboard entry for {} created by {}", req.user_id, claims.sub);
    Ok((StatusCode::CREATED, Json(entry_response(row, rank))))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &claims).await?;
    let uid = user_id.to_string();
    let found = run_blocking(&state, move |db| db.delete_leaderboard_entry(&uid)).await?;
    if !found {
        return Err(ApiError::not_found("Leaderboard entry not found"));
    }
    info!("Leaderboard entry for {} deleted by {}", user_id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

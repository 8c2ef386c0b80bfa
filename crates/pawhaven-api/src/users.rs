use axum::{Extension, extract::State, http::StatusCode};
use tracing::info;
use uuid::Uuid;

use pawhaven_db::models::{UserPreferences, UserRow};
use pawhaven_types::api::{Claims, Detail, PasswordChangeRequest, PreferenceUpdate, UserResponse};

use crate::auth::{MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::run_blocking;
use crate::state::AppState;

pub fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: convert::uuid(&row.id, "user id"),
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        profile_photo_url: row.profile_photo_url,
        is_admin: row.is_admin,
        is_active: row.is_active,
        is_email_verified: row.is_email_verified,
        preferred_species: convert::opt_enum(row.preferred_species.as_deref(), "preferred_species"),
        preferred_size: convert::opt_enum(row.preferred_size.as_deref(), "preferred_size"),
        temperament: convert::opt_enum(row.temperament.as_deref(), "temperament"),
        activity_level: convert::opt_enum(row.activity_level.as_deref(), "activity_level"),
        min_age: row.min_age,
        max_age: row.max_age,
    }
}

/// The caller's own row; 404 if it was removed after the token was issued.
pub(crate) async fn current_user(state: &AppState, claims: &Claims) -> ApiResult<UserRow> {
    let uid = claims.sub.to_string();
    run_blocking(state, move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub(crate) async fn require_admin(state: &AppState, claims: &Claims) -> ApiResult<UserRow> {
    let me = current_user(state, claims).await?;
    if !me.is_admin {
        return Err(ApiError::forbidden("Not authorized"));
    }
    Ok(me)
}

/// Upper bound for preferred ages, in months.
pub(crate) const MAX_AGE_MONTHS: i64 = 360;

pub(crate) fn validate_age_range(min: Option<i64>, max: Option<i64>) -> ApiResult<()> {
    for age in [min, max].into_iter().flatten() {
        if !(0..=MAX_AGE_MONTHS).contains(&age) {
            return Err(ApiError::bad_request(format!(
                "Ages must be between 0 and {MAX_AGE_MONTHS} months"
            )));
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ApiError::bad_request("min_age cannot exceed max_age"));
        }
    }
    Ok(())
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserResponse>> {
    let me = current_user(&state, &claims).await?;
    Ok(Json(user_response(me)))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let rows = run_blocking(&state, |db| db.list_active_users()).await?;
    Ok(Json(rows.into_iter().map(user_response).collect()))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PasswordChangeRequest>,
) -> ApiResult<Json<Detail>> {
    if req.new_password != req.new_password_confirm {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let me = current_user(&state, &claims).await?;
    if !verify_password(req.current_password, me.password_hash.clone()).await? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let new_hash = hash_password(req.new_password).await?;
    run_blocking(&state, move |db| db.update_password(&me.id, &new_hash)).await?;
    info!("Password changed for user {}", claims.sub);
    Ok(Json(Detail {
        detail: "Password updated".into(),
    }))
}

/// Partial update; omitted preferences keep their stored value.
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PreferenceUpdate>,
) -> ApiResult<Json<UserResponse>> {
    let me = current_user(&state, &claims).await?;

    let prefs = UserPreferences {
        preferred_species: req
            .preferred_species
            .map(|v| v.as_str().to_string())
            .or(me.preferred_species.clone()),
        preferred_size: req
            .preferred_size
            .map(|v| v.as_str().to_string())
            .or(me.preferred_size.clone()),
        temperament: req
            .temperament
            .map(|v| v.as_str().to_string())
            .or(me.temperament.clone()),
        activity_level: req
            .activity_level
            .map(|v| v.as_str().to_string())
            .or(me.activity_level.clone()),
        min_age: req.min_age.or(me.min_age),
        max_age: req.max_age.or(me.max_age),
    };
    validate_age_range(prefs.min_age, prefs.max_age)?;

    let uid = me.id.clone();
    let updated = run_blocking(&state, move |db| {
        db.update_preferences(&uid, &prefs)?;
        db.get_user_by_id(&uid)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user_response(updated)))
}

/// Admin-only soft delete. Deleting an already inactive user is a no-op.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &claims).await?;
    if user_id == claims.sub {
        return Err(ApiError::bad_request("You cannot delete yourself"));
    }

    let uid = user_id.to_string();
    let found = run_blocking(&state, move |db| db.deactivate_user(&uid)).await?;
    if !found {
        return Err(ApiError::not_found("User not found"));
    }

    info!("User {} deactivated by {}", user_id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

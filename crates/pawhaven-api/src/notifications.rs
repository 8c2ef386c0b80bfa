use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, error, info};
use uuid::Uuid;

use pawhaven_db::models::{LostFoundRow, NewNotification, NotificationRow, RescueReportRow};
use pawhaven_types::api::{
    Claims, Detail, NearbyNotificationForm, NotificationCreate, NotificationResponse,
};
use pawhaven_types::enums::NotificationKind;

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Form, Json, Path};
use crate::geo;
use crate::run_blocking;
use crate::state::AppState;

/// Reports closer than this to the caller produce a notification.
pub const NEARBY_RADIUS_KM: f64 = 10.0;

fn notification_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        notif_id: convert::uuid(&row.id, "notification id"),
        user_id: convert::uuid(&row.user_id, "notification user id"),
        message: row.message,
        timestamp: convert::timestamp(&row.created_at, "notification created_at"),
        viewed: row.viewed,
        notif_type: convert::opt_enum(row.kind.as_deref(), "notification kind"),
        chat_id: convert::opt_uuid(row.chat_id.as_deref(), "notification chat id"),
        report_id: convert::opt_uuid(row.report_id.as_deref(), "notification report id"),
    }
}

/// Notifications `user_id` should receive for reports near `origin`. The
/// report lists are expected to hold other users' located reports only.
pub fn nearby_notifications(
    user_id: &str,
    origin: (f64, f64),
    lost: &[LostFoundRow],
    rescues: &[RescueReportRow],
) -> Vec<NewNotification> {
    let lost = lost
        .iter()
        .filter(|r| geo::within(origin, r.latitude, r.longitude, NEARBY_RADIUS_KM))
        .map(|r| NewNotification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            message: format!(
                "Nearby lost pet: {} at {}",
                r.pet_name.as_deref().unwrap_or("Unknown pet"),
                r.location
            ),
            kind: Some(NotificationKind::LostPet.as_str().to_string()),
            chat_id: r.chat_id.clone(),
            report_id: Some(r.id.clone()),
        });

    let rescues = rescues
        .iter()
        .filter(|r| geo::within(origin, r.latitude, r.longitude, NEARBY_RADIUS_KM))
        .map(|r| NewNotification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            message: format!(
                "Rescue alert nearby ({}) - {}",
                r.alert_type,
                r.description.as_deref().unwrap_or("No description")
            ),
            kind: Some(NotificationKind::Rescue.as_str().to_string()),
            chat_id: r.chat_id.clone(),
            report_id: Some(r.id.clone()),
        });

    lost.chain(rescues).collect()
}

async fn load_own(state: &AppState, claims: &Claims, id: Uuid) -> ApiResult<NotificationRow> {
    let nid = id.to_string();
    let row = run_blocking(state, move |db| db.get_notification(&nid))
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    if row.user_id != claims.sub.to_string() {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(row)
}

pub async fn create_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NotificationCreate>,
) -> ApiResult<impl IntoResponse> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }
    let notification = NewNotification {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.to_string(),
        message: req.message,
        kind: None,
        chat_id: None,
        report_id: None,
    };
    let row = run_blocking(&state, move |db| db.create_notification(&notification)).await?;
    Ok((StatusCode::CREATED, Json(notification_response(row))))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let uid = claims.sub.to_string();
    let rows = run_blocking(&state, move |db| db.list_notifications(&uid)).await?;
    Ok(Json(rows.into_iter().map(notification_response).collect()))
}

pub async fn get_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    Ok(Json(notification_response(load_own(&state, &claims, id).await?)))
}

pub async fn mark_viewed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let row = load_own(&state, &claims, id).await?;
    let nid = row.id;
    let row = run_blocking(&state, move |db| {
        db.mark_notification_viewed(&nid)?;
        db.get_notification(&nid)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(Json(notification_response(row)))
}

/// Accept the caller's position and scan for nearby reports in the
/// background. The response does not wait for the scan.
pub async fn nearby(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(form): Form<NearbyNotificationForm>,
) -> ApiResult<(StatusCode, Json<Detail>)> {
    geo::validate_point(form.latitude, form.longitude)?;

    let origin = (form.latitude, form.longitude);
    let user_id = claims.sub.to_string();
    let task_state = state.clone();
    tokio::spawn(async move {
        let uid = user_id.clone();
        let result = run_blocking(&task_state, move |db| {
            let lost = db.list_located_lost_found_reports(Some(&uid))?;
            let rescues = db.list_located_rescue_reports(Some(&uid))?;
            let mut created = 0usize;
            for notification in nearby_notifications(&uid, origin, &lost, &rescues) {
                if db.create_notification_if_absent(&notification)? {
                    created += 1;
                }
            }
            Ok(created)
        })
        .await;
        match result {
            Ok(created) => debug!("Nearby scan for {} created {} notifications", user_id, created),
            Err(e) => error!("Nearby notification scan for {} failed: {}", user_id, e),
        }
    });

    info!("Nearby notification scan started for {}", claims.sub);
    Ok((
        StatusCode::ACCEPTED,
        Json(Detail {
            detail: "Nearby notification generation started".into(),
        }),
    ))
}

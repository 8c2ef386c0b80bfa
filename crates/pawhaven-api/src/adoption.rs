use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use pawhaven_db::Contribution;
use pawhaven_db::models::{AdoptionRequestRow, NewAdoptionRequest, NewChat, PetRow};
use pawhaven_types::api::{
    AdoptionRequestCreate, AdoptionRequestResponse, AdoptionRequestUpdate, Claims,
};
use pawhaven_types::enums::{AdoptionStatus, ChatKind};

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::leaderboard::{award_best_effort, award_chat_best_effort};
use crate::pets::{new_pet, pet_response};
use crate::run_blocking;
use crate::state::AppState;

const CREATE_POINTS: i64 = 10;
const SETTLE_POINTS_PER_MESSAGE: i64 = 1;

fn request_response((req, pet): (AdoptionRequestRow, PetRow)) -> AdoptionRequestResponse {
    AdoptionRequestResponse {
        id: convert::uuid(&req.id, "adoption request id"),
        pet: pet_response(pet),
        requester_id: convert::uuid(&req.requester_id, "requester id"),
        description: req.description,
        status: convert::enum_or(&req.status, AdoptionStatus::Pending, "adoption status"),
        chat_id: convert::opt_uuid(req.chat_id.as_deref(), "adoption chat id"),
        created_at: convert::timestamp(&req.created_at, "adoption created_at"),
        updated_at: convert::timestamp(&req.updated_at, "adoption updated_at"),
    }
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<(AdoptionRequestRow, PetRow)> {
    let id = id.to_string();
    run_blocking(state, move |db| db.get_adoption_request(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Adoption request not found"))
}

pub async fn create_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AdoptionRequestCreate>,
) -> ApiResult<impl IntoResponse> {
    let pet = new_pet(claims.sub, req.pet)?;
    let request = NewAdoptionRequest {
        id: Uuid::new_v4().to_string(),
        requester_id: claims.sub.to_string(),
        description: req.description,
    };
    let chat = NewChat {
        id: Uuid::new_v4().to_string(),
        kind: ChatKind::Adoption.as_str().to_string(),
        related_entity_id: Some(request.id.clone()),
        creator_id: claims.sub.to_string(),
    };

    let created = run_blocking(&state, move |db| {
        db.create_adoption_request(&pet, &request, &chat)
    })
    .await?;
    info!("Adoption request {} created by {}", created.0.id, claims.sub);

    award_best_effort(&state, claims.sub, CREATE_POINTS, Contribution::Adoption).await;
    Ok((StatusCode::CREATED, Json(request_response(created))))
}

/// Requests made by the caller.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<AdoptionRequestResponse>>> {
    let uid = claims.sub.to_string();
    let rows = run_blocking(&state, move |db| db.list_adoption_requests_by_requester(&uid)).await?;
    Ok(Json(rows.into_iter().map(request_response).collect()))
}

/// Everyone else's requests whose pet still needs a home.
pub async fn list_open(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<AdoptionRequestResponse>>> {
    let uid = claims.sub.to_string();
    let rows = run_blocking(&state, move |db| db.list_open_adoption_requests(&uid)).await?;
    Ok(Json(rows.into_iter().map(request_response).collect()))
}

pub async fn get_request(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdoptionRequestResponse>> {
    Ok(Json(request_response(load(&state, id).await?)))
}

pub async fn get_by_chat(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> ApiResult<Json<AdoptionRequestResponse>> {
    let chat = chat_id.to_string();
    let found = run_blocking(&state, move |db| db.get_adoption_request_by_chat(&chat))
        .await?
        .ok_or_else(|| ApiError::not_found("Adoption request not found"))?;
    Ok(Json(request_response(found)))
}

/// Description belongs to the requester, status to the pet's owner. Moving
/// into Approved or Completed adopts the pet in the same transaction and,
/// once committed, rewards the people who talked it through in the chat.
pub async fn update_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<AdoptionRequestUpdate>,
) -> ApiResult<Json<AdoptionRequestResponse>> {
    let (mut request, pet) = load(&state, id).await?;
    let caller = claims.sub.to_string();

    if let Some(description) = update.description {
        if request.requester_id != caller {
            return Err(ApiError::forbidden(
                "Only the requester can edit the description",
            ));
        }
        request.description = Some(description);
    }

    let mut status = convert::enum_or(&request.status, AdoptionStatus::Pending, "adoption status");
    if let Some(raw) = update.status.as_deref() {
        if pet.owner_id != caller {
            return Err(ApiError::forbidden("Only the pet owner can change the status"));
        }
        status = raw
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid status '{}'", raw)))?;
        request.status = status.as_str().to_string();
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
        request.chat_id = Some(chat);
    }

    let settle = status.settles_pet() && !pet.is_adopted;
    let linked_chat = request.chat_id.clone();
    let request_id = request.id.clone();
    let (adopted_now, refreshed) = run_blocking(&state, move |db| {
        let adopted_now = db.update_adoption_request(&request, settle)?;
        Ok((adopted_now, db.get_adoption_request(&request_id)?))
    })
    .await?;
    let refreshed = refreshed.ok_or_else(|| ApiError::not_found("Adoption request not found"))?;

    if adopted_now {
        info!("Pet {} adopted through request {}", pet.id, id);
        if let Some(chat) = linked_chat {
            award_chat_best_effort(&state, chat, SETTLE_POINTS_PER_MESSAGE, Contribution::Adoption)
                .await;
        }
    }
    Ok(Json(request_response(refreshed)))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let (request, pet) = load(&state, id).await?;
    let caller = claims.sub.to_string();
    if request.requester_id != caller && pet.owner_id != caller {
        return Err(ApiError::forbidden("Not authorized to delete this request"));
    }

    let rid = request.id;
    run_blocking(&state, move |db| db.delete_adoption_request(&rid)).await?;
    info!("Adoption request {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

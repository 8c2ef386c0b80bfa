use axum::{Extension, extract::State, http::StatusCode};
use tracing::{debug, info};
use uuid::Uuid;

use pawhaven_db::models::{ChatMessageRow, ChatRow, NewChat};
use pawhaven_types::api::{
    ChatCreate, ChatMessageCreate, ChatMessageQuery, ChatMessageResponse, ChatResponse, Claims,
    JoinChatResponse,
};
use pawhaven_types::enums::ChatKind;

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::run_blocking;
use crate::state::AppState;

const MAX_MESSAGE_LIMIT: u32 = 200;

fn chat_response(row: ChatRow, members: Vec<String>) -> ChatResponse {
    ChatResponse {
        chat_id: convert::uuid(&row.id, "chat id"),
        chat_type: convert::enum_or(&row.kind, ChatKind::Generic, "chat kind"),
        related_entity_id: convert::opt_uuid(row.related_entity_id.as_deref(), "related entity id"),
        creator_id: convert::uuid(&row.creator_id, "chat creator id"),
        members: members
            .iter()
            .map(|m| convert::uuid(m, "chat member id"))
            .collect(),
        created_at: convert::timestamp(&row.created_at, "chat created_at"),
    }
}

fn message_response(row: ChatMessageRow) -> ChatMessageResponse {
    ChatMessageResponse {
        message_id: convert::uuid(&row.id, "message id"),
        chat_id: convert::uuid(&row.chat_id, "message chat id"),
        sender_id: convert::uuid(&row.sender_id, "message sender id"),
        content: row.content,
        created_at: convert::timestamp(&row.created_at, "message created_at"),
    }
}

/// Open the chat for an entity, or join the one that already exists.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChatCreate>,
) -> ApiResult<(StatusCode, Json<ChatResponse>)> {
    let chat = NewChat {
        id: Uuid::new_v4().to_string(),
        kind: req.chat_type.as_str().to_string(),
        related_entity_id: req.related_entity_id.map(|id| id.to_string()),
        creator_id: claims.sub.to_string(),
    };

    let (row, created, members) = run_blocking(&state, move |db| {
        let (row, created) = db.open_chat(&chat)?;
        let members = db.get_chat_members(&row.id)?;
        Ok((row, created, members))
    })
    .await?;

    let status = if created {
        info!("Chat {} ({}) created by {}", row.id, row.kind, claims.sub);
        StatusCode::CREATED
    } else {
        debug!("User {} joined existing chat {}", claims.sub, row.id);
        StatusCode::OK
    };
    Ok((status, Json(chat_response(row, members))))
}

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ChatResponse>>> {
    let uid = claims.sub.to_string();
    let chats = run_blocking(&state, move |db| db.list_chats_for_user(&uid)).await?;
    Ok(Json(
        chats
            .into_iter()
            .map(|(row, members)| chat_response(row, members))
            .collect(),
    ))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> ApiResult<Json<ChatResponse>> {
    let id = chat_id.to_string();
    let found = run_blocking(&state, move |db| {
        match db.get_chat(&id)? {
            Some(row) => {
                let members = db.get_chat_members(&id)?;
                Ok(Some((row, members)))
            }
            None => Ok(None),
        }
    })
    .await?;
    let (row, members) = found.ok_or_else(|| ApiError::not_found("Chat not found"))?;
    Ok(Json(chat_response(row, members)))
}

pub async fn join_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
) -> ApiResult<Json<JoinChatResponse>> {
    let id = chat_id.to_string();
    let uid = claims.sub.to_string();
    let outcome = run_blocking(&state, move |db| {
        if db.get_chat(&id)?.is_none() {
            return Ok(None);
        }
        Ok(Some(db.add_chat_member(&id, &uid)?))
    })
    .await?;

    match outcome {
        None => Err(ApiError::not_found("Chat not found")),
        Some(false) => Err(ApiError::conflict("Already a member of this chat")),
        Some(true) => {
            info!("User {} joined chat {}", claims.sub, chat_id);
            Ok(Json(JoinChatResponse {
                detail: "Joined chat".into(),
                chat_id,
            }))
        }
    }
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
    Query(q): Query<ChatMessageQuery>,
) -> ApiResult<Json<Vec<ChatMessageResponse>>> {
    let limit = q.limit.clamp(1, MAX_MESSAGE_LIMIT);
    let id = chat_id.to_string();
    let messages = run_blocking(&state, move |db| {
        if db.get_chat(&id)?.is_none() {
            return Ok(None);
        }
        Ok(Some(db.list_chat_messages(&id, limit)?))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Chat not found"))?;
    Ok(Json(messages.into_iter().map(message_response).collect()))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<ChatMessageCreate>,
) -> ApiResult<Json<ChatMessageResponse>> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Message content cannot be empty"));
    }

    let id = chat_id.to_string();
    let uid = claims.sub.to_string();
    let (exists, member) = {
        let (id, uid) = (id.clone(), uid.clone());
        run_blocking(&state, move |db| {
            let exists = db.get_chat(&id)?.is_some();
            Ok((exists, exists && db.is_chat_member(&id, &uid)?))
        })
        .await?
    };
    if !exists {
        return Err(ApiError::not_found("Chat not found"));
    }
    if !member {
        return Err(ApiError::forbidden("Not a member of this chat"));
    }

    let message_id = Uuid::new_v4().to_string();
    let row = run_blocking(&state, move |db| {
        db.insert_chat_message(&message_id, &id, &uid, &content)
    })
    .await?;
    debug!("Message {} posted to chat {} by {}", row.id, chat_id, claims.sub);
    Ok(Json(message_response(row)))
}

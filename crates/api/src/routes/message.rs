use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::{DateTime, oid::ObjectId};
use jiffyjobs_db::models::{ChatMessage, NotificationEvent};
use jiffyjobs_services::dao::base::PaginationParams;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub body: String,
    pub read_at: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
}

/// Newest-window page of a thread's messages, newest first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(thread_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tid = ObjectId::parse_str(&thread_id)
        .map_err(|_| ApiError::BadRequest("Invalid thread_id".to_string()))?;

    let thread = state.threads.find_by_id(tid).await?;
    if !thread.is_participant(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Not a participant of this thread".to_string(),
        ));
    }

    let result = state.messages.find_in_thread(tid, &params).await?;
    let items: Vec<MessageResponse> = result.items.into_iter().map(to_response).collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

/// Persist a message and fan it out: `new-message` to the thread room and
/// a persisted `NewMessage` notification (plus push) for the receiver.
/// The REST write is the durable commit; broadcast failures never affect
/// the response.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(thread_id): Path<String>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let tid = ObjectId::parse_str(&thread_id)
        .map_err(|_| ApiError::BadRequest("Invalid thread_id".to_string()))?;

    let trimmed = body.body.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(
            "Message body must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > state.settings.realtime.max_message_len {
        return Err(ApiError::Validation(format!(
            "Message body exceeds {} characters",
            state.settings.realtime.max_message_len
        )));
    }

    let thread = state.threads.find_by_id(tid).await?;
    if !thread.is_participant(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Not a participant of this thread".to_string(),
        ));
    }

    let message = state
        .messages
        .create(&thread, auth.user_id, trimmed.to_string())
        .await?;
    state.threads.touch(tid).await?;

    let response = to_response(message.clone());
    let receiver_id = message.receiver_id;
    let message_id = message.id.unwrap_or_default();

    // Room fan-out: every connection in the room, including the sender's
    // other tabs. Consumers dedup by message id.
    let event = serde_json::json!({
        "type": "new-message",
        "data": { "thread_id": thread_id, "message": &response },
    });
    crate::ws::dispatcher::publish_to_room(&state.ws_storage, &tid, &event).await;

    // Persisted notification so the receiver discovers the message even
    // with no live connection.
    let notification = state
        .notifications
        .create(
            receiver_id,
            "New message".to_string(),
            preview(trimmed),
            NotificationEvent::NewMessage {
                thread_id: tid.to_hex(),
                message_id: message_id.to_hex(),
                sender_id: auth.user_id.to_hex(),
            },
        )
        .await?;

    let notification_event = serde_json::json!({
        "type": "new-notification",
        "data": { "notification": crate::routes::notification::to_response(notification) },
    });
    crate::ws::dispatcher::publish_to_user(&state.ws_storage, &receiver_id, &notification_event)
        .await;

    Ok(Json(response))
}

/// Mark every unread message addressed to the caller as read, then tell
/// the room so the counterparty's view picks up `read_at` without a
/// refetch.
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(thread_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tid = ObjectId::parse_str(&thread_id)
        .map_err(|_| ApiError::BadRequest("Invalid thread_id".to_string()))?;

    let thread = state.threads.find_by_id(tid).await?;
    if !thread.is_participant(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Not a participant of this thread".to_string(),
        ));
    }

    let read_at = DateTime::now();
    let marked = state
        .messages
        .mark_thread_read(tid, auth.user_id, read_at)
        .await?;

    if marked > 0 {
        let event = serde_json::json!({
            "type": "thread-read",
            "data": {
                "thread_id": thread_id,
                "reader_id": auth.user_id.to_hex(),
                "read_at": read_at.try_to_rfc3339_string().unwrap_or_default(),
            },
        });
        crate::ws::dispatcher::publish_to_room(&state.ws_storage, &tid, &event).await;
    }

    Ok(Json(serde_json::json!({ "marked": marked })))
}

/// Sender-only soft delete. Read state is untouched; the body is redacted
/// in every subsequent response.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((thread_id, message_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tid = ObjectId::parse_str(&thread_id)
        .map_err(|_| ApiError::BadRequest("Invalid thread_id".to_string()))?;
    let mid = ObjectId::parse_str(&message_id)
        .map_err(|_| ApiError::BadRequest("Invalid message_id".to_string()))?;

    let thread = state.threads.find_by_id(tid).await?;
    if !thread.is_participant(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Not a participant of this thread".to_string(),
        ));
    }

    state.messages.soft_delete(mid, auth.user_id).await?;

    let event = serde_json::json!({
        "type": "message-deleted",
        "data": { "thread_id": thread_id, "message_id": message_id },
    });
    crate::ws::dispatcher::publish_to_room(&state.ws_storage, &tid, &event).await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn preview(body: &str) -> String {
    const PREVIEW_LEN: usize = 80;
    if body.chars().count() <= PREVIEW_LEN {
        body.to_string()
    } else {
        let mut s: String = body.chars().take(PREVIEW_LEN).collect();
        s.push('…');
        s
    }
}

pub(crate) fn to_response(m: ChatMessage) -> MessageResponse {
    MessageResponse {
        id: m.id.map(|id| id.to_hex()).unwrap_or_default(),
        thread_id: m.thread_id.to_hex(),
        sender_id: m.sender_id.to_hex(),
        receiver_id: m.receiver_id.to_hex(),
        body: if m.is_deleted { String::new() } else { m.body },
        read_at: m
            .read_at
            .and_then(|t| t.try_to_rfc3339_string().ok()),
        is_deleted: m.is_deleted,
        created_at: m.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

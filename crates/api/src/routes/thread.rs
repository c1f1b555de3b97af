use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use jiffyjobs_db::models::ChatThread;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub task_id: String,
    pub counterparty_id: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub id: String,
    pub task_id: String,
    pub poster_id: String,
    pub helper_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Find-or-create the thread between the caller and a counterparty for a
/// task. The task's poster is always the thread's poster side; the caller
/// must be one of the two parties. Repeat calls return the same thread.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateThreadRequest>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let task_id = ObjectId::parse_str(&body.task_id)
        .map_err(|_| ApiError::BadRequest("Invalid task_id".to_string()))?;
    let counterparty_id = ObjectId::parse_str(&body.counterparty_id)
        .map_err(|_| ApiError::BadRequest("Invalid counterparty_id".to_string()))?;

    if counterparty_id == auth.user_id {
        return Err(ApiError::Validation(
            "Cannot open a thread with yourself".to_string(),
        ));
    }

    let task = state.tasks.find_by_id(task_id).await?;
    state.users.find_by_id(counterparty_id).await?;

    let (poster_id, helper_id) = if task.poster_id == auth.user_id {
        (auth.user_id, counterparty_id)
    } else if task.poster_id == counterparty_id {
        (counterparty_id, auth.user_id)
    } else {
        return Err(ApiError::Forbidden(
            "Neither party posted this task".to_string(),
        ));
    };

    let thread = state
        .threads
        .find_or_create(task_id, poster_id, helper_id)
        .await?;

    Ok(Json(to_response(thread)))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ThreadResponse>>, ApiError> {
    let threads = state.threads.find_for_user(auth.user_id).await?;
    Ok(Json(threads.into_iter().map(to_response).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let tid = ObjectId::parse_str(&thread_id)
        .map_err(|_| ApiError::BadRequest("Invalid thread_id".to_string()))?;

    let thread = state.threads.find_by_id(tid).await?;
    if !thread.is_participant(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Not a participant of this thread".to_string(),
        ));
    }

    Ok(Json(to_response(thread)))
}

pub(crate) fn to_response(t: ChatThread) -> ThreadResponse {
    ThreadResponse {
        id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
        task_id: t.task_id.to_hex(),
        poster_id: t.poster_id.to_hex(),
        helper_id: t.helper_id.to_hex(),
        created_at: t.created_at.try_to_rfc3339_string().unwrap_or_default(),
        updated_at: t.updated_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use jiffyjobs_db::models::{NotificationEvent, Task};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignHelperRequest {
    pub helper_id: String,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub poster_id: String,
    pub helper_id: Option<String>,
    pub status: String,
    pub created_at: String,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("Title must not be empty".to_string()));
    }

    let task = state.tasks.create(body.title, auth.user_id).await?;
    Ok((StatusCode::CREATED, Json(to_response(task))))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let tid = ObjectId::parse_str(&task_id)
        .map_err(|_| ApiError::BadRequest("Invalid task_id".to_string()))?;
    let task = state.tasks.find_by_id(tid).await?;
    Ok(Json(to_response(task)))
}

/// Assign a helper to the task. Creates the conversation thread for the
/// (task, poster, helper) triple and notifies the helper; the REST write
/// succeeds regardless of realtime fan-out outcome.
pub async fn assign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<AssignHelperRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let tid = ObjectId::parse_str(&task_id)
        .map_err(|_| ApiError::BadRequest("Invalid task_id".to_string()))?;
    let helper_id = ObjectId::parse_str(&body.helper_id)
        .map_err(|_| ApiError::BadRequest("Invalid helper_id".to_string()))?;

    if helper_id == auth.user_id {
        return Err(ApiError::Validation(
            "Cannot assign yourself as helper".to_string(),
        ));
    }
    // Helper must exist before we hand them a thread
    state.users.find_by_id(helper_id).await?;

    let task = state
        .tasks
        .assign_helper(tid, auth.user_id, helper_id)
        .await?;

    state
        .threads
        .find_or_create(tid, auth.user_id, helper_id)
        .await?;

    let notification = state
        .notifications
        .create(
            helper_id,
            "You were assigned a task".to_string(),
            task.title.clone(),
            NotificationEvent::HelperAssigned {
                task_id: tid.to_hex(),
                helper_id: helper_id.to_hex(),
            },
        )
        .await?;

    let event = serde_json::json!({
        "type": "new-notification",
        "data": { "notification": crate::routes::notification::to_response(notification) },
    });
    crate::ws::dispatcher::publish_to_user(&state.ws_storage, &helper_id, &event).await;

    Ok(Json(to_response(task)))
}

fn to_response(t: Task) -> TaskResponse {
    TaskResponse {
        id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
        title: t.title,
        poster_id: t.poster_id.to_hex(),
        helper_id: t.helper_id.map(|h| h.to_hex()),
        status: format!("{:?}", t.status).to_lowercase(),
        created_at: t.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::oid::ObjectId;
use jiffyjobs_db::models::{Notification, NotificationEvent};
use jiffyjobs_services::dao::base::PaginationParams;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub event: NotificationEvent,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut pagination = PaginationParams::default();
    if let Some(page) = query.page {
        pagination.page = page;
    }
    if let Some(per_page) = query.per_page {
        pagination.per_page = per_page;
    }

    let result = state
        .notifications
        .find_for_user(auth.user_id, query.unread_only, &pagination)
        .await?;
    let unread_count = state.notifications.unread_count(auth.user_id).await?;

    let items: Vec<NotificationResponse> = result.items.into_iter().map(to_response).collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
        "unread_count": unread_count,
    })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let nid = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification_id".to_string()))?;

    // Distinguish missing/foreign from already-read
    let existing = state.notifications.base.find_by_id(nid).await?;
    if existing.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Notification belongs to another user".to_string(),
        ));
    }

    let marked = state.notifications.mark_read(nid, auth.user_id).await?;

    if marked {
        // Other tabs keep their badge in sync
        let event = serde_json::json!({
            "type": "notification-read",
            "data": { "notification_id": notification_id },
        });
        crate::ws::dispatcher::publish_to_user(&state.ws_storage, &auth.user_id, &event).await;
    }

    Ok(Json(serde_json::json!({ "marked": marked })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let marked = state.notifications.mark_all_read(auth.user_id).await?;

    if marked > 0 {
        let event = serde_json::json!({
            "type": "notifications-read",
            "data": { "count": marked },
        });
        crate::ws::dispatcher::publish_to_user(&state.ws_storage, &auth.user_id, &event).await;
    }

    Ok(Json(serde_json::json!({ "marked": marked })))
}

pub(crate) fn to_response(n: Notification) -> NotificationResponse {
    NotificationResponse {
        id: n.id.map(|id| id.to_hex()).unwrap_or_default(),
        user_id: n.user_id.to_hex(),
        title: n.title,
        body: n.body,
        event: n.event,
        is_read: n.is_read,
        read_at: n.read_at.and_then(|t| t.try_to_rfc3339_string().ok()),
        created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

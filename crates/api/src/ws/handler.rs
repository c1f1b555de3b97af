use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bson::oid::ObjectId;
use futures::StreamExt;
use jiffyjobs_services::dao::base::DaoError;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let claims = match state.auth.verify_access_token(&params.token) {
        Ok(c) => c,
        Err(_) => {
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    let user_id = match ObjectId::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "Invalid user ID").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: ObjectId) {
    let connection_id = Uuid::new_v4().to_string();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));

    state
        .ws_storage
        .add(connection_id.clone(), user_id, sender.clone());

    // Send connected message
    let hello = serde_json::json!({
        "type": "connected",
        "data": { "user_id": user_id.to_hex(), "connection_id": connection_id },
    });
    super::dispatcher::send_to_connection(&state.ws_storage, &connection_id, &hello).await;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &user_id, &connection_id, &text).await;
            }
            Ok(Message::Ping(_)) => {
                // axum answers transport-level pings itself
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup drops the registry entry and every room membership
    state.ws_storage.remove(&connection_id);
    info!(?user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    user_id: &ObjectId,
    connection_id: &str,
    text: &str,
) {
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return,
    };

    let msg_type = parsed.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let data = parsed.get("data");

    debug!(?user_id, %connection_id, msg_type, "WS message received");

    match msg_type {
        "ping" => {
            let pong = serde_json::json!({ "type": "pong" });
            super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &pong).await;
        }
        "join-thread" => {
            handle_join_thread(state, user_id, connection_id, data).await;
        }
        "leave-thread" => {
            if let Some(thread_id) = parse_thread_id(data) {
                state.ws_storage.leave_room(thread_id, connection_id);
                let ack = serde_json::json!({
                    "type": "thread-left",
                    "data": { "thread_id": thread_id.to_hex() },
                });
                super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &ack)
                    .await;
            }
        }
        _ => {
            debug!(?user_id, msg_type, "Unknown WS message type");
        }
    }
}

/// Join a thread's room. The REST layer is the authority on thread
/// contents; the gateway still verifies the connected user is one of the
/// thread's two parties and rejects anyone else. Errors go only to the
/// requesting connection.
async fn handle_join_thread(
    state: &AppState,
    user_id: &ObjectId,
    connection_id: &str,
    data: Option<&serde_json::Value>,
) {
    let Some(thread_id) = parse_thread_id(data) else {
        send_error(state, connection_id, "bad_request", "Missing or invalid thread_id").await;
        return;
    };

    let thread = match state.threads.find_by_id(thread_id).await {
        Ok(t) => t,
        Err(DaoError::NotFound) => {
            send_error(state, connection_id, "not_found", "Thread does not exist").await;
            return;
        }
        Err(e) => {
            warn!(%thread_id, %e, "Thread lookup failed");
            send_error(state, connection_id, "internal", "Thread lookup failed").await;
            return;
        }
    };

    if !thread.is_participant(*user_id) {
        send_error(
            state,
            connection_id,
            "unauthorized",
            "Not a participant of this thread",
        )
        .await;
        return;
    }

    state.ws_storage.join_room(thread_id, connection_id);

    let ack = serde_json::json!({
        "type": "thread-joined",
        "data": { "thread_id": thread_id.to_hex() },
    });
    super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &ack).await;
}

async fn send_error(state: &AppState, connection_id: &str, code: &str, message: &str) {
    let msg = serde_json::json!({
        "type": "error",
        "data": { "code": code, "message": message },
    });
    super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &msg).await;
}

fn parse_thread_id(data: Option<&serde_json::Value>) -> Option<ObjectId> {
    data.and_then(|d| d.get("thread_id"))
        .and_then(|t| t.as_str())
        .and_then(|s| ObjectId::parse_str(s).ok())
}

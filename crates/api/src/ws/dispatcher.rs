use axum::extract::ws::Message;
use bson::oid::ObjectId;
use futures::SinkExt;
use tracing::{debug, warn};

use super::storage::WsStorage;

/// Publish an event to every connection currently in a thread's room.
/// Best-effort: a failed write prunes the dead connection and is never
/// surfaced to the publisher. Durability is the store's job via REST pull.
pub async fn publish_to_room(
    ws_storage: &WsStorage,
    thread_id: &ObjectId,
    message: &serde_json::Value,
) {
    let text = serde_json::to_string(message).unwrap_or_default();

    for (conn_id, sender) in ws_storage.room_senders(thread_id) {
        send_or_prune(ws_storage, &conn_id, &sender, &text).await;
    }
}

/// Publish an event to every connection of one user, regardless of room
/// membership.
pub async fn publish_to_user(
    ws_storage: &WsStorage,
    user_id: &ObjectId,
    message: &serde_json::Value,
) {
    let text = serde_json::to_string(message).unwrap_or_default();

    for (conn_id, sender) in ws_storage.user_senders(user_id) {
        send_or_prune(ws_storage, &conn_id, &sender, &text).await;
    }
}

/// Send an event to one specific connection (join acks, errors).
pub async fn send_to_connection(
    ws_storage: &WsStorage,
    connection_id: &str,
    message: &serde_json::Value,
) {
    let text = serde_json::to_string(message).unwrap_or_default();

    if let Some(sender) = ws_storage.sender_of(connection_id) {
        send_or_prune(ws_storage, connection_id, &sender, &text).await;
    }
}

async fn send_or_prune(
    ws_storage: &WsStorage,
    connection_id: &str,
    sender: &super::storage::WsSender,
    text: &str,
) {
    let mut guard = sender.lock().await;
    if let Err(e) = guard.send(Message::Text(text.to_string().into())).await {
        warn!(%connection_id, %e, "WS send failed, pruning connection");
        drop(guard);
        ws_storage.remove(connection_id);
    } else {
        debug!(%connection_id, "WS message sent");
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Decode error: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Message as the REST/WS surface serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub body: String,
    pub read_at: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub event: serde_json::Value,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// Server -> client gateway events.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Connected {
        user_id: String,
        connection_id: String,
    },
    Pong,
    ThreadJoined {
        thread_id: String,
    },
    ThreadLeft {
        thread_id: String,
    },
    NewMessage {
        thread_id: String,
        message: MessageRecord,
    },
    NewNotification {
        notification: NotificationRecord,
    },
    NotificationRead {
        notification_id: String,
    },
    NotificationsRead {
        count: u64,
    },
    ThreadRead {
        thread_id: String,
        reader_id: String,
        read_at: String,
    },
    MessageDeleted {
        thread_id: String,
        message_id: String,
    },
    Error {
        code: String,
        message: String,
    },
}

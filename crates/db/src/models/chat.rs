use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// One conversation per (task, poster, helper) triple, enforced by a
/// unique index. Immutable after creation except `updated_at`, which is
/// bumped when a message lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub task_id: ObjectId,
    pub poster_id: ObjectId,
    pub helper_id: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub thread_id: ObjectId,
    pub sender_id: ObjectId,
    pub receiver_id: ObjectId,
    pub body: String,
    /// Set at most once (unread -> read); never unset.
    pub read_at: Option<DateTime>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime,
}

impl ChatThread {
    pub const COLLECTION: &'static str = "threads";

    /// Whether `user_id` is the poster or the helper of this thread.
    pub fn is_participant(&self, user_id: ObjectId) -> bool {
        self.poster_id == user_id || self.helper_id == user_id
    }

    /// The participant opposite to `user_id`. Callers must have checked
    /// participation first.
    pub fn counterparty(&self, user_id: ObjectId) -> ObjectId {
        if self.poster_id == user_id {
            self.helper_id
        } else {
            self.poster_id
        }
    }
}

impl ChatMessage {
    pub const COLLECTION: &'static str = "messages";
}

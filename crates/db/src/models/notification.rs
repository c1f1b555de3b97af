use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    pub body: String,
    pub event: NotificationEvent,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
}

/// Tagged union of notification payloads. The payload shape is fixed per
/// type so consumers never pattern-match against an untyped metadata bag.
/// Ids are hex strings so the payload serializes the same over the wire
/// and at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    NewMessage {
        thread_id: String,
        message_id: String,
        sender_id: String,
    },
    BidAccepted {
        task_id: String,
        bid_id: String,
    },
    HelperAssigned {
        task_id: String,
        helper_id: String,
    },
    TaskUpdated {
        task_id: String,
    },
    ContractCreated {
        task_id: String,
        contract_id: String,
    },
    ReviewRequested {
        task_id: String,
    },
    Other {
        note: String,
    },
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Minimal task anchor for threads and notification payloads. The full
/// marketplace lifecycle (bids, contracts, payment) lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub poster_id: ObjectId,
    pub helper_id: Option<ObjectId>,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    Assigned,
    Completed,
}

impl Task {
    pub const COLLECTION: &'static str = "tasks";
}

use axum::extract::ws::{Message, WebSocket};
use bson::oid::ObjectId;
use dashmap::DashMap;
use futures::stream::SplitSink;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

struct ConnectionEntry {
    user_id: ObjectId,
    sender: WsSender,
}

/// Process-scoped registry of live connections and thread rooms. One
/// instance is created at server start and owned by `AppState`; all entries
/// for a connection are dropped when that connection closes.
///
/// A user can hold several connections (multiple tabs); a room holds the
/// connection ids currently subscribed to one thread's live updates.
pub struct WsStorage {
    connections: DashMap<String, ConnectionEntry>,
    users: DashMap<ObjectId, Vec<String>>,
    rooms: DashMap<ObjectId, Vec<String>>,
}

impl WsStorage {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            users: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    pub fn add(&self, connection_id: String, user_id: ObjectId, sender: WsSender) {
        self.connections
            .insert(connection_id.clone(), ConnectionEntry { user_id, sender });
        self.users.entry(user_id).or_default().push(connection_id);
    }

    /// Drop a connection and every room membership it holds.
    pub fn remove(&self, connection_id: &str) {
        let Some((_, entry)) = self.connections.remove(connection_id) else {
            return;
        };

        if let Some(mut conns) = self.users.get_mut(&entry.user_id) {
            conns.retain(|c| c != connection_id);
            if conns.is_empty() {
                drop(conns);
                self.users.remove(&entry.user_id);
            }
        }

        self.rooms.retain(|_, members| {
            members.retain(|c| c != connection_id);
            !members.is_empty()
        });
    }

    pub fn join_room(&self, thread_id: ObjectId, connection_id: &str) {
        let mut members = self.rooms.entry(thread_id).or_default();
        if !members.iter().any(|c| c == connection_id) {
            members.push(connection_id.to_string());
        }
    }

    /// Leaving a room one is not in is a no-op.
    pub fn leave_room(&self, thread_id: ObjectId, connection_id: &str) {
        if let Some(mut members) = self.rooms.get_mut(&thread_id) {
            members.retain(|c| c != connection_id);
            if members.is_empty() {
                drop(members);
                self.rooms.remove(&thread_id);
            }
        }
    }

    /// All connections currently in a thread's room. No self-suppression:
    /// the sender's other tabs receive the publish too and dedup by id.
    pub fn room_senders(&self, thread_id: &ObjectId) -> Vec<(String, WsSender)> {
        let Some(members) = self.rooms.get(thread_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|conn_id| {
                self.connections
                    .get(conn_id)
                    .map(|e| (conn_id.clone(), e.sender.clone()))
            })
            .collect()
    }

    /// All connections registered under a user, regardless of rooms.
    pub fn user_senders(&self, user_id: &ObjectId) -> Vec<(String, WsSender)> {
        let Some(conn_ids) = self.users.get(user_id) else {
            return Vec::new();
        };
        conn_ids
            .iter()
            .filter_map(|conn_id| {
                self.connections
                    .get(conn_id)
                    .map(|e| (conn_id.clone(), e.sender.clone()))
            })
            .collect()
    }

    pub fn sender_of(&self, connection_id: &str) -> Option<WsSender> {
        self.connections
            .get(connection_id)
            .map(|e| e.sender.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_size(&self, thread_id: &ObjectId) -> usize {
        self.rooms.get(thread_id).map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for WsStorage {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::types::{MessageRecord, NotificationRecord};

/// One consistent, ordered view of a thread's messages fed by two
/// independent sources (gateway push, REST pull). Records merge by
/// identifier: an id already present is a no-op, an unseen one is
/// inserted at its creation-time position. Unread counts are derived at
/// call time, never stored, so they can't drift from the merged list.
pub struct ThreadTimeline {
    viewer_id: String,
    messages: Vec<TimelineMessage>,
    seen: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct TimelineMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub body: String,
    pub read_at: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of merging one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted {
        /// The record is addressed to the viewer and still unread; with
        /// the thread open the caller should issue mark-thread-read now.
        needs_read_receipt: bool,
    },
    Duplicate,
}

impl ThreadTimeline {
    pub fn new(viewer_id: impl Into<String>) -> Self {
        Self {
            viewer_id: viewer_id.into(),
            messages: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn merge(&mut self, record: &MessageRecord) -> Merge {
        if self.seen.contains(&record.id) {
            return Merge::Duplicate;
        }

        let created_at = parse_time(&record.created_at);
        let message = TimelineMessage {
            id: record.id.clone(),
            sender_id: record.sender_id.clone(),
            receiver_id: record.receiver_id.clone(),
            body: record.body.clone(),
            read_at: record.read_at.clone(),
            is_deleted: record.is_deleted,
            created_at,
        };

        // Insert at the position given by (created_at, id); the server's
        // creation-time total order is authoritative.
        let key = (created_at, record.id.clone());
        let pos = self
            .messages
            .partition_point(|m| (m.created_at, m.id.clone()) <= key);
        self.messages.insert(pos, message);
        self.seen.insert(record.id.clone());

        Merge::Inserted {
            needs_read_receipt: record.receiver_id == self.viewer_id
                && record.read_at.is_none(),
        }
    }

    /// Merge a pulled page (any order); returns how many were new.
    pub fn merge_page<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a MessageRecord>,
    ) -> usize {
        records
            .into_iter()
            .filter(|r| matches!(self.merge(r), Merge::Inserted { .. }))
            .count()
    }

    /// Apply a read receipt: every message addressed to `reader_id` that
    /// is still unread gets `read_at`, in place, without reordering.
    /// Already-read messages keep their timestamp (monotonic).
    pub fn apply_thread_read(&mut self, reader_id: &str, read_at: &str) {
        for m in &mut self.messages {
            if m.receiver_id == reader_id && m.read_at.is_none() {
                m.read_at = Some(read_at.to_string());
            }
        }
    }

    /// Soft-delete is a visible state change orthogonal to read state.
    pub fn apply_deleted(&mut self, message_id: &str) {
        if let Some(m) = self.messages.iter_mut().find(|m| m.id == message_id) {
            m.is_deleted = true;
            m.body.clear();
        }
    }

    /// Count of messages addressed to the viewer without a read
    /// timestamp. Derived, so it is always consistent with the list.
    pub fn unread_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.receiver_id == self.viewer_id && m.read_at.is_none())
            .count()
    }

    pub fn messages(&self) -> &[TimelineMessage] {
        &self.messages
    }

    pub fn ids(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Per-user notification feed with the same merge-by-identifier rule.
pub struct NotificationFeed {
    notifications: Vec<NotificationRecord>,
    seen: HashSet<String>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self {
            notifications: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn merge(&mut self, record: &NotificationRecord) -> bool {
        if self.seen.contains(&record.id) {
            return false;
        }

        let key = (parse_time(&record.created_at), record.id.clone());
        let pos = self
            .notifications
            .partition_point(|n| (parse_time(&n.created_at), n.id.clone()) <= key);
        self.notifications.insert(pos, record.clone());
        self.seen.insert(record.id.clone());
        true
    }

    pub fn merge_page<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a NotificationRecord>,
    ) -> usize {
        records.into_iter().filter(|r| self.merge(r)).count()
    }

    /// Unread -> read, in place; a second application is a no-op.
    pub fn mark_read(&mut self, notification_id: &str, read_at: &str) {
        if let Some(n) = self
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
        {
            if !n.is_read {
                n.is_read = true;
                n.read_at = Some(read_at.to_string());
            }
        }
    }

    pub fn mark_all_read(&mut self, read_at: &str) {
        for n in &mut self.notifications {
            if !n.is_read {
                n.is_read = true;
                n.read_at = Some(read_at.to_string());
            }
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

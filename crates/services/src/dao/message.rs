use bson::{DateTime, doc, oid::ObjectId};
use jiffyjobs_db::models::{ChatMessage, ChatThread};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

pub struct MessageDao {
    pub base: BaseDao<ChatMessage>,
}

impl MessageDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ChatMessage::COLLECTION),
        }
    }

    /// Persist a message inside `thread`. Sender and receiver are always
    /// the thread's two parties; the caller passes the sender and the
    /// receiver is derived, so the participant invariant cannot drift.
    pub async fn create(
        &self,
        thread: &ChatThread,
        sender_id: ObjectId,
        body: String,
    ) -> DaoResult<ChatMessage> {
        if !thread.is_participant(sender_id) {
            return Err(DaoError::Forbidden(
                "Sender is not a participant of this thread".to_string(),
            ));
        }

        let thread_id = thread.id.ok_or(DaoError::NotFound)?;
        let message = ChatMessage {
            id: None,
            thread_id,
            sender_id,
            receiver_id: thread.counterparty(sender_id),
            body,
            read_at: None,
            is_deleted: false,
            created_at: DateTime::now(),
        };

        let id = self.base.insert_one(&message).await?;
        self.base.find_by_id(id).await
    }

    /// Newest-window page of a thread's messages (newest first).
    pub async fn find_in_thread(
        &self,
        thread_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<ChatMessage>> {
        self.base
            .find_paginated(
                doc! { "thread_id": thread_id },
                Some(doc! { "created_at": -1 }),
                params,
            )
            .await
    }

    /// Mark every unread message addressed to `reader_id` as read.
    /// The `read_at: null` filter makes the transition monotonic: a
    /// message already read keeps its original timestamp.
    pub async fn mark_thread_read(
        &self,
        thread_id: ObjectId,
        reader_id: ObjectId,
        read_at: DateTime,
    ) -> DaoResult<u64> {
        self.base
            .update_many(
                doc! {
                    "thread_id": thread_id,
                    "receiver_id": reader_id,
                    "read_at": null,
                },
                doc! { "$set": { "read_at": read_at } },
            )
            .await
    }

    /// Soft delete. Only the sender may delete, and the flag is never
    /// cleared; the read state is untouched.
    pub async fn soft_delete(
        &self,
        message_id: ObjectId,
        sender_id: ObjectId,
    ) -> DaoResult<bool> {
        let changed = self
            .base
            .update_one(
                doc! { "_id": message_id, "sender_id": sender_id },
                doc! { "$set": { "is_deleted": true } },
            )
            .await?;
        if !changed {
            // Distinguish "not yours" from "already deleted / missing"
            match self.base.find_by_id(message_id).await {
                Ok(m) if m.sender_id != sender_id => Err(DaoError::Forbidden(
                    "Only the sender can delete a message".to_string(),
                )),
                Ok(_) => Ok(false),
                Err(e) => Err(e),
            }
        } else {
            Ok(true)
        }
    }

    pub async fn unread_count(
        &self,
        thread_id: ObjectId,
        reader_id: ObjectId,
    ) -> DaoResult<u64> {
        self.base
            .count(doc! {
                "thread_id": thread_id,
                "receiver_id": reader_id,
                "read_at": null,
            })
            .await
    }
}

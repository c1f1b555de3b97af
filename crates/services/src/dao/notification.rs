use bson::{DateTime, doc, oid::ObjectId};
use jiffyjobs_db::models::{Notification, NotificationEvent};
use mongodb::Database;

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        user_id: ObjectId,
        title: String,
        body: String,
        event: NotificationEvent,
    ) -> DaoResult<Notification> {
        let notification = Notification {
            id: None,
            user_id,
            title,
            body,
            event,
            is_read: false,
            read_at: None,
            created_at: DateTime::now(),
        };

        let id = self.base.insert_one(&notification).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_for_user(
        &self,
        user_id: ObjectId,
        unread_only: bool,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Notification>> {
        let mut filter = doc! { "user_id": user_id };
        if unread_only {
            filter.insert("is_read", false);
        }
        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1 }), params)
            .await
    }

    pub async fn unread_count(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! { "user_id": user_id, "is_read": false })
            .await
    }

    /// Unread -> read for one notification. The `is_read: false` filter
    /// keeps the transition monotonic; returns false if it was already
    /// read or belongs to someone else.
    pub async fn mark_read(
        &self,
        notification_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": notification_id, "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await
    }

    pub async fn mark_all_read(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .update_many(
                doc! { "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await
    }
}

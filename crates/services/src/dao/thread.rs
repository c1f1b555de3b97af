use bson::{DateTime, doc, oid::ObjectId};
use jiffyjobs_db::models::ChatThread;
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ThreadDao {
    pub base: BaseDao<ChatThread>,
}

impl ThreadDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ChatThread::COLLECTION),
        }
    }

    /// Find-or-create the thread for a (task, poster, helper) triple.
    /// Uniqueness is enforced by the index; a duplicate-key insert means
    /// another request won the race, so re-read the existing thread.
    pub async fn find_or_create(
        &self,
        task_id: ObjectId,
        poster_id: ObjectId,
        helper_id: ObjectId,
    ) -> DaoResult<ChatThread> {
        let filter = doc! {
            "task_id": task_id,
            "poster_id": poster_id,
            "helper_id": helper_id,
        };

        if let Some(existing) = self.base.find_one(filter.clone()).await? {
            return Ok(existing);
        }

        let now = DateTime::now();
        let thread = ChatThread {
            id: None,
            task_id,
            poster_id,
            helper_id,
            created_at: now,
            updated_at: now,
        };

        match self.base.insert_one(&thread).await {
            Ok(id) => self.base.find_by_id(id).await,
            Err(DaoError::DuplicateKey(_)) => self
                .base
                .find_one(filter)
                .await?
                .ok_or(DaoError::NotFound),
            Err(e) => Err(e),
        }
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<ChatThread> {
        self.base.find_by_id(id).await
    }

    /// Threads where the user is either party, most recently active first.
    pub async fn find_for_user(&self, user_id: ObjectId) -> DaoResult<Vec<ChatThread>> {
        self.base
            .find_many(
                doc! { "$or": [ { "poster_id": user_id }, { "helper_id": user_id } ] },
                Some(doc! { "updated_at": -1 }),
            )
            .await
    }

    pub async fn touch(&self, id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "updated_at": DateTime::now() } },
            )
            .await
    }
}

use bson::{DateTime, doc, oid::ObjectId};
use jiffyjobs_db::models::{Task, TaskStatus};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct TaskDao {
    pub base: BaseDao<Task>,
}

impl TaskDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Task::COLLECTION),
        }
    }

    pub async fn create(&self, title: String, poster_id: ObjectId) -> DaoResult<Task> {
        let now = DateTime::now();
        let task = Task {
            id: None,
            title,
            poster_id,
            helper_id: None,
            status: TaskStatus::Open,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&task).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<Task> {
        self.base.find_by_id(id).await
    }

    /// Assign a helper to an open task. Only the poster may assign.
    pub async fn assign_helper(
        &self,
        task_id: ObjectId,
        poster_id: ObjectId,
        helper_id: ObjectId,
    ) -> DaoResult<Task> {
        let changed = self
            .base
            .update_one(
                doc! { "_id": task_id, "poster_id": poster_id, "status": "open" },
                doc! { "$set": {
                    "helper_id": helper_id,
                    "status": "assigned",
                    "updated_at": DateTime::now(),
                } },
            )
            .await?;

        if !changed {
            let task = self.base.find_by_id(task_id).await?;
            if task.poster_id != poster_id {
                return Err(DaoError::Forbidden(
                    "Only the poster can assign a helper".to_string(),
                ));
            }
            return Err(DaoError::Validation("Task is not open".to_string()));
        }

        self.base.find_by_id(task_id).await
    }
}

use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![index_unique(bson::doc! { "email": 1 })],
    )
    .await?;

    // Tasks
    create_indexes(
        db,
        "tasks",
        vec![
            index(bson::doc! { "poster_id": 1 }),
            index(bson::doc! { "helper_id": 1 }),
        ],
    )
    .await?;

    // Threads: exactly one per (task, poster, helper) triple
    create_indexes(
        db,
        "threads",
        vec![
            index_unique(bson::doc! { "task_id": 1, "poster_id": 1, "helper_id": 1 }),
            index(bson::doc! { "poster_id": 1, "updated_at": -1 }),
            index(bson::doc! { "helper_id": 1, "updated_at": -1 }),
        ],
    )
    .await?;

    // Messages: newest-window pages and unread lookups
    create_indexes(
        db,
        "messages",
        vec![
            index(bson::doc! { "thread_id": 1, "created_at": -1 }),
            index(bson::doc! { "thread_id": 1, "receiver_id": 1, "read_at": 1 }),
        ],
    )
    .await?;

    // Notifications: per-user feed and unread count
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "user_id": 1, "is_read": 1 }),
        ],
    )
    .await?;

    info!("MongoDB indexes ensured");
    Ok(())
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

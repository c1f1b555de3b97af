use jiffyjobs_config::Settings;
use jiffyjobs_services::{
    AuthService,
    dao::{
        message::MessageDao, notification::NotificationDao, task::TaskDao, thread::ThreadDao,
        user::UserDao,
    },
};
use mongodb::Database;
use std::sync::Arc;

use crate::ws::storage::WsStorage;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub tasks: Arc<TaskDao>,
    pub threads: Arc<ThreadDao>,
    pub messages: Arc<MessageDao>,
    pub notifications: Arc<NotificationDao>,
    pub ws_storage: Arc<WsStorage>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let tasks = Arc::new(TaskDao::new(&db));
        let threads = Arc::new(ThreadDao::new(&db));
        let messages = Arc::new(MessageDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));
        let ws_storage = Arc::new(WsStorage::new());

        Self {
            db,
            settings,
            auth,
            users,
            tasks,
            threads,
            messages,
            notifications,
            ws_storage,
        }
    }
}

pub mod chat;
pub mod notification;
pub mod task;
pub mod user;

pub use chat::{ChatMessage, ChatThread};
pub use notification::{Notification, NotificationEvent};
pub use task::{Task, TaskStatus};
pub use user::User;

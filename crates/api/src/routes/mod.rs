pub mod auth;
pub mod message;
pub mod notification;
pub mod task;
pub mod thread;

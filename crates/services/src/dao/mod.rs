pub mod base;
pub mod message;
pub mod notification;
pub mod task;
pub mod thread;
pub mod user;

pub use base::BaseDao;

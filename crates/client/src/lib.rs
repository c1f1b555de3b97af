//! Client-side companion to the JiffyJobs realtime API: REST wrapper,
//! WebSocket gateway client, polling fallback, and the reconciliation
//! state that merges both delivery paths into one consistent view.

pub mod gateway;
pub mod poller;
pub mod rest;
pub mod state;
pub mod types;

pub use gateway::{GatewayClient, GatewayHandle};
pub use poller::Poller;
pub use rest::ApiClient;
pub use state::{Merge, NotificationFeed, ThreadTimeline};
pub use types::{ClientError, MessageRecord, NotificationRecord, ServerEvent};

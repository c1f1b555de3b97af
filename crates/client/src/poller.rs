use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::rest::ApiClient;
use crate::state::ThreadTimeline;

/// Minimum allowed poll interval; a misconfigured client must not turn
/// the fallback path into a load generator.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(3);

const POLL_PAGE_SIZE: u64 = 50;

/// Delivery fallback: while no live gateway connection exists, fetch the
/// latest message page on a fixed interval and merge it by identifier.
/// Guarantees eventual visibility without the gateway; stops as soon as
/// the `connected` signal flips to true.
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until `connected` becomes true or the sender side is dropped
    /// with the flag still false (terminal disconnect).
    pub async fn run(
        &self,
        api: &ApiClient,
        thread_id: &str,
        timeline: Arc<Mutex<ThreadTimeline>>,
        mut connected: watch::Receiver<bool>,
    ) {
        if *connected.borrow() {
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        // First tick fires immediately: a reconnecting client catches up
        // without waiting out a full interval.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match api.latest_messages(thread_id, POLL_PAGE_SIZE).await {
                        Ok(page) => {
                            let added = {
                                let mut guard =
                                    timeline.lock().unwrap_or_else(|e| e.into_inner());
                                guard.merge_page(page.items.iter())
                            };
                            debug!(thread_id, added, "Poll merged");
                        }
                        Err(e) => {
                            // Transient; the next tick retries
                            warn!(thread_id, %e, "Poll failed");
                        }
                    }
                }
                changed = connected.changed() => {
                    match changed {
                        Ok(()) if *connected.borrow() => return,
                        Ok(()) => {}
                        Err(_) => return,
                    }
                }
            }
        }
    }
}

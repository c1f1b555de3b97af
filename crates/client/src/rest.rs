use serde::Deserialize;
use serde_json::json;

use crate::types::{ClientError, ClientResult, MessageRecord, NotificationRecord};

/// Thin wrapper over the REST surface. The pull side of reconciliation:
/// everything the gateway pushes can also be fetched here.
pub struct ApiClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct MessagePage {
    pub items: Vec<MessageRecord>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize)]
pub struct NotificationPage {
    pub items: Vec<NotificationRecord>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub unread_count: u64,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Latest page of a thread's messages (newest first).
    pub async fn latest_messages(
        &self,
        thread_id: &str,
        per_page: u64,
    ) -> ClientResult<MessagePage> {
        let url = format!(
            "{}/api/thread/{}/message?page=1&per_page={}",
            self.base_url, thread_id, per_page
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn send_message(&self, thread_id: &str, body: &str) -> ClientResult<MessageRecord> {
        let url = format!("{}/api/thread/{}/message", self.base_url, thread_id);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "body": body }))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn mark_thread_read(&self, thread_id: &str) -> ClientResult<()> {
        let url = format!("{}/api/thread/{}/read", self.base_url, thread_id);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(resp).await
    }

    pub async fn notifications(
        &self,
        unread_only: bool,
        per_page: u64,
    ) -> ClientResult<NotificationPage> {
        let url = format!(
            "{}/api/notification?page=1&per_page={}&unread_only={}",
            self.base_url, per_page, unread_only
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> ClientResult<()> {
        let url = format!(
            "{}/api/notification/{}/read",
            self.base_url, notification_id
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(resp).await
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        let url = format!("{}/api/notification/read-all", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(resp).await
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> ClientResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

async fn check(resp: reqwest::Response) -> ClientResult<()> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(())
}

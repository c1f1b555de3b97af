use serde_json::Value;

use super::test_app::TestApp;

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// A task with an assigned helper and the conversation thread between
/// the two parties.
pub struct SeededConversation {
    pub task_id: String,
    pub thread_id: String,
    pub poster: SeededUser,
    pub helper: SeededUser,
}

impl TestApp {
    /// Register a user and return their auth info.
    pub async fn register_user(&self, email: &str, display_name: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "display_name": display_name,
                "password": "correct-horse",
            }))
            .send()
            .await
            .expect("Register request failed");

        assert_eq!(
            resp.status().as_u16(),
            201,
            "Register failed: {}",
            resp.text().await.unwrap_or_default()
        );

        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": "correct-horse",
            }))
            .send()
            .await
            .expect("Login request failed");

        let json: Value = resp.json().await.expect("Failed to parse login response");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Poster posts a task, assigns the helper, and opens the thread.
    pub async fn seed_conversation(&self, slug: &str) -> SeededConversation {
        let poster = self
            .register_user(&format!("poster-{slug}@test.io"), "Poster")
            .await;
        let helper = self
            .register_user(&format!("helper-{slug}@test.io"), "Helper")
            .await;

        let resp = self
            .auth_post("/api/task", &poster.access_token)
            .json(&serde_json::json!({ "title": format!("Task {slug}") }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let task: Value = resp.json().await.unwrap();
        let task_id = task["id"].as_str().unwrap().to_string();

        let resp = self
            .auth_post(&format!("/api/task/{task_id}/assign"), &poster.access_token)
            .json(&serde_json::json!({ "helper_id": helper.id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let resp = self
            .auth_post("/api/thread", &poster.access_token)
            .json(&serde_json::json!({
                "task_id": task_id,
                "counterparty_id": helper.id,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let thread: Value = resp.json().await.unwrap();
        let thread_id = thread["id"].as_str().unwrap().to_string();

        SeededConversation {
            task_id,
            thread_id,
            poster,
            helper,
        }
    }
}

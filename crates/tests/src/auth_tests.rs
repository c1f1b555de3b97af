use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn register_login_me_roundtrip() {
    let app = TestApp::spawn().await;
    let user = app.register_user("alice@test.io", "Alice").await;

    let resp = app
        .auth_get("/api/auth/me", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["email"], "alice@test.io");
    assert_eq!(json["display_name"], "Alice");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_user("bob@test.io", "Bob").await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "bob@test.io",
            "display_name": "Bob Again",
            "password": "correct-horse",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.register_user("carol@test.io", "Carol").await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "carol@test.io",
            "password": "wrong-horse",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn short_password_fails_validation() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "dave@test.io",
            "display_name": "Dave",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn refresh_token_yields_new_access_token() {
    let app = TestApp::spawn().await;
    let user = app.register_user("erin@test.io", "Erin").await;

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert!(json["access_token"].as_str().is_some());

    // The refresh token itself is not accepted as an access token
    let resp = app
        .auth_get("/api/auth/me", &user.refresh_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/thread"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

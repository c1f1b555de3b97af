use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn assignment_and_messages_create_typed_notifications() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("notiftyped").await;

    // Assignment already produced a helper_assigned notification
    let resp = app
        .auth_get("/api/notification", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["unread_count"], 1);
    assert_eq!(json["items"][0]["event"]["type"], "helper_assigned");

    // A message adds a new_message notification with the typed payload
    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "ping" }))
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_get("/api/notification", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["unread_count"], 2);
    let newest = &json["items"][0];
    assert_eq!(newest["event"]["type"], "new_message");
    assert_eq!(
        newest["event"]["thread_id"].as_str().unwrap(),
        conv.thread_id
    );
    assert_eq!(newest["event"]["sender_id"].as_str().unwrap(), conv.poster.id);
}

#[tokio::test]
async fn unread_count_reaches_zero_after_mark_all() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("notifall").await;

    for i in 1..=3 {
        app.auth_post(
            &format!("/api/thread/{}/message", conv.thread_id),
            &conv.poster.access_token,
        )
        .json(&serde_json::json!({ "body": format!("m{i}") }))
        .send()
        .await
        .unwrap();
    }

    // 3 message notifications + 1 assignment notification
    let resp = app
        .auth_get("/api/notification", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["unread_count"], 4);

    let resp = app
        .auth_post("/api/notification/read-all", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["marked"], 4);

    let resp = app
        .auth_get("/api/notification", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["unread_count"], 0);
}

#[tokio::test]
async fn single_mark_read_is_monotonic() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("notifone").await;

    let resp = app
        .auth_get("/api/notification", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    let notification_id = json["items"][0]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/notification/{notification_id}/read"),
            &conv.helper.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["marked"], true);

    // Second attempt is a no-op, not an error
    let resp = app
        .auth_post(
            &format!("/api/notification/{notification_id}/read"),
            &conv.helper.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["marked"], false);
}

#[tokio::test]
async fn foreign_notification_is_forbidden() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("notifother").await;

    let resp = app
        .auth_get("/api/notification", &conv.helper.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    let notification_id = json["items"][0]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/notification/{notification_id}/read"),
            &conv.poster.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn unread_only_filter_hides_read_notifications() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("notiffilter").await;

    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "one" }))
    .send()
    .await
    .unwrap();

    app.auth_post("/api/notification/read-all", &conv.helper.access_token)
        .send()
        .await
        .unwrap();

    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "two" }))
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_get(
            "/api/notification?unread_only=true",
            &conv.helper.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["unread_count"], 1);
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jiffyjobs_client::{
    ApiClient, GatewayClient, Merge, NotificationFeed, Poller, ServerEvent, ThreadTimeline,
};
use tokio::sync::{mpsc, watch};

use crate::fixtures::test_app::TestApp;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Drain events until one matches, or time out. Unrelated events (e.g.
/// a notification landing between two message pushes) are skipped.
async fn wait_for<F>(rx: &mut mpsc::Receiver<ServerEvent>, mut pred: F) -> ServerEvent
where
    F: FnMut(&ServerEvent) -> bool,
{
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            let event = rx.recv().await.expect("Gateway stream closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("Timed out waiting for gateway event")
}

async fn join(
    handle: &jiffyjobs_client::GatewayHandle,
    rx: &mut mpsc::Receiver<ServerEvent>,
    thread_id: &str,
) {
    assert!(handle.join_thread(thread_id).await);
    wait_for(rx, |e| matches!(e, ServerEvent::ThreadJoined { .. })).await;
}

#[tokio::test]
async fn connected_recipient_receives_push_exactly_once() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("push").await;

    let (handle, mut rx) = GatewayClient::connect(&app.base_url, &conv.helper.access_token)
        .await
        .expect("Gateway connect failed");
    wait_for(&mut rx, |e| matches!(e, ServerEvent::Connected { .. })).await;
    join(&handle, &mut rx, &conv.thread_id).await;

    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "Hi" }))
    .send()
    .await
    .unwrap();

    let event = wait_for(&mut rx, |e| matches!(e, ServerEvent::NewMessage { .. })).await;
    let ServerEvent::NewMessage { message, .. } = event else {
        unreachable!()
    };

    let mut timeline = ThreadTimeline::new(&conv.helper.id);
    assert!(matches!(
        timeline.merge(&message),
        Merge::Inserted {
            needs_read_receipt: true
        }
    ));

    // A concurrent poll delivering the same record is a no-op
    let api = ApiClient::new(&app.base_url, &conv.helper.access_token);
    let page = api.latest_messages(&conv.thread_id, 50).await.unwrap();
    assert_eq!(timeline.merge_page(page.items.iter()), 0);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.unread_count(), 1);
}

#[tokio::test]
async fn unauthorized_join_is_rejected() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("wsauth").await;
    let mallory = app.register_user("ws-mallory@test.io", "Mallory").await;

    let (handle, mut rx) = GatewayClient::connect(&app.base_url, &mallory.access_token)
        .await
        .unwrap();
    wait_for(&mut rx, |e| matches!(e, ServerEvent::Connected { .. })).await;

    assert!(handle.join_thread(&conv.thread_id).await);
    let event = wait_for(&mut rx, |e| matches!(e, ServerEvent::Error { .. })).await;
    let ServerEvent::Error { code, .. } = event else {
        unreachable!()
    };
    assert_eq!(code, "unauthorized");

    // Nonexistent thread is a distinct error
    assert!(handle.join_thread(&bson::oid::ObjectId::new().to_hex()).await);
    let event = wait_for(&mut rx, |e| matches!(e, ServerEvent::Error { .. })).await;
    let ServerEvent::Error { code, .. } = event else {
        unreachable!()
    };
    assert_eq!(code, "not_found");
}

#[tokio::test]
async fn leave_thread_is_a_noop_when_not_joined() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("wsleave").await;

    let (handle, mut rx) = GatewayClient::connect(&app.base_url, &conv.helper.access_token)
        .await
        .unwrap();
    wait_for(&mut rx, |e| matches!(e, ServerEvent::Connected { .. })).await;

    // Never joined, leaving still acks
    assert!(handle.leave_thread(&conv.thread_id).await);
    wait_for(&mut rx, |e| matches!(e, ServerEvent::ThreadLeft { .. })).await;
}

#[tokio::test]
async fn messages_sent_while_disconnected_arrive_via_poll() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("poll").await;

    // Message 1 lands while the helper is "online" via plain REST
    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "first" }))
    .send()
    .await
    .unwrap();

    let api = ApiClient::new(&app.base_url, &conv.helper.access_token);
    let timeline = Arc::new(Mutex::new(ThreadTimeline::new(&conv.helper.id)));
    {
        let page = api.latest_messages(&conv.thread_id, 50).await.unwrap();
        timeline.lock().unwrap().merge_page(page.items.iter());
    }

    // Message 2 lands while the helper has no live connection
    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "second" }))
    .send()
    .await
    .unwrap();

    // One poll cycle picks it up; flipping the connected flag stops the
    // poller as if the gateway came back
    let (connected_tx, connected_rx) = watch::channel(false);
    let poller = Poller::new(Duration::from_secs(3));
    let poll_timeline = timeline.clone();
    let poll_handle = tokio::spawn({
        let api = ApiClient::new(&app.base_url, &conv.helper.access_token);
        let thread_id = conv.thread_id.clone();
        async move {
            poller.run(&api, &thread_id, poll_timeline, connected_rx).await;
        }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    connected_tx.send(true).unwrap();
    poll_handle.await.unwrap();

    let guard = timeline.lock().unwrap();
    let bodies: Vec<&str> = guard.messages().iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second"]);
    assert_eq!(guard.unread_count(), 2);
}

#[tokio::test]
async fn read_receipt_reaches_the_sender() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("receipt").await;

    let (poster_handle, mut poster_rx) =
        GatewayClient::connect(&app.base_url, &conv.poster.access_token)
            .await
            .unwrap();
    wait_for(&mut poster_rx, |e| matches!(e, ServerEvent::Connected { .. })).await;
    join(&poster_handle, &mut poster_rx, &conv.thread_id).await;

    let (helper_handle, mut helper_rx) =
        GatewayClient::connect(&app.base_url, &conv.helper.access_token)
            .await
            .unwrap();
    wait_for(&mut helper_rx, |e| matches!(e, ServerEvent::Connected { .. })).await;
    join(&helper_handle, &mut helper_rx, &conv.thread_id).await;

    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "Hi" }))
    .send()
    .await
    .unwrap();

    let mut poster_timeline = ThreadTimeline::new(&conv.poster.id);
    let event = wait_for(&mut poster_rx, |e| matches!(e, ServerEvent::NewMessage { .. })).await;
    let ServerEvent::NewMessage { message, .. } = event else {
        unreachable!()
    };
    poster_timeline.merge(&message);
    assert!(poster_timeline.messages()[0].read_at.is_none());

    // Helper receives it with the thread open and marks it read
    let event = wait_for(&mut helper_rx, |e| matches!(e, ServerEvent::NewMessage { .. })).await;
    let ServerEvent::NewMessage { message, .. } = event else {
        unreachable!()
    };
    let mut helper_timeline = ThreadTimeline::new(&conv.helper.id);
    let merge = helper_timeline.merge(&message);
    assert!(matches!(
        merge,
        Merge::Inserted {
            needs_read_receipt: true
        }
    ));
    let helper_api = ApiClient::new(&app.base_url, &conv.helper.access_token);
    helper_api.mark_thread_read(&conv.thread_id).await.unwrap();

    // Poster's view of the message gains read_at through the room event
    let event = wait_for(&mut poster_rx, |e| matches!(e, ServerEvent::ThreadRead { .. })).await;
    let ServerEvent::ThreadRead {
        reader_id, read_at, ..
    } = event
    else {
        unreachable!()
    };
    assert_eq!(reader_id, conv.helper.id);
    poster_timeline.apply_thread_read(&reader_id, &read_at);
    assert!(poster_timeline.messages()[0].read_at.is_some());
}

#[tokio::test]
async fn dead_connection_is_pruned_and_survivors_still_receive() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("prune").await;
    let tid = bson::oid::ObjectId::parse_str(&conv.thread_id).unwrap();

    let (h1, mut rx1) = GatewayClient::connect(&app.base_url, &conv.helper.access_token)
        .await
        .unwrap();
    wait_for(&mut rx1, |e| matches!(e, ServerEvent::Connected { .. })).await;
    join(&h1, &mut rx1, &conv.thread_id).await;

    let (h2, mut rx2) = GatewayClient::connect(&app.base_url, &conv.helper.access_token)
        .await
        .unwrap();
    wait_for(&mut rx2, |e| matches!(e, ServerEvent::Connected { .. })).await;
    join(&h2, &mut rx2, &conv.thread_id).await;

    assert_eq!(app.state.ws_storage.room_size(&tid), 2);
    assert_eq!(app.state.ws_storage.connection_count(), 2);

    // Kill the second tab without a close handshake, then publish right
    // away: a write to the dead socket is swallowed and the connection
    // pruned, never surfaced to the sender
    drop(h2);
    drop(rx2);

    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "still delivered" }))
    .send()
    .await
    .unwrap();

    let event = wait_for(&mut rx1, |e| matches!(e, ServerEvent::NewMessage { .. })).await;
    let ServerEvent::NewMessage { message, .. } = event else {
        unreachable!()
    };
    assert_eq!(message.body, "still delivered");

    // The registry converges to the one live connection, whether the dead
    // socket was caught by the failed write or by the read loop
    let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
    while app.state.ws_storage.room_size(&tid) > 1 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Dead connection was never pruned"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(app.state.ws_storage.room_size(&tid), 1);
    assert_eq!(app.state.ws_storage.connection_count(), 1);
}

#[tokio::test]
async fn two_tabs_of_one_user_converge() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("tabs").await;

    let (_h1, mut rx1) = GatewayClient::connect(&app.base_url, &conv.helper.access_token)
        .await
        .unwrap();
    let (_h2, mut rx2) = GatewayClient::connect(&app.base_url, &conv.helper.access_token)
        .await
        .unwrap();
    wait_for(&mut rx1, |e| matches!(e, ServerEvent::Connected { .. })).await;
    wait_for(&mut rx2, |e| matches!(e, ServerEvent::Connected { .. })).await;

    // Notifications go to every connection of the user, rooms or not
    app.auth_post(
        &format!("/api/thread/{}/message", conv.thread_id),
        &conv.poster.access_token,
    )
    .json(&serde_json::json!({ "body": "fan-out" }))
    .send()
    .await
    .unwrap();

    let mut feeds = Vec::new();
    for rx in [&mut rx1, &mut rx2] {
        let event = wait_for(rx, |e| matches!(e, ServerEvent::NewNotification { .. })).await;
        let ServerEvent::NewNotification { notification } = event else {
            unreachable!()
        };
        let mut feed = NotificationFeed::new();
        feed.merge(&notification);
        feeds.push(feed);
    }

    // Both tabs reconcile against the REST feed and agree on the count
    let api = ApiClient::new(&app.base_url, &conv.helper.access_token);
    let page = api.notifications(false, 50).await.unwrap();
    for feed in &mut feeds {
        feed.merge_page(page.items.iter());
    }
    assert_eq!(feeds[0].unread_count(), feeds[1].unread_count());
    assert_eq!(feeds[0].unread_count() as u64, page.unread_count);
}

#[tokio::test]
async fn sender_tab_in_room_also_receives_the_publish() {
    let app = TestApp::spawn().await;
    let conv = app.seed_conversation("selftab").await;

    // The poster's other tab sits in the room; no self-suppression
    let (handle, mut rx) = GatewayClient::connect(&app.base_url, &conv.poster.access_token)
        .await
        .unwrap();
    wait_for(&mut rx, |e| matches!(e, ServerEvent::Connected { .. })).await;
    join(&handle, &mut rx, &conv.thread_id).await;

    let resp = app
        .auth_post(
            &format!("/api/thread/{}/message", conv.thread_id),
            &conv.poster.access_token,
        )
        .json(&serde_json::json!({ "body": "from other tab" }))
        .send()
        .await
        .unwrap();
    let sent: serde_json::Value = resp.json().await.unwrap();

    let event = wait_for(&mut rx, |e| matches!(e, ServerEvent::NewMessage { .. })).await;
    let ServerEvent::NewMessage { message, .. } = event else {
        unreachable!()
    };
    assert_eq!(message.id, sent["id"].as_str().unwrap());

    // Own message merges without prompting a read receipt
    let mut timeline = ThreadTimeline::new(&conv.poster.id);
    assert!(matches!(
        timeline.merge(&message),
        Merge::Inserted {
            needs_read_receipt: false
        }
    ));
}

use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::types::{ClientResult, ServerEvent};

/// Live connection to the realtime gateway. Owns the socket in a spawned
/// task; commands go in through the handle, parsed server events come out
/// of the event channel. The `connected` watch flag doubles as the
/// poller's stop signal.
pub struct GatewayClient;

pub struct GatewayHandle {
    commands: mpsc::Sender<String>,
    connected: watch::Receiver<bool>,
}

impl GatewayClient {
    /// Single connection attempt. The URL is the server's HTTP base; the
    /// token rides in the query string, same as a browser client.
    pub async fn connect(
        base_url: &str,
        token: &str,
    ) -> ClientResult<(GatewayHandle, mpsc::Receiver<ServerEvent>)> {
        let url = ws_url(base_url, token);
        let (socket, _response) = connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(64);
        let (command_tx, mut command_rx) = mpsc::channel::<String>(16);
        let (connected_tx, connected_rx) = watch::channel(true);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = command_rx.recv() => {
                        match outgoing {
                            Some(text) => {
                                if let Err(e) = sink.send(Message::Text(text.into())).await {
                                    warn!(%e, "Gateway send failed");
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    incoming = stream.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerEvent>(text.as_str()) {
                                    Ok(event) => {
                                        if event_tx.send(event).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => {
                                        debug!(%e, "Unrecognized gateway event");
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!(%e, "Gateway stream error");
                                break;
                            }
                        }
                    }
                }
            }
            let _ = connected_tx.send(false);
        });

        Ok((
            GatewayHandle {
                commands: command_tx,
                connected: connected_rx,
            },
            event_rx,
        ))
    }

    /// Reconnect loop with exponential backoff, 1 s doubling to a 30 s
    /// cap. Returns on the first successful connection; callers re-enter
    /// after the live connection drops.
    pub async fn connect_with_backoff(
        base_url: &str,
        token: &str,
    ) -> (GatewayHandle, mpsc::Receiver<ServerEvent>) {
        let mut delay = Duration::from_secs(1);
        loop {
            match Self::connect(base_url, token).await {
                Ok(pair) => return pair,
                Err(e) => {
                    warn!(%e, ?delay, "Gateway connect failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(30));
                }
            }
        }
    }
}

impl GatewayHandle {
    pub async fn join_thread(&self, thread_id: &str) -> bool {
        self.send(json!({ "type": "join-thread", "data": { "thread_id": thread_id } }))
            .await
    }

    pub async fn leave_thread(&self, thread_id: &str) -> bool {
        self.send(json!({ "type": "leave-thread", "data": { "thread_id": thread_id } }))
            .await
    }

    pub async fn ping(&self) -> bool {
        self.send(json!({ "type": "ping" })).await
    }

    /// Watch flag: true while the socket task is alive. Hand a clone to
    /// the poller so it stops the moment a live connection exists.
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    async fn send(&self, value: serde_json::Value) -> bool {
        self.commands.send(value.to_string()).await.is_ok()
    }
}

fn ws_url(base_url: &str, token: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{ws_base}/ws?token={token}")
}

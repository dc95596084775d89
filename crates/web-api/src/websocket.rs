//! 并发在线用户 WebSocket 端点
//!
//! 连接经自定义头认证后注册进所属小组，随后接收：
//! - 在线成员快照（任何成员连接/断开时重算并推送）
//! - 固定间隔的心跳消息
//!
//! 断开时必须从所有小组注销，否则在线映射会无界增长。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use application::ConcurrentMessage;
use domain::AuthUser;

use crate::{auth, error::ApiError, state::AppState};

pub async fn concurrent_users_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let (mut sender, mut receiver) = socket.split();
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel::<ConcurrentMessage>();

    if let Err(err) = state.presence.connect(user.uid, snapshot_tx).await {
        error!(uid = %user.uid, error = %err, "presence registration failed");
        return;
    }

    let mut heartbeat = tokio::time::interval(state.heartbeat_interval);
    // JSON 编码的心跳文本
    let heartbeat_payload = r#""ping pong""#;

    loop {
        tokio::select! {
            snapshot = snapshot_rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let payload = match serde_json::to_string(&snapshot) {
                    Ok(json) => json,
                    Err(err) => {
                        warn!(error = %err, "failed to serialize presence snapshot");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if sender
                    .send(WsMessage::Text(heartbeat_payload.into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(message)) => {
                        // 入站消息仅记录，不参与任何状态变更
                        debug!(uid = %user.uid, ?message, "concurrent-users inbound message");
                    }
                    Some(Err(err)) => {
                        debug!(uid = %user.uid, error = %err, "websocket read error");
                        break;
                    }
                }
            }
        }
    }

    state.presence.disconnect(user.uid).await;
}

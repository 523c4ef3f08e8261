use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket},
    tokio::time::timeout,
    tracing::{debug, info, warn},
};

use cookiegate_protocol::{ClientRequest, ServerMessage, classify, close, cookie_header};

use crate::{
    gate::{GateDecision, RequestGate},
    state::GatewayState,
};

/// Handle a single WebSocket connection through its full lifecycle:
/// bounded wait for a message → gate → classify → fulfill → close.
///
/// Every branch terminates the connection, so at most one request is ever
/// fulfilled per connection lifetime.
pub async fn handle_connection(
    mut socket: WebSocket,
    state: Arc<GatewayState>,
    remote_addr: SocketAddr,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, remote_ip = %remote_addr.ip(), "ws: new connection");

    let mut gate = RequestGate::new(Duration::from_secs(state.config.rate_limit_secs));
    let first_message_timeout = Duration::from_millis(state.config.first_message_timeout_ms);

    loop {
        let msg = match timeout(first_message_timeout, socket.recv()).await {
            Err(_) => {
                warn!(conn_id = %conn_id, "ws: no message received before timeout");
                close_with(
                    &mut socket,
                    &conn_id,
                    close::POLICY_VIOLATION,
                    close::REASON_NO_MESSAGE,
                )
                .await;
                return;
            },
            Ok(None) => {
                debug!(conn_id = %conn_id, "ws: client disconnected");
                return;
            },
            Ok(Some(Err(e))) => {
                debug!(conn_id = %conn_id, error = %e, "ws: read error");
                return;
            },
            Ok(Some(Ok(msg))) => msg,
        };

        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => {
                debug!(conn_id = %conn_id, "ws: client closed");
                return;
            },
            // Pings are answered by the transport; anything else is noise.
            _ => continue,
        };

        if let GateDecision::Denied { retry_after } = gate.check() {
            warn!(
                conn_id = %conn_id,
                retry_after_ms = retry_after.as_millis() as u64,
                "ws: rate limit exceeded"
            );
            close_with(
                &mut socket,
                &conn_id,
                close::POLICY_VIOLATION,
                close::REASON_RATE_LIMIT,
            )
            .await;
            return;
        }

        let request = match classify(text.as_str()) {
            Ok(request) => request,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "ws: rejected payload");
                close_with(
                    &mut socket,
                    &conn_id,
                    close::POLICY_VIOLATION,
                    e.close_reason(),
                )
                .await;
                return;
            },
        };

        match request {
            ClientRequest::Cookie => {
                fulfill(&mut socket, &state, &conn_id).await;
                return;
            },
        }
    }
}

/// Drive the browser collaborator and deliver the terminal response.
///
/// Collaborator failures are absorbed: the client gets the error text as a
/// structured message and a normal close, never an abrupt policy close.
async fn fulfill(socket: &mut WebSocket, state: &GatewayState, conn_id: &str) {
    let response = match state.cookies.fetch_cookies().await {
        Ok(pairs) => {
            info!(conn_id = %conn_id, count = pairs.len(), "ws: cookies fetched");
            ServerMessage::Cookies {
                cookie: cookie_header(&pairs),
            }
        },
        Err(e) => {
            warn!(conn_id = %conn_id, error = %e, "ws: cookie fetch failed");
            ServerMessage::Error {
                error: e.to_string(),
            }
        },
    };

    let payload = match serde_json::to_string(&response) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(conn_id = %conn_id, error = %e, "ws: response serialization failed");
            return;
        },
    };

    if socket.send(Message::Text(payload.into())).await.is_err() {
        // Client went away mid-fetch; the browser was already released by
        // the collaborator, so there is nothing left to clean up.
        debug!(conn_id = %conn_id, "ws: client gone before response");
        return;
    }

    close_with(socket, conn_id, close::NORMAL, close::REASON_DONE).await;
}

async fn close_with(socket: &mut WebSocket, conn_id: &str, code: u16, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from_static(reason),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(conn_id = %conn_id, error = %e, "ws: close send failed");
    }
    info!(conn_id = %conn_id, code, reason, "ws: connection closed");
}

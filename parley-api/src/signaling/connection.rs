//! Per-connection signaling loop.
//!
//! Identity is established once at handshake; after that the connection is a
//! FIFO stream of requests in and acks/pushes out. Outbound traffic flows
//! through one channel per connection, so acks keep the order of the
//! requests that produced them. When the hub drops a connection (kick,
//! reject, end-meeting) the writer drains what is queued and the loop ends.

use axum::extract::ws::{Message, WebSocket};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use parley_core::models::ConnId;
use parley_core::service::Claims;

use crate::signaling::dispatch::{handle_disconnect, handle_request, ConnectionCtx};
use crate::signaling::messages::{ClientEnvelope, ServerEvent};
use crate::state::AppState;

pub async fn handle_socket(socket: WebSocket, state: AppState, claims: Claims) {
    let conn_id = ConnId::new();
    let user_id = claims.user_id();

    info!(conn_id = %conn_id, user_id = %user_id, "Signaling connection established");

    let rx = state
        .hub
        .register(conn_id.clone(), user_id.clone(), claims.email.clone());
    let mut ctx = ConnectionCtx::new(conn_id.clone(), claims);

    let (ws_sink, mut ws_stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(ws_sink, rx));

    loop {
        tokio::select! {
            inbound = ws_stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEnvelope>(&text) {
                            Ok(envelope) => {
                                if let Some(ack) = handle_request(&state, &mut ctx, envelope).await {
                                    state.hub.send_to(&ctx.conn_id, ack);
                                }
                            }
                            Err(e) => {
                                debug!(conn_id = %ctx.conn_id, error = %e, "Unparseable frame");
                                state.hub.send_to(
                                    &ctx.conn_id,
                                    ServerEvent::Error {
                                        message: "Invalid message format".to_string(),
                                    },
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(conn_id = %ctx.conn_id, error = %e, "Socket error");
                        break;
                    }
                    // Binary frames are not part of the protocol; ping/pong
                    // is handled at the transport layer
                    Some(Ok(_)) => {}
                }
            }
            // The hub dropped us (kick / reject / end-meeting): queued
            // events have been flushed, stop reading
            _ = &mut writer => break,
        }
    }

    handle_disconnect(&state, &ctx).await;
    writer.abort();

    info!(conn_id = %conn_id, user_id = %user_id, "Signaling connection closed");
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound event");
                continue;
            }
        };
        if sink.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    let _ = sink.send(Message::Close(None)).await;
}

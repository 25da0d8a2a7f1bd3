//! WebSocket signaling endpoint
//!
//! One route serves both roles: `role=streamer` in the query string
//! classifies the connection as the streamer, anything else is a
//! player. Each socket is split into a reader loop feeding the relay
//! and a writer task draining the connection's outbound queue, so
//! relay-side sends never block on a slow peer.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use pixelsig_core::connection::{PeerRole, PeerSender};
use pixelsig_core::protocol::SignalMessage;
use pixelsig_core::relay::{Admission, Relay};

use crate::http::AppState;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Role declared at connection time; only "streamer" is meaningful
    pub role: Option<String>,
}

/// WebSocket handler for the signaling endpoint
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let role = PeerRole::from_query(query.role.as_deref());

    // 64KB is ample for SDP payloads (the axum default of 64MB is not a
    // sensible bound for signaling traffic)
    ws.max_message_size(64 * 1024)
        .on_upgrade(move |socket| handle_socket(socket, state.relay.clone(), role))
}

enum OutboundFrame {
    Message(String),
    Close,
}

/// Outbound half handed to the relay; the queue is drained by this
/// connection's writer task.
struct WsSender {
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl PeerSender for WsSender {
    fn send(&self, message: &SignalMessage) -> pixelsig_core::Result<()> {
        let text = message.to_json()?;
        self.tx
            .send(OutboundFrame::Message(text))
            .map_err(|_| pixelsig_core::Error::ConnectionClosed)
    }

    fn close(&self) {
        let _ = self.tx.send(OutboundFrame::Close);
    }
}

async fn handle_socket(socket: WebSocket, relay: Relay, role: PeerRole) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Message(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    match relay.accept(role, Box::new(WsSender { tx })) {
        Admission::Streamer(connection_id) => {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => relay.on_streamer_message(&text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // binary, ping, pong: not part of the protocol
                    Err(e) => {
                        // transport fault takes the same transition as a close
                        debug!("streamer transport error: {e}");
                        break;
                    }
                }
            }
            relay.on_streamer_closed(connection_id);
        }
        Admission::Player(player_id) => {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => relay.on_player_message(player_id, &text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(player = %player_id, "player transport error: {e}");
                        break;
                    }
                }
            }
            relay.on_player_closed(player_id);
        }
        Admission::Rejected => {
            // rejection notice is already queued; the writer flushes it
            // and closes below
        }
    }

    // The relay has dropped this connection's sender by now, so the
    // writer sees the queue close and exits.
    let _ = writer.await;
}

//! WebSocket transport for the event channel.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::events::{
    handle_event, parse_inbound, ConnectedPayload, EventHub, OutboundEvent, RoomBroadcast,
};
use super::metrics::SOCKET_CONNECTIONS;
use super::spans::event_span;
use super::state::AppState;

/// Replies queued per socket before the reader waits on the writer.
const REPLY_BUFFER: usize = 32;

/// Create the event-channel router.
pub fn create_ws_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/students", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4().to_string();
    SOCKET_CONNECTIONS.inc();
    info!(%client_id, "Socket connected");

    let (sender, receiver) = socket.split();
    let (reply_tx, reply_rx) = mpsc::channel(REPLY_BUFFER);
    let updates = state.hub.subscribe();

    if reply_tx
        .send(OutboundEvent::Connected(ConnectedPayload::new(&client_id)))
        .await
        .is_err()
    {
        warn!(%client_id, "Reply channel closed before greeting");
    }

    let mut send_task = tokio::spawn(send_events(
        sender,
        reply_rx,
        updates,
        client_id.clone(),
        state.hub.clone(),
    ));
    let mut recv_task = tokio::spawn(receive_events(
        receiver,
        reply_tx,
        client_id.clone(),
        Arc::clone(&state),
    ));

    tokio::select! {
        _ = &mut send_task => {
            debug!(%client_id, "Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!(%client_id, "Receive task completed");
            send_task.abort();
        }
    }

    state.hub.leave_all(&client_id);
    SOCKET_CONNECTIONS.dec();
    info!(%client_id, "Socket disconnected");
}

enum Outgoing {
    Reply(Option<OutboundEvent>),
    Update(Result<RoomBroadcast, broadcast::error::RecvError>),
}

/// Write replies and room updates to the client.
async fn send_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut replies: mpsc::Receiver<OutboundEvent>,
    mut updates: broadcast::Receiver<RoomBroadcast>,
    client_id: String,
    hub: EventHub,
) {
    loop {
        let next = tokio::select! {
            reply = replies.recv() => Outgoing::Reply(reply),
            update = updates.recv() => Outgoing::Update(update),
        };

        let event = match next {
            Outgoing::Reply(Some(event)) => event,
            Outgoing::Reply(None) => break,
            Outgoing::Update(Ok(room_update)) => {
                if !hub.is_member(&room_update.room, &client_id) {
                    continue;
                }
                OutboundEvent::StudentUpdate(room_update.update)
            }
            Outgoing::Update(Err(broadcast::error::RecvError::Lagged(n))) => {
                warn!(%client_id, skipped = n, "Socket lagged behind room updates");
                continue;
            }
            Outgoing::Update(Err(broadcast::error::RecvError::Closed)) => break,
        };

        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                warn!(%client_id, error = %e, "Failed to encode event");
                continue;
            }
        };

        if let Err(e) = sender.send(Message::Text(json.into())).await {
            debug!(%client_id, error = %e, "Socket write failed");
            break;
        }
    }
}

/// Read frames from the client and queue one reply per frame.
async fn receive_events(
    mut receiver: SplitStream<WebSocket>,
    replies: mpsc::Sender<OutboundEvent>,
    client_id: String,
    state: Arc<AppState>,
) {
    while let Some(result) = receiver.next().await {
        let reply = match result {
            Ok(Message::Text(text)) => match parse_inbound(text.as_str()) {
                Ok(event) => {
                    let span = event_span(event.name(), &client_id);
                    handle_event(&state, &client_id, event)
                        .instrument(span)
                        .await
                }
                Err(rejected) => {
                    debug!(%client_id, reason = %rejected.reason, "Rejected frame");
                    rejected.into_reply()
                }
            },
            Ok(Message::Binary(_)) => {
                OutboundEvent::invalid("Binary frames are not supported", None)
            }
            Ok(Message::Close(_)) => {
                debug!(%client_id, "Received close frame");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(%client_id, error = %e, "Socket read failed");
                break;
            }
        };

        if replies.send(reply).await.is_err() {
            break;
        }
    }
}

//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::{SubscriptionManager, parse_topics};
use crate::context::StorefrontContext;
use crate::domain::{Session, StoreEvent, Topic};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards events from the [`broadcast::Receiver`] that match the
///   client's topics and are visible to the current session.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<StoreEvent>,
    context: Arc<StorefrontContext>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &context).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(store_event) => {
                        if subs.matches(store_event.topic())
                            && is_visible(&store_event, context.session.current().await.as_ref())
                        {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&store_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Whether `event` may be shown to the holder of `session`.
///
/// Catalog and session events are public to the connection; order and
/// notification events only reach their owner or an administrator.
#[must_use]
pub fn is_visible(event: &StoreEvent, session: Option<&Session>) -> bool {
    if event.topic() == Topic::Session {
        return true;
    }
    match (event.user_id(), session) {
        (None, _) => true,
        (Some(owner), Some(session)) => session.can_act_for(owner),
        (Some(_), None) => false,
    }
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    context: &StorefrontContext,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let payload = match command {
        WsCommand::Subscribe { topics } => {
            let (topics, wildcard, unknown) = parse_topics(&topics);
            subs.subscribe(&topics, wildcard);
            serde_json::json!({
                "subscribed": topics.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                "ignored": unknown,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { topics } => {
            let (topics, wildcard, _) = parse_topics(&topics);
            subs.unsubscribe(&topics, wildcard);
            serde_json::json!({
                "unsubscribed": topics.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::GetBadge => {
            let session = context.session.current().await;
            let unread = match &session {
                Some(session) => context.notifications.unread_count(&session.user_id).await,
                None => 0,
            };
            serde_json::json!({
                "session": session,
                "unread_notifications": unread,
            })
        }
    };

    serde_json::to_string(&WsMessage::new(msg.id, WsMessageType::Response, payload)).ok()
}

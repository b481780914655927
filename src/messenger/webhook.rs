//! Messenger webhook: verification handshake and event receipt.
//!
//! `GET /webhook` answers the subscription challenge. `POST /webhook`
//! accepts the `{ "object": "page", "entry": [ { "messaging": [...] } ] }`
//! envelope, feeds every message event to the intake workflow in order and
//! always acknowledges with `{"ok": true}`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::models::event::{Attachment, AttachmentKind, UserEvent};
use crate::state::AppState;
use crate::workflow::intake;

/// Webhook envelope posted by the platform.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelope {
    /// Subscription object type, `page` for page messaging.
    #[serde(default)]
    pub object: Option<String>,
    /// Batched entries.
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// One entry of the envelope.
///
/// Events stay raw JSON; [`WebhookEnvelope::into_user_events`] parses each
/// one on its own.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    /// Messaging events in delivery order.
    #[serde(default)]
    pub messaging: Vec<serde_json::Value>,
}

/// A single messaging event.
#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    /// Who sent it.
    pub sender: Party,
    /// Message payload; absent for deliveries, reads and postbacks.
    #[serde(default)]
    pub message: Option<InboundMessage>,
}

/// Sender reference.
#[derive(Debug, Deserialize)]
pub struct Party {
    /// Page-scoped identifier.
    pub id: String,
}

/// Message payload of an event.
#[derive(Debug, Default, Deserialize)]
pub struct InboundMessage {
    /// Message identifier.
    #[serde(default)]
    pub mid: Option<String>,
    /// Text body.
    #[serde(default)]
    pub text: Option<String>,
    /// Set on copies of messages the page itself sent.
    #[serde(default)]
    pub is_echo: bool,
    /// Attachments.
    #[serde(default)]
    pub attachments: Vec<InboundAttachment>,
}

/// Attachment of an inbound message.
#[derive(Debug, Deserialize)]
pub struct InboundAttachment {
    /// Attachment type tag (`image`, `video`, `file`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload carrying the media URL.
    #[serde(default)]
    pub payload: Option<AttachmentPayload>,
}

/// Attachment payload.
#[derive(Debug, Deserialize)]
pub struct AttachmentPayload {
    /// Media URL.
    #[serde(default)]
    pub url: Option<String>,
}

impl WebhookEnvelope {
    /// Normalize every message event into a [`UserEvent`], skipping echoes,
    /// events without a message and events that do not parse.
    #[must_use]
    pub fn into_user_events(self) -> Vec<UserEvent> {
        self.entry
            .into_iter()
            .flat_map(|entry| entry.messaging)
            .filter_map(|raw| match serde_json::from_value::<MessagingEvent>(raw) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(%err, "skipping malformed messaging event");
                    None
                }
            })
            .filter_map(|event| {
                let message = event.message?;
                if message.is_echo {
                    return None;
                }
                Some(UserEvent {
                    sender_id: event.sender.id,
                    message_id: message.mid,
                    text: message.text,
                    attachments: message
                        .attachments
                        .into_iter()
                        .map(|attachment| Attachment {
                            kind: AttachmentKind::from_tag(&attachment.kind),
                            url: attachment.payload.and_then(|payload| payload.url),
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

/// Query string of the verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    /// Must be `subscribe`.
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// Shared secret configured on the platform side.
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// Value to echo back.
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Routes served under the application router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", get(verify).post(receive))
}

async fn verify(State(state): State<Arc<AppState>>, Query(params): Query<VerifyParams>) -> Response {
    let expected = &state.config.messenger.verify_token;
    let accepted = params.mode.as_deref() == Some("subscribe")
        && !expected.is_empty()
        && params.verify_token.as_deref() == Some(expected.as_str());

    if accepted {
        info!("messenger webhook verified");
        params.challenge.unwrap_or_default().into_response()
    } else {
        warn!("messenger webhook verification rejected");
        StatusCode::FORBIDDEN.into_response()
    }
}

async fn receive(State(state): State<Arc<AppState>>, body: Bytes) -> Json<serde_json::Value> {
    match serde_json::from_slice::<WebhookEnvelope>(&body) {
        Ok(envelope) => {
            let events = envelope.into_user_events();
            debug!(count = events.len(), "messenger events received");
            for event in events {
                intake::handle_user_event(&state, event).await;
            }
        }
        Err(err) => warn!(%err, "ignoring malformed messenger payload"),
    }
    Json(json!({ "ok": true }))
}

//! Update delivery: long polling or webhook push, both feeding one
//! normalization step and the validation workflow.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{MaybeInaccessibleMessage, UpdateKind};
use teloxide::update_listeners::Polling;
use teloxide::RequestError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::GlobalConfig;
use crate::models::event::ModeratorEvent;
use crate::models::MessageId;
use crate::state::AppState;
use crate::telegram::client::{BotClient, ALLOWED_UPDATES};
use crate::workflow::validation;
use crate::Result;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Path of the webhook route.
pub const WEBHOOK_PATH: &str = "/telegram/webhook";

fn relay_id(id: teloxide::types::MessageId) -> MessageId {
    MessageId(i64::from(id.0))
}

/// Turn an update into a workflow event.
///
/// Returns `None` for updates the workflow does not handle, for anything
/// outside the moderator chat and for users not allowed to moderate.
#[must_use]
pub fn normalize(update: Update, config: &GlobalConfig) -> Option<ModeratorEvent> {
    let chat_id = ChatId(config.telegram.chat_id);

    match update.kind {
        UpdateKind::CallbackQuery(query) => {
            if let Some(message) = &query.message {
                if message.chat().id != chat_id {
                    warn!(chat_id = message.chat().id.0, "callback from foreign chat dropped");
                    return None;
                }
            }
            if !config.is_moderator(query.from.id.0) {
                warn!(user_id = query.from.id.0, "callback from unauthorized user dropped");
                return None;
            }
            let message_has_photo = matches!(
                &query.message,
                Some(MaybeInaccessibleMessage::Regular(message)) if message.photo().is_some()
            );
            Some(ModeratorEvent::Interaction {
                interaction_id: query.id.to_string(),
                message_id: query.message.as_ref().map(|message| relay_id(message.id())),
                message_has_photo,
                action: query.data.unwrap_or_default(),
            })
        }
        UpdateKind::Message(message) => normalize_message(&message, config),
        _ => None,
    }
}

fn normalize_message(message: &Message, config: &GlobalConfig) -> Option<ModeratorEvent> {
    if message.chat.id.0 != config.telegram.chat_id {
        debug!(chat_id = message.chat.id.0, "message from foreign chat dropped");
        return None;
    }
    let authorized = match &message.from {
        Some(user) => config.is_moderator(user.id.0),
        None => config.telegram.authorized_user_ids.is_empty(),
    };
    if !authorized {
        warn!("message from unauthorized user dropped");
        return None;
    }

    let text = message.text()?;
    if let Some(command) = text.strip_prefix('/') {
        let command = command
            .split_whitespace()
            .next()
            .and_then(|word| word.split('@').next())
            .unwrap_or_default()
            .to_owned();
        return Some(ModeratorEvent::Command {
            command,
            message_id: relay_id(message.id),
        });
    }

    let reply_to = message.reply_to_message()?;
    Some(ModeratorEvent::Reply {
        reply_to: relay_id(reply_to.id),
        message_id: relay_id(message.id),
        text: text.to_owned(),
    })
}

/// Normalize one update and run it through the validation workflow.
pub async fn dispatch(state: &AppState, update: Update) {
    let update_id = update.id.0;
    match normalize(update, &state.config) {
        Some(event) => validation::handle_moderator_event(state, event).await,
        None => debug!(update_id, "update ignored"),
    }
}

async fn on_update(update: Update, state: Arc<AppState>) -> ResponseResult<()> {
    dispatch(&state, update).await;
    respond(())
}

fn update_handler() -> UpdateHandler<RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_update))
        .branch(Update::filter_callback_query().endpoint(on_update))
}

/// Spawn the long-polling dispatcher. It drops any registered webhook first
/// and stops when `cancel` fires.
///
/// Failed `getUpdates` calls are retried with teloxide's exponential backoff.
#[must_use]
pub fn spawn_polling(
    state: Arc<AppState>,
    client: Arc<BotClient>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bot = client.bot().clone();
        let listener = Polling::builder(bot.clone())
            .timeout(Duration::from_secs(state.config.telegram.poll_timeout_seconds))
            .allowed_updates(ALLOWED_UPDATES.to_vec())
            .delete_webhook()
            .await
            .build();

        let mut dispatcher = Dispatcher::builder(bot, update_handler())
            .dependencies(dptree::deps![Arc::clone(&state)])
            .default_handler(|_| async {})
            .build();

        info!("telegram polling started");
        tokio::select! {
            () = cancel.cancelled() => {}
            result = dispatcher.try_dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("telegram update listener failed"),
            ) => {
                if let Err(err) = result {
                    error!(%err, "telegram polling could not start");
                    cancel.cancel();
                }
            }
        }
        info!("telegram polling stopped");
    })
}

/// Register the configured webhook URL with the Bot API.
///
/// # Errors
///
/// Returns `AppError::Telegram` if registration fails.
pub async fn register_webhook(client: &BotClient, config: &GlobalConfig) -> Result<()> {
    let url = config.telegram.webhook_url.as_deref().unwrap_or_default();
    client
        .set_webhook(url, config.telegram.webhook_secret.as_deref())
        .await?;
    info!(%url, "telegram webhook registered");
    Ok(())
}

/// Webhook route, mounted only in webhook delivery mode.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(WEBHOOK_PATH, post(receive))
}

async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> (StatusCode, &'static str) {
    if let Some(secret) = state.config.telegram.webhook_secret.as_deref() {
        let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if presented != Some(secret) {
            warn!("telegram webhook call with wrong secret rejected");
            return (StatusCode::UNAUTHORIZED, "unauthorized");
        }
    }

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => dispatch(&state, update).await,
        Err(err) => warn!(%err, "ignoring malformed telegram update"),
    }
    (StatusCode::OK, "OK")
}

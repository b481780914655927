//! Validation state machine: moderator decisions on pending submissions.
//!
//! Button presses are keyed by the message they came from; edit replies by
//! the message they answer, falling back to the most recently updated
//! submission in an editing state. The submission lock is held for the
//! whole handling of one event, publication included, so a second press on
//! "validate" waits and then sees the terminal state.

use tracing::{debug, error, info, warn};

use crate::models::action::ModeratorAction;
use crate::models::event::ModeratorEvent;
use crate::models::menu::Menu;
use crate::models::submission::SubmissionState;
use crate::models::MessageId;
use crate::state::AppState;
use crate::workflow::date::is_valid_date;
use crate::workflow::{announcer, publish};

const START_COMMAND: &str = "start";

/// Process one moderator event end to end. Never fails.
pub async fn handle_moderator_event(state: &AppState, event: ModeratorEvent) {
    match event {
        ModeratorEvent::Command {
            command,
            message_id,
        } => {
            if command == START_COMMAND {
                reply(state, message_id, &state.config.messages.bot_ready, None).await;
            } else {
                debug!(%command, "ignoring unsupported command");
            }
        }
        ModeratorEvent::Reply {
            reply_to,
            message_id,
            text,
        } => handle_reply(state, reply_to, message_id, &text).await,
        ModeratorEvent::Interaction {
            interaction_id,
            message_id,
            message_has_photo,
            action,
        } => {
            handle_interaction(
                state,
                &interaction_id,
                message_id,
                message_has_photo,
                &action,
            )
            .await;
        }
    }
}

async fn handle_interaction(
    state: &AppState,
    interaction_id: &str,
    message_id: Option<MessageId>,
    message_has_photo: bool,
    token: &str,
) {
    let messages = &state.config.messages;

    let record = match message_id {
        Some(message_id) => state.submissions.lookup(message_id).await,
        None => None,
    };
    let (Some(message_id), Some(record)) = (message_id, record) else {
        info!(%interaction_id, action = %token, "interaction on unknown message");
        answer(state, interaction_id, Some(messages.post_not_found.as_str())).await;
        return;
    };

    let mut submission = record.lock().await;
    if submission.is_done() {
        answer(state, interaction_id, Some(messages.already_processed.as_str())).await;
        return;
    }

    let action = ModeratorAction::parse(token);
    info!(
        submission_id = %submission.id,
        %message_id,
        action = %token,
        "moderator action"
    );
    let now = state.clock.now();

    match action {
        ModeratorAction::EditLocation | ModeratorAction::EditDate => {
            let (next, prompt) = if action == ModeratorAction::EditLocation {
                (SubmissionState::EditingLocation, &messages.ask_new_location)
            } else {
                (SubmissionState::EditingDate, &messages.ask_new_date)
            };
            submission.transition(next, now);
            if let Some(prompt_id) = reply(state, message_id, prompt, None).await {
                state.submissions.bind(&submission.id, &[prompt_id]).await;
            }
            answer(state, interaction_id, None).await;
        }
        ModeratorAction::ChooseDeletePhoto => {
            if submission.photos.is_empty() {
                answer(state, interaction_id, Some(messages.no_photo_to_delete.as_str())).await;
                return;
            }
            let menu = Menu::delete_photo(messages, submission.photos.len());
            if let Some(menu_id) = reply(state, message_id, &messages.choose_photo, Some(&menu)).await
            {
                state.submissions.bind_menu(&submission.id, menu_id).await;
            }
            answer(state, interaction_id, None).await;
        }
        ModeratorAction::DeletePhoto(Some(index)) if index < submission.photos.len() => {
            let removed = submission.photos.remove(index);
            submission.transition(SubmissionState::Awaiting, now);
            debug!(submission_id = %submission.id, index, url = %removed, "photo removed");
            // Menu indexes no longer match the photo list.
            state.submissions.unbind_menus(&submission.id).await;
            reply(state, message_id, &messages.photo_deleted, None).await;
            announcer::announce(state, &submission).await;
            answer(state, interaction_id, None).await;
        }
        ModeratorAction::DeletePhoto(_) => {
            reply(state, message_id, &messages.invalid_index, None).await;
            answer(state, interaction_id, None).await;
        }
        ModeratorAction::CancelDeletePhoto => {
            submission.transition(SubmissionState::Awaiting, now);
            answer(state, interaction_id, Some(messages.delete_cancelled.as_str())).await;
        }
        ModeratorAction::Validate => {
            let previous = submission.state;
            submission.transition(SubmissionState::Done, now);
            match publish::publish_submission(state, &submission).await {
                Ok(_) => {
                    close_message(state, message_id, message_has_photo, &messages.published)
                        .await;
                    answer(state, interaction_id, None).await;
                }
                Err(err) => {
                    error!(%err, submission_id = %submission.id, "publication failed");
                    submission.transition(previous, state.clock.now());
                    answer(state, interaction_id, Some(messages.publish_failed.as_str())).await;
                }
            }
        }
        ModeratorAction::Reject => {
            submission.transition(SubmissionState::Done, now);
            info!(submission_id = %submission.id, "submission rejected");
            close_message(state, message_id, message_has_photo, &messages.rejected).await;
            answer(state, interaction_id, None).await;
        }
        ModeratorAction::Unknown(_) => {
            answer(state, interaction_id, Some(messages.unknown_action.as_str())).await;
        }
    }
}

async fn handle_reply(state: &AppState, reply_to: MessageId, message_id: MessageId, text: &str) {
    let messages = &state.config.messages;

    let record = match state.submissions.lookup(reply_to).await {
        Some(record) => Some(record),
        None => state.submissions.find_editing().await,
    };
    let Some(record) = record else {
        reply(state, message_id, &messages.nothing_to_edit, None).await;
        return;
    };

    let mut submission = record.lock().await;
    let text = text.trim();
    match submission.state {
        SubmissionState::EditingLocation => {
            submission.location = text.to_owned();
            submission.transition(SubmissionState::Awaiting, state.clock.now());
            info!(submission_id = %submission.id, "location edited");
            reply(state, message_id, &messages.location_updated, None).await;
            announcer::announce(state, &submission).await;
        }
        SubmissionState::EditingDate if is_valid_date(text) => {
            submission.date = text.to_owned();
            submission.transition(SubmissionState::Awaiting, state.clock.now());
            info!(submission_id = %submission.id, "date edited");
            reply(state, message_id, &messages.date_updated, None).await;
            announcer::announce(state, &submission).await;
        }
        SubmissionState::EditingDate => {
            reply(state, message_id, &messages.date_invalid, None).await;
        }
        SubmissionState::Awaiting | SubmissionState::Done => {
            reply(state, message_id, &messages.nothing_to_edit, None).await;
        }
    }
}

/// Replace the originating message's caption or text with a final notice.
async fn close_message(state: &AppState, message_id: MessageId, has_photo: bool, text: &str) {
    let result = if has_photo {
        state.moderator.edit_message_caption(message_id, text).await
    } else {
        state.moderator.edit_message_text(message_id, text).await
    };
    if let Err(err) = result {
        warn!(%err, %message_id, "failed to edit decided message");
    }
}

async fn reply(
    state: &AppState,
    reply_to: MessageId,
    text: &str,
    menu: Option<&Menu>,
) -> Option<MessageId> {
    match state.moderator.reply_text(reply_to, text, menu).await {
        Ok(id) => Some(id),
        Err(err) => {
            warn!(%err, %reply_to, "failed to reply in moderator chat");
            None
        }
    }
}

async fn answer(state: &AppState, interaction_id: &str, text: Option<&str>) {
    if let Err(err) = state.moderator.answer_interaction(interaction_id, text).await {
        warn!(%err, %interaction_id, "failed to answer interaction");
    }
}

//! Intake state machine: walks one end user through a submission.
//!
//! `idle → awaiting_location → awaiting_date → awaiting_photos → done`,
//! one step consumed per matching inbound event. Each instruction or error
//! goes out at most once per step entry, so retries with blank or garbage
//! input stay silent.

use tracing::{debug, info, warn};

use crate::config::{IntakeConfig, Messages};
use crate::models::event::UserEvent;
use crate::models::session::{IntakeStep, SenderSession};
use crate::models::submission::SubmissionDraft;
use crate::state::AppState;
use crate::workflow::announcer;
use crate::workflow::date::is_valid_date;

/// Data gathered by a completed intake cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedIntake {
    /// Image URLs in upload order.
    pub photos: Vec<String>,
    /// Place name.
    pub location: String,
    /// `DD/MM/YYYY` date.
    pub date: String,
}

/// Effect of one event on a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeOutcome {
    /// Texts to send back to the sender, in order.
    pub replies: Vec<String>,
    /// Set when this event closed the cycle.
    pub completed: Option<CompletedIntake>,
}

impl IntakeOutcome {
    fn reply(text: &str) -> Self {
        Self {
            replies: vec![text.to_owned()],
            completed: None,
        }
    }
}

/// Apply `event` to `session`.
///
/// Duplicate suppression is the caller's job. On completion the session is
/// already reset when this returns.
pub fn advance(
    session: &mut SenderSession,
    event: &UserEvent,
    intake: &IntakeConfig,
    messages: &Messages,
) -> IntakeOutcome {
    let text = event.trimmed_text();

    match session.step {
        IntakeStep::Idle => {
            let triggered = text.is_some_and(|text| {
                text.to_lowercase()
                    .starts_with(&intake.trigger_word.to_lowercase())
            });
            if !triggered {
                return IntakeOutcome::default();
            }
            session.step = IntakeStep::AwaitingLocation;
            IntakeOutcome::reply(&messages.welcome)
        }
        IntakeStep::AwaitingLocation => {
            if session.location.is_some() {
                return IntakeOutcome::default();
            }
            if let Some(location) = text {
                session.location = Some(location.to_owned());
                session.step = IntakeStep::AwaitingDate;
                session.date_error_sent = false;
                session.date_prompt_sent = false;
                return IntakeOutcome::reply(&messages.location_ok);
            }
            if session.location_prompt_sent {
                return IntakeOutcome::default();
            }
            session.location_prompt_sent = true;
            IntakeOutcome::reply(&messages.ask_location)
        }
        IntakeStep::AwaitingDate => {
            if session.date.is_some() {
                return IntakeOutcome::default();
            }
            match text {
                Some(date) if is_valid_date(date) => {
                    session.date = Some(date.to_owned());
                    session.step = IntakeStep::AwaitingPhotos;
                    session.date_error_sent = false;
                    session.date_prompt_sent = false;
                    session.photo_prompt_sent = false;
                    IntakeOutcome::reply(&messages.date_ok)
                }
                Some(_) if session.date_error_sent => IntakeOutcome::default(),
                Some(_) => {
                    session.date_error_sent = true;
                    IntakeOutcome::reply(&messages.date_invalid)
                }
                None if session.date_prompt_sent => IntakeOutcome::default(),
                None => {
                    session.date_prompt_sent = true;
                    IntakeOutcome::reply(&messages.ask_date)
                }
            }
        }
        IntakeStep::AwaitingPhotos if !session.finished => {
            let images = event.image_urls();
            if !images.is_empty() {
                session.photos.extend(images);
                session.photo_prompt_sent = false;
                return IntakeOutcome::reply(&messages.photo_ok);
            }
            let finishing = text
                .is_some_and(|text| text.to_lowercase() == intake.finish_keyword.to_lowercase());
            if finishing {
                session.finished = true;
                session.step = IntakeStep::Done;
                let completed = CompletedIntake {
                    photos: std::mem::take(&mut session.photos),
                    location: session.location.take().unwrap_or_default(),
                    date: session.date.take().unwrap_or_default(),
                };
                session.reset();
                return IntakeOutcome {
                    replies: vec![messages.finish_ok.clone()],
                    completed: Some(completed),
                };
            }
            if session.photo_prompt_sent {
                return IntakeOutcome::default();
            }
            session.photo_prompt_sent = true;
            IntakeOutcome::reply(&messages.ask_photo)
        }
        IntakeStep::AwaitingPhotos | IntakeStep::Done => IntakeOutcome::default(),
    }
}

/// Process one inbound end-user event end to end.
///
/// Never fails: outbound errors are logged and the event is considered
/// handled.
pub async fn handle_user_event(state: &AppState, event: UserEvent) {
    let config = &state.config;
    let session = state
        .sessions
        .get_or_create(&event.sender_id, &config.intake)
        .await;

    let completed = {
        let mut session = session.lock().await;
        if !session.seen.record(event.message_id.as_deref()) {
            debug!(
                sender_id = %event.sender_id,
                message_id = event.message_id.as_deref().unwrap_or("-"),
                "duplicate inbound message ignored"
            );
            return;
        }

        let before = session.step;
        let outcome = advance(&mut session, &event, &config.intake, &config.messages);
        if session.step != before || outcome.completed.is_some() {
            info!(
                sender_id = %event.sender_id,
                from = ?before,
                to = ?session.step,
                "intake step changed"
            );
        }

        for reply in &outcome.replies {
            debug!(sender_id = %event.sender_id, text = %reply, "replying to sender");
            if let Err(err) = state.users.send_text(&event.sender_id, reply).await {
                warn!(%err, sender_id = %event.sender_id, "failed to reply to sender");
            }
        }
        outcome.completed
    };

    let Some(completed) = completed else {
        return;
    };

    let sender_name = display_name(state, &event.sender_id).await;
    let draft = SubmissionDraft {
        photos: completed.photos,
        location: completed.location,
        date: completed.date,
        sender_name,
        sender_id: event.sender_id.clone(),
    };
    announcer::submit(state, draft).await;
}

async fn display_name(state: &AppState, sender_id: &str) -> String {
    match state.users.lookup_display_name(sender_id).await {
        Ok(name) if !name.trim().is_empty() => name.trim().to_owned(),
        Ok(_) => format!("ID {sender_id}"),
        Err(err) => {
            warn!(%err, %sender_id, "display name lookup failed");
            format!("ID {sender_id}")
        }
    }
}

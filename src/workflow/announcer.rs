//! Submission announcer: renders a submission for the moderator.
//!
//! - no photo: one text message carrying the review menu
//! - one photo: one photo message, caption and menu attached
//! - several photos: media groups of `announce.batch_size`, the caption on
//!   the very first photo, then a trailing text message carrying the menu
//!   (media groups cannot hold menus)
//!
//! Every message produced is bound to the submission, replacing whatever
//! an earlier announcement had bound.

use tracing::{error, info, warn};

use crate::config::Messages;
use crate::models::menu::Menu;
use crate::models::submission::{PendingSubmission, SubmissionDraft, SubmissionId};
use crate::models::MessageId;
use crate::state::AppState;

/// Moderator-facing summary of a submission.
#[must_use]
pub fn review_text(messages: &Messages, submission: &PendingSubmission) -> String {
    format!(
        "{}\n{} : {}\n{} : {}\n{} : {}\n{} : {}",
        messages.announce_header,
        messages.label_sender_name,
        submission.sender_name,
        messages.label_sender_id,
        submission.sender_id,
        messages.label_location,
        submission.location,
        messages.label_date,
        submission.date,
    )
}

/// Store a completed intake as a new submission and announce it.
pub async fn submit(state: &AppState, draft: SubmissionDraft) -> SubmissionId {
    let submission = PendingSubmission::new(state.ids.next_id(), draft, state.clock.now());
    let id = submission.id.clone();
    info!(
        submission_id = %id,
        sender_id = %submission.sender_id,
        photos = submission.photos.len(),
        "new submission awaiting moderation"
    );
    state.submissions.insert(submission.clone()).await;
    announce(state, &submission).await;
    id
}

/// Post `submission` to the moderator chat and bind the produced messages.
///
/// Send failures are logged and skipped. When nothing could be sent the
/// previous bindings are kept so the submission stays reachable.
pub async fn announce(state: &AppState, submission: &PendingSubmission) -> Vec<MessageId> {
    let messages = &state.config.messages;
    let text = review_text(messages, submission);
    let menu = Menu::review(messages);
    let moderator = &state.moderator;
    let mut produced = Vec::new();

    match submission.photos.as_slice() {
        [] => match moderator.send_text_with_menu(&text, &menu).await {
            Ok(id) => produced.push(id),
            Err(err) => warn!(%err, submission_id = %submission.id, "failed to announce submission"),
        },
        [url] => match moderator.send_photo(url, Some(text.as_str()), Some(&menu)).await {
            Ok(id) => produced.push(id),
            Err(err) => warn!(%err, submission_id = %submission.id, "failed to announce photo"),
        },
        photos => {
            for (batch, urls) in photos.chunks(state.config.announce.batch_size).enumerate() {
                let caption = (batch == 0).then_some(text.as_str());
                match moderator.send_photo_group(urls, caption).await {
                    Ok(ids) => produced.extend(ids),
                    Err(err) => warn!(
                        %err,
                        submission_id = %submission.id,
                        batch,
                        "failed to announce photo batch"
                    ),
                }
            }
            match moderator
                .send_text_with_menu(&messages.review_prompt, &menu)
                .await
            {
                Ok(id) => produced.push(id),
                Err(err) => warn!(%err, submission_id = %submission.id, "failed to send review menu"),
            }
        }
    }

    if produced.is_empty() {
        error!(
            submission_id = %submission.id,
            "announcement produced no message; keeping previous bindings"
        );
        return produced;
    }

    let dropped = state.submissions.rebind(&submission.id, &produced).await;
    info!(
        submission_id = %submission.id,
        messages = produced.len(),
        invalidated = dropped,
        "submission announced"
    );
    produced
}

//! Publisher bridge: final caption and feed publication.

use tracing::info;

use crate::channels::PublishOutcome;
use crate::config::PublishConfig;
use crate::models::submission::PendingSubmission;
use crate::state::AppState;
use crate::workflow::date::to_display_order;
use crate::Result;

/// Caption of the public post: date (year first), location, body, hashtags.
#[must_use]
pub fn final_caption(publish: &PublishConfig, location: &str, date: &str) -> String {
    let mut sections = vec![format!(
        "{} : {}\n{} : {}",
        publish.date_label,
        to_display_order(date),
        publish.location_label,
        location
    )];
    if !publish.body.trim().is_empty() {
        sections.push(publish.body.clone());
    }
    if !publish.hashtags.is_empty() {
        sections.push(publish.hashtags.join("\n"));
    }
    sections.join("\n\n")
}

/// Publish an approved submission to the feed.
///
/// # Errors
///
/// Propagates the publisher's error; the caller decides how to recover.
pub async fn publish_submission(
    state: &AppState,
    submission: &PendingSubmission,
) -> Result<PublishOutcome> {
    let caption = final_caption(
        &state.config.publish,
        &submission.location,
        &submission.date,
    );
    let outcome = state
        .publisher
        .publish_post(&caption, &submission.photos)
        .await?;
    info!(
        submission_id = %submission.id,
        photos = submission.photos.len(),
        post_id = outcome.post_id.as_deref().unwrap_or("-"),
        "submission published"
    );
    Ok(outcome)
}

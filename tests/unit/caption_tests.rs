use chrono::Utc;
use moderation_relay::config::{Messages, PublishConfig};
use moderation_relay::models::submission::{PendingSubmission, SubmissionDraft, SubmissionId};
use moderation_relay::workflow::announcer::review_text;
use moderation_relay::workflow::publish::final_caption;

#[test]
fn review_text_lists_provenance_and_fields() {
    let messages = Messages::default();
    let submission = PendingSubmission::new(
        SubmissionId("sub-1".into()),
        SubmissionDraft {
            photos: Vec::new(),
            location: "Place X".into(),
            date: "15/10/2025".into(),
            sender_name: "Jane Doe".into(),
            sender_id: "psid-1".into(),
        },
        Utc::now(),
    );

    let text = review_text(&messages, &submission);

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], messages.announce_header);
    assert!(lines[1].ends_with("Jane Doe"));
    assert!(lines[2].ends_with("psid-1"));
    assert!(lines[3].ends_with("Place X"));
    assert!(lines[4].ends_with("15/10/2025"));
}

#[test]
fn default_caption_carries_both_hashtags_last() {
    let caption = final_caption(&PublishConfig::default(), "Place X", "15/10/2025");

    assert!(caption.starts_with("🗓️ Date : 2025/10/15\n📍 Place : Place X\n\n"));
    assert!(caption.ends_with("#مؤسسة_وهران_خضراء\n#ولاية_وهران"));
}

#[test]
fn unmatched_date_is_published_verbatim() {
    let caption = final_caption(&PublishConfig::default(), "Place X", "2025-10-15");
    assert!(caption.contains("2025-10-15"));
}

//! Moderator review flows: announcement fan-out, edits, deletions and decisions.

use std::sync::atomic::Ordering;

use chrono::Duration;
use moderation_relay::config::Messages;
use moderation_relay::models::event::ModeratorEvent;
use moderation_relay::models::submission::{PendingSubmission, SubmissionId, SubmissionState};
use moderation_relay::models::MessageId;
use moderation_relay::workflow::announcer;
use moderation_relay::workflow::retention::purge_decided;
use moderation_relay::workflow::validation::handle_moderator_event;

use super::test_helpers::{draft, harness, press, reply, Harness, ModeratorCall};

async fn submit(h: &Harness, photos: &[&str]) -> (SubmissionId, MessageId) {
    let id = announcer::submit(&h.state, draft(photos)).await;
    (id, h.moderator.last_menu_message())
}

async fn snapshot(h: &Harness, id: &SubmissionId) -> PendingSubmission {
    h.state
        .submissions
        .get(id)
        .await
        .expect("submission stored")
        .lock()
        .await
        .clone()
}

async fn act(h: &Harness, event: ModeratorEvent) {
    handle_moderator_event(&h.state, event).await;
}

#[tokio::test]
async fn twenty_three_photos_make_three_groups_and_one_menu() {
    let h = harness();
    let urls: Vec<String> = (0..23).map(|i| format!("https://cdn/{i}.jpg")).collect();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();

    let (id, _) = submit(&h, &refs).await;

    let calls = h.moderator.calls();
    let groups: Vec<(usize, Option<String>)> = calls
        .iter()
        .filter_map(|call| match call {
            ModeratorCall::Group { urls, caption, .. } => Some((urls.len(), caption.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(groups.len(), 3);
    assert_eq!(
        groups.iter().map(|(len, _)| *len).collect::<Vec<_>>(),
        vec![10, 10, 3]
    );
    assert!(groups[0].1.is_some());
    assert!(groups[1].1.is_none() && groups[2].1.is_none());

    let menus = calls
        .iter()
        .filter(|call| matches!(call, ModeratorCall::TextWithMenu { .. }))
        .count();
    assert_eq!(menus, 1);
    assert!(matches!(calls.last(), Some(ModeratorCall::TextWithMenu { .. })));
    assert_eq!(h.state.submissions.messages_of(&id).await.len(), 24);
}

#[tokio::test]
async fn validate_publishes_once_with_final_caption() {
    let h = harness();
    let messages = Messages::default();
    let (_, menu) = submit(&h, &["u1", "u2"]).await;

    act(&h, press(menu, "validate")).await;

    let posts = h.publisher.posts();
    assert_eq!(posts.len(), 1);
    let (caption, urls) = &posts[0];
    assert!(caption.contains("2025/10/15"));
    assert!(caption.contains("Place X"));
    assert!(caption.contains("#مؤسسة_وهران_خضراء"));
    assert!(caption.contains("#ولاية_وهران"));
    assert_eq!(urls, &vec!["u1".to_owned(), "u2".to_owned()]);
    assert!(h.moderator.calls().contains(&ModeratorCall::EditText {
        message_id: menu,
        text: messages.published.clone(),
    }));

    // Second press, from another message of the same announcement.
    act(&h, press(MessageId(100), "validate")).await;

    assert_eq!(h.publisher.posts().len(), 1);
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.already_processed.clone()))
    );
}

#[tokio::test]
async fn concurrent_validate_presses_publish_once() {
    let h = harness();
    let (_, menu) = submit(&h, &["u1", "u2"]).await;

    tokio::join!(
        act(&h, press(menu, "validate")),
        act(&h, press(MessageId(100), "validate")),
    );

    assert_eq!(h.publisher.posts().len(), 1);
    assert!(h
        .moderator
        .answers()
        .contains(&Some(Messages::default().already_processed)));
}

#[tokio::test]
async fn deciding_on_a_photo_edits_its_caption() {
    let h = harness();
    let (_, photo) = submit(&h, &["u1"]).await;

    act(
        &h,
        ModeratorEvent::Interaction {
            interaction_id: "cb-1".into(),
            message_id: Some(photo),
            message_has_photo: true,
            action: "reject".into(),
        },
    )
    .await;

    assert!(h.moderator.calls().contains(&ModeratorCall::EditCaption {
        message_id: photo,
        text: Messages::default().rejected,
    }));
}

#[tokio::test]
async fn reject_never_publishes_and_is_terminal() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2"]).await;

    act(&h, press(menu, "reject")).await;
    act(&h, press(menu, "validate")).await;

    assert!(h.publisher.posts().is_empty());
    assert_eq!(snapshot(&h, &id).await.state, SubmissionState::Done);
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.already_processed.clone()))
    );
}

#[tokio::test]
async fn unknown_messages_and_actions_are_reported() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2"]).await;

    act(&h, press(MessageId(4242), "validate")).await;
    act(
        &h,
        ModeratorEvent::Interaction {
            interaction_id: "cb-x".into(),
            message_id: None,
            message_has_photo: false,
            action: "validate".into(),
        },
    )
    .await;
    act(&h, press(menu, "archive")).await;

    assert_eq!(
        h.moderator.answers(),
        vec![
            Some(messages.post_not_found.clone()),
            Some(messages.post_not_found.clone()),
            Some(messages.unknown_action.clone()),
        ]
    );
    assert_eq!(snapshot(&h, &id).await.state, SubmissionState::Awaiting);
    assert!(h.publisher.posts().is_empty());
}

#[tokio::test]
async fn location_edit_reannounces_and_invalidates_old_messages() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2"]).await;

    act(&h, press(menu, "edit_location")).await;
    let prompt = h.moderator.last_reply();
    assert_eq!(h.moderator.replies(), vec![messages.ask_new_location.clone()]);
    assert_eq!(snapshot(&h, &id).await.state, SubmissionState::EditingLocation);

    h.moderator.clear();
    act(&h, reply(prompt, "  Place Y ")).await;

    let record = snapshot(&h, &id).await;
    assert_eq!(record.location, "Place Y");
    assert_eq!(record.state, SubmissionState::Awaiting);
    assert_eq!(h.moderator.replies(), vec![messages.location_updated.clone()]);

    let calls = h.moderator.calls();
    let ModeratorCall::Group { caption, .. } = &calls[1] else {
        panic!("expected a fresh announcement, got {:?}", calls[1]);
    };
    assert!(caption.as_deref().unwrap_or_default().contains("Place Y"));

    for stale in [MessageId(100), menu, prompt] {
        assert!(h.state.submissions.lookup(stale).await.is_none());
    }
    let fresh = h.moderator.last_menu_message();
    assert!(h.state.submissions.lookup(fresh).await.is_some());

    act(&h, press(menu, "validate")).await;
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.post_not_found.clone()))
    );
    assert!(h.publisher.posts().is_empty());
}

#[tokio::test]
async fn date_edit_requires_a_valid_date() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1"]).await;

    act(&h, press(menu, "edit_date")).await;
    let prompt = h.moderator.last_reply();

    act(&h, reply(prompt, "2025/10/16")).await;
    assert_eq!(snapshot(&h, &id).await.state, SubmissionState::EditingDate);
    assert_eq!(h.moderator.replies().last(), Some(&messages.date_invalid));

    act(&h, reply(prompt, "16/10/2025")).await;
    let record = snapshot(&h, &id).await;
    assert_eq!(record.date, "16/10/2025");
    assert_eq!(record.state, SubmissionState::Awaiting);

    act(&h, press(h.moderator.last_menu_message(), "validate")).await;
    assert!(h.publisher.posts()[0].0.contains("2025/10/16"));
}

#[tokio::test]
async fn reply_to_unknown_message_falls_back_to_latest_edit() {
    let h = harness();
    let (first, first_menu) = submit(&h, &["u1"]).await;
    let (second, second_menu) = submit(&h, &["u2"]).await;

    act(&h, press(first_menu, "edit_location")).await;
    h.clock.advance(Duration::seconds(5));
    act(&h, press(second_menu, "edit_location")).await;

    act(&h, reply(MessageId(1), "Place Z")).await;

    assert_eq!(snapshot(&h, &second).await.location, "Place Z");
    assert_eq!(snapshot(&h, &first).await.location, "Place X");
    assert_eq!(
        snapshot(&h, &first).await.state,
        SubmissionState::EditingLocation
    );
}

#[tokio::test]
async fn reply_without_pending_edit_is_reported() {
    let h = harness();
    let messages = Messages::default();
    let (_, menu) = submit(&h, &["u1"]).await;

    act(&h, reply(MessageId(1), "Place Z")).await;
    act(&h, reply(menu, "Place Z")).await;

    assert_eq!(
        h.moderator.replies(),
        vec![messages.nothing_to_edit.clone(), messages.nothing_to_edit.clone()]
    );
}

#[tokio::test]
async fn deleting_a_photo_reannounces_and_retires_the_menu() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2", "u3"]).await;

    act(&h, press(menu, "delete_photo")).await;
    let delete_menu = h.moderator.last_menu_message();
    let options = h
        .moderator
        .calls()
        .into_iter()
        .rev()
        .find_map(|call| match call {
            ModeratorCall::Reply { menu: Some(menu), .. } => Some(menu),
            _ => None,
        })
        .expect("delete menu");
    assert_eq!(
        options.actions(),
        vec![
            "delete_photo_0",
            "delete_photo_1",
            "delete_photo_2",
            "cancel_delete_photo"
        ]
    );

    act(&h, press(delete_menu, "delete_photo_1")).await;

    let record = snapshot(&h, &id).await;
    assert_eq!(record.photos, vec!["u1".to_owned(), "u3".to_owned()]);
    assert_eq!(record.state, SubmissionState::Awaiting);
    assert!(h.moderator.replies().contains(&messages.photo_deleted));

    // The old delete menu is stale: its indexes refer to three photos.
    act(&h, press(delete_menu, "delete_photo_0")).await;
    assert_eq!(snapshot(&h, &id).await.photos.len(), 2);
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.post_not_found.clone()))
    );

    // A fresh menu reflects the new order.
    act(&h, press(h.moderator.last_menu_message(), "delete_photo")).await;
    act(&h, press(h.moderator.last_menu_message(), "delete_photo_1")).await;
    assert_eq!(snapshot(&h, &id).await.photos, vec!["u1".to_owned()]);
}

#[tokio::test]
async fn delete_menu_is_retired_even_when_reannouncement_fails() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2", "u3"]).await;

    act(&h, press(menu, "delete_photo")).await;
    let delete_menu = h.moderator.last_menu_message();

    h.moderator.offline.store(true, Ordering::SeqCst);
    act(&h, press(delete_menu, "delete_photo_1")).await;
    h.moderator.offline.store(false, Ordering::SeqCst);

    assert_eq!(snapshot(&h, &id).await.photos, vec!["u1".to_owned(), "u3".to_owned()]);

    act(&h, press(delete_menu, "delete_photo_1")).await;

    assert_eq!(snapshot(&h, &id).await.photos, vec!["u1".to_owned(), "u3".to_owned()]);
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.post_not_found.clone()))
    );
    // The last successful announcement still drives the review.
    assert!(h.state.submissions.lookup(menu).await.is_some());
}

#[tokio::test]
async fn out_of_range_delete_is_reported_without_mutation() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2"]).await;

    act(&h, press(menu, "delete_photo")).await;
    let delete_menu = h.moderator.last_menu_message();
    let before = h.moderator.calls().len();

    act(&h, press(delete_menu, "delete_photo_7")).await;
    act(&h, press(delete_menu, "delete_photo_first")).await;

    assert_eq!(snapshot(&h, &id).await.photos.len(), 2);
    let replies = h.moderator.replies();
    assert_eq!(
        &replies[replies.len() - 2..],
        &[messages.invalid_index.clone(), messages.invalid_index.clone()]
    );
    let announced_again = h.moderator.calls()[before..]
        .iter()
        .any(|call| matches!(call, ModeratorCall::Group { .. }));
    assert!(!announced_again);
}

#[tokio::test]
async fn delete_menu_needs_photos_and_can_be_cancelled() {
    let h = harness();
    let messages = Messages::default();

    let (_, empty_menu) = submit(&h, &[]).await;
    act(&h, press(empty_menu, "delete_photo")).await;
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.no_photo_to_delete.clone()))
    );

    let (id, menu) = submit(&h, &["u1", "u2"]).await;
    act(&h, press(menu, "delete_photo")).await;
    act(&h, press(h.moderator.last_menu_message(), "cancel_delete_photo")).await;
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.delete_cancelled.clone()))
    );
    let record = snapshot(&h, &id).await;
    assert_eq!(record.state, SubmissionState::Awaiting);
    assert_eq!(record.photos.len(), 2);
}

#[tokio::test]
async fn publish_failure_allows_a_retry() {
    let h = harness();
    let messages = Messages::default();
    let (id, menu) = submit(&h, &["u1", "u2"]).await;

    h.publisher.fail.store(true, Ordering::SeqCst);
    act(&h, press(menu, "validate")).await;

    assert_eq!(snapshot(&h, &id).await.state, SubmissionState::Awaiting);
    assert_eq!(
        h.moderator.answers().last(),
        Some(&Some(messages.publish_failed.clone()))
    );
    assert!(!h
        .moderator
        .calls()
        .iter()
        .any(|call| matches!(call, ModeratorCall::EditText { .. })));

    h.publisher.fail.store(false, Ordering::SeqCst);
    act(&h, press(menu, "validate")).await;

    assert_eq!(h.publisher.posts().len(), 1);
    assert_eq!(snapshot(&h, &id).await.state, SubmissionState::Done);
}

#[tokio::test]
async fn failed_batches_do_not_stop_the_menu() {
    let h = harness();
    h.moderator.fail_groups.store(true, Ordering::SeqCst);

    let (id, menu) = submit(&h, &["u1", "u2", "u3"]).await;

    assert_eq!(h.state.submissions.messages_of(&id).await, vec![menu]);
}

#[tokio::test]
async fn start_command_answers_ready() {
    let h = harness();

    act(
        &h,
        ModeratorEvent::Command {
            command: "start".into(),
            message_id: MessageId(77),
        },
    )
    .await;

    assert!(matches!(
        h.moderator.calls().as_slice(),
        [ModeratorCall::Reply { reply_to: MessageId(77), text, .. }]
            if *text == Messages::default().bot_ready
    ));
}

#[tokio::test]
async fn decided_submissions_are_purged_after_retention() {
    let h = harness();
    let (id, menu) = submit(&h, &["u1"]).await;
    let (pending, _) = submit(&h, &["u2"]).await;

    act(&h, press(menu, "reject")).await;
    assert_eq!(purge_decided(&h.state).await, 0);

    h.clock
        .advance(Duration::seconds(i64::try_from(h.state.config.done_retention_seconds).unwrap() + 1));
    assert_eq!(purge_decided(&h.state).await, 1);

    assert!(h.state.submissions.get(&id).await.is_none());
    assert!(h.state.submissions.lookup(menu).await.is_none());
    assert!(h.state.submissions.get(&pending).await.is_some());
}

use moderation_relay::models::action::ModeratorAction;

#[test]
fn delete_photo_menu_token_is_not_an_index() {
    assert_eq!(
        ModeratorAction::parse("delete_photo"),
        ModeratorAction::ChooseDeletePhoto
    );
    assert_eq!(
        ModeratorAction::parse("delete_photo_3"),
        ModeratorAction::DeletePhoto(Some(3))
    );
}

#[test]
fn garbage_index_is_kept_as_invalid_delete() {
    assert_eq!(
        ModeratorAction::parse("delete_photo_x"),
        ModeratorAction::DeletePhoto(None)
    );
    assert_eq!(
        ModeratorAction::parse("delete_photo_-1"),
        ModeratorAction::DeletePhoto(None)
    );
}

#[test]
fn unknown_tokens_round_trip() {
    let action = ModeratorAction::parse("publish_now");
    assert_eq!(action, ModeratorAction::Unknown("publish_now".into()));
    assert_eq!(action.token(), "publish_now");
}

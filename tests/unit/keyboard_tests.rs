use moderation_relay::config::Messages;
use moderation_relay::models::menu::Menu;
use moderation_relay::telegram::keyboard::inline_keyboard;
use serde_json::json;
use teloxide::types::InlineKeyboardButtonKind;

fn callback_data(kind: &InlineKeyboardButtonKind) -> &str {
    match kind {
        InlineKeyboardButtonKind::CallbackData(data) => data,
        other => panic!("expected callback button, got {other:?}"),
    }
}

#[test]
fn review_menu_renders_three_rows() {
    let messages = Messages::default();
    let markup = inline_keyboard(&Menu::review(&messages));

    let shape: Vec<usize> = markup.inline_keyboard.iter().map(Vec::len).collect();
    assert_eq!(shape, vec![2, 1, 2]);
    assert_eq!(callback_data(&markup.inline_keyboard[2][0].kind), "validate");
    assert_eq!(callback_data(&markup.inline_keyboard[2][1].kind), "reject");
    assert_eq!(markup.inline_keyboard[0][0].text, messages.button_edit_location);
}

#[test]
fn delete_menu_serializes_as_bot_api_markup() {
    let messages = Messages::default();
    let markup = inline_keyboard(&Menu::delete_photo(&messages, 1));

    assert_eq!(
        serde_json::to_value(&markup).expect("serializes"),
        json!({
            "inline_keyboard": [
                [{"text": "Delete photo 1", "callback_data": "delete_photo_0"}],
                [{"text": "Cancel", "callback_data": "cancel_delete_photo"}]
            ]
        })
    );
}

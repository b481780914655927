//! Action menu attached to moderator-facing messages.

use serde::{Deserialize, Serialize};

use crate::config::Messages;
use crate::models::action::ModeratorAction;

/// One pressable entry of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    /// Visible label.
    pub label: String,
    /// Opaque action token delivered back when pressed.
    pub action: String,
}

impl MenuButton {
    /// Build a button for a moderator action.
    #[must_use]
    pub fn new(label: impl Into<String>, action: &ModeratorAction) -> Self {
        Self {
            label: label.into(),
            action: action.token(),
        }
    }
}

/// Rows of buttons rendered below a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// Button rows, top to bottom.
    pub rows: Vec<Vec<MenuButton>>,
}

impl Menu {
    /// The review menu attached to every submission announcement.
    #[must_use]
    pub fn review(messages: &Messages) -> Self {
        Self {
            rows: vec![
                vec![
                    MenuButton::new(&messages.button_edit_location, &ModeratorAction::EditLocation),
                    MenuButton::new(&messages.button_edit_date, &ModeratorAction::EditDate),
                ],
                vec![MenuButton::new(
                    &messages.button_delete_photo,
                    &ModeratorAction::ChooseDeletePhoto,
                )],
                vec![
                    MenuButton::new(&messages.button_validate, &ModeratorAction::Validate),
                    MenuButton::new(&messages.button_reject, &ModeratorAction::Reject),
                ],
            ],
        }
    }

    /// One entry per photo plus a trailing cancel entry.
    #[must_use]
    pub fn delete_photo(messages: &Messages, photo_count: usize) -> Self {
        let mut rows: Vec<Vec<MenuButton>> = (0..photo_count)
            .map(|index| {
                let label = messages
                    .button_delete_photo_n
                    .replace("{n}", &(index + 1).to_string());
                vec![MenuButton::new(label, &ModeratorAction::DeletePhoto(Some(index)))]
            })
            .collect();
        rows.push(vec![MenuButton::new(
            &messages.button_cancel,
            &ModeratorAction::CancelDeletePhoto,
        )]);
        Self { rows }
    }

    /// All action tokens in display order.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .map(|button| button.action.as_str())
            .collect()
    }
}

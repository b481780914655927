//! Inline keyboard rendering of [`Menu`].

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::models::menu::Menu;

/// Inline keyboard with one callback button per menu entry, rows preserved.
#[must_use]
pub fn inline_keyboard(menu: &Menu) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(menu.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(&button.label, &button.action))
            .collect::<Vec<_>>()
    }))
}

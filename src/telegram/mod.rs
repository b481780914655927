//! Moderator platform adapter: Telegram Bot API client and update delivery.

pub mod client;
pub mod delivery;
pub mod keyboard;

#![forbid(unsafe_code)]

//! Moderation relay: collects photo posts from Messenger users, has them
//! reviewed in a Telegram chat and publishes approved ones to a Facebook page.

pub mod channels;
pub mod config;
pub mod errors;
pub mod messenger;
pub mod models;
pub mod server;
pub mod state;
pub mod telegram;
pub mod workflow;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

//! End-user platform adapter: Messenger Send API, profiles, page feed, webhook.

pub mod client;
pub mod webhook;

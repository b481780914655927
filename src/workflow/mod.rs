//! Moderation workflow engine: intake, announcement, review, publication.

pub mod announcer;
pub mod date;
pub mod dedup;
pub mod intake;
pub mod publish;
pub mod retention;
pub mod store;
pub mod validation;

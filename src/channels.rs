//! Outbound collaborator interfaces the workflow drives.
//!
//! The workflow never talks HTTP itself. Platform adapters in
//! [`crate::messenger`] and [`crate::telegram`] implement these traits, and
//! tests substitute recording fakes.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::menu::Menu;
use crate::models::submission::SubmissionId;
use crate::models::MessageId;
use crate::Result;

/// Boxed future returned by collaborator methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// End-user messaging platform.
pub trait UserChannel: Send + Sync {
    /// Send a plain text message to an end user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Messenger`](crate::AppError::Messenger) on transport failure.
    fn send_text<'a>(&'a self, recipient: &'a str, text: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Resolve the display name of an end user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Messenger`](crate::AppError::Messenger) when the profile cannot be read.
    fn lookup_display_name<'a>(&'a self, sender_id: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Moderator messaging platform. Every message goes to the configured moderator chat.
pub trait ModeratorChannel: Send + Sync {
    /// Send a text replying to `reply_to`, optionally with a menu.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn reply_text<'a>(
        &'a self,
        reply_to: MessageId,
        text: &'a str,
        menu: Option<&'a Menu>,
    ) -> BoxFuture<'a, Result<MessageId>>;

    /// Send one photo with an optional caption and menu.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn send_photo<'a>(
        &'a self,
        url: &'a str,
        caption: Option<&'a str>,
        menu: Option<&'a Menu>,
    ) -> BoxFuture<'a, Result<MessageId>>;

    /// Send a batch of photos as one group; `first_caption` goes on the first photo.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn send_photo_group<'a>(
        &'a self,
        urls: &'a [String],
        first_caption: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<MessageId>>>;

    /// Send a text with a menu attached.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn send_text_with_menu<'a>(
        &'a self,
        text: &'a str,
        menu: &'a Menu,
    ) -> BoxFuture<'a, Result<MessageId>>;

    /// Replace the text of a text message, removing its menu.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn edit_message_text<'a>(
        &'a self,
        message_id: MessageId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    /// Replace the caption of a photo message, removing its menu.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn edit_message_caption<'a>(
        &'a self,
        message_id: MessageId,
        caption: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    /// Acknowledge a button press, optionally with a short notice.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Telegram`](crate::AppError::Telegram) on transport failure.
    fn answer_interaction<'a>(
        &'a self,
        interaction_id: &'a str,
        text: Option<&'a str>,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Result of a feed publication.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    /// Identifier of the created post, when the provider returned one.
    pub post_id: Option<String>,
    /// Raw provider response.
    pub raw: serde_json::Value,
}

/// Public social feed.
pub trait FeedPublisher: Send + Sync {
    /// Publish a post with `caption` and the given photos.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Publish`](crate::AppError::Publish) when the post cannot be created.
    fn publish_post<'a>(
        &'a self,
        caption: &'a str,
        image_urls: &'a [String],
    ) -> BoxFuture<'a, Result<PublishOutcome>>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of canonical submission identifiers.
pub trait IdGenerator: Send + Sync {
    /// A fresh, unique identifier.
    fn next_id(&self) -> SubmissionId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> SubmissionId {
        SubmissionId(Uuid::new_v4().to_string())
    }
}

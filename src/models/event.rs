//! Normalized inbound events, independent of the delivering platform.

use crate::models::MessageId;

/// Attachment kind reported by the end-user platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    /// A still image.
    Image,
    /// Anything else (audio, video, file, sticker, location...).
    Other(String),
}

impl AttachmentKind {
    /// Map a platform type tag onto a kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag == "image" {
            Self::Image
        } else {
            Self::Other(tag.to_owned())
        }
    }
}

/// One attachment of an end-user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment kind.
    pub kind: AttachmentKind,
    /// Payload URL, when the platform provides one.
    pub url: Option<String>,
}

impl Attachment {
    /// Image attachment pointing at `url`.
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            url: Some(url.into()),
        }
    }
}

/// A message sent by an end user to the page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserEvent {
    /// Platform-scoped sender identifier.
    pub sender_id: String,
    /// Inbound message identifier, absent for non-message events.
    pub message_id: Option<String>,
    /// Text payload.
    pub text: Option<String>,
    /// Attachments in the order the platform listed them.
    pub attachments: Vec<Attachment>,
}

impl UserEvent {
    /// Text-only event.
    #[must_use]
    pub fn text(sender_id: &str, message_id: &str, text: &str) -> Self {
        Self {
            sender_id: sender_id.to_owned(),
            message_id: Some(message_id.to_owned()),
            text: Some(text.to_owned()),
            attachments: Vec::new(),
        }
    }

    /// Event carrying image attachments only.
    #[must_use]
    pub fn images(sender_id: &str, message_id: &str, urls: &[&str]) -> Self {
        Self {
            sender_id: sender_id.to_owned(),
            message_id: Some(message_id.to_owned()),
            text: None,
            attachments: urls.iter().map(|url| Attachment::image(*url)).collect(),
        }
    }

    /// Trimmed text payload; blank text counts as no text.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// URLs of every image attachment, in arrival order.
    #[must_use]
    pub fn image_urls(&self) -> Vec<String> {
        self.attachments
            .iter()
            .filter(|attachment| attachment.kind == AttachmentKind::Image)
            .filter_map(|attachment| attachment.url.clone())
            .collect()
    }
}

/// Something the moderator did in the moderator chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeratorEvent {
    /// A bot command such as `/start`.
    Command {
        /// Command name without the leading slash or bot mention.
        command: String,
        /// Message that carried the command.
        message_id: MessageId,
    },
    /// A text message sent as a reply to an earlier message.
    Reply {
        /// The message being replied to.
        reply_to: MessageId,
        /// The reply itself.
        message_id: MessageId,
        /// Reply text.
        text: String,
    },
    /// A menu button press.
    Interaction {
        /// Platform identifier used to acknowledge the press.
        interaction_id: String,
        /// Message the pressed menu is attached to.
        message_id: Option<MessageId>,
        /// Whether that message is a photo (its caption is edited instead of its text).
        message_has_photo: bool,
        /// Opaque action token.
        action: String,
    },
}

//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which credentials are stored.
const KEYRING_SERVICE: &str = "moderation-relay";

/// Largest photo batch the moderator platform accepts in one media group.
const MAX_BATCH_SIZE: usize = 10;

/// Messenger (end-user channel) and page publishing settings.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MessengerConfig {
    /// Facebook page that receives the published posts.
    pub page_id: String,
    /// Graph API host.
    #[serde(default = "default_graph_api_base")]
    pub graph_api_base: String,
    /// Graph API version segment used by the Send API.
    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,
    /// Per-request timeout for outbound Graph calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Page access token (populated at runtime).
    #[serde(skip)]
    pub page_access_token: String,
    /// Shared secret for the webhook verification handshake (populated at runtime).
    #[serde(skip)]
    pub verify_token: String,
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com".into()
}

fn default_graph_api_version() -> String {
    "v17.0".into()
}

fn default_request_timeout() -> u64 {
    5
}

/// How moderator-channel updates reach the relay.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TelegramDelivery {
    /// Long-poll `getUpdates`.
    #[default]
    Poll,
    /// Receive pushed updates on `/telegram/webhook`.
    Webhook,
}

/// Telegram (moderator channel) settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TelegramConfig {
    /// Chat where submissions are announced and moderated.
    pub chat_id: i64,
    /// Update delivery strategy.
    #[serde(default)]
    pub delivery: TelegramDelivery,
    /// Public URL registered with `setWebhook` in webhook mode.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Telegram user IDs allowed to moderate; empty allows any chat member.
    #[serde(default)]
    pub authorized_user_ids: Vec<u64>,
    /// Bot API host.
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
    /// Bot token (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
    /// Optional secret echoed by Telegram in webhook requests (populated at runtime).
    #[serde(skip)]
    pub webhook_secret: Option<String>,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".into()
}

fn default_poll_timeout() -> u64 {
    30
}

/// Conversational intake settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct IntakeConfig {
    /// Word that opens a submission when a message starts with it.
    pub trigger_word: String,
    /// Keyword that closes the photo step.
    pub finish_keyword: String,
    /// Recorded inbound message IDs per sender before compaction.
    pub dedup_capacity: usize,
    /// Most recent IDs kept when compaction runs.
    pub dedup_retain: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            trigger_word: "samir".into(),
            finish_keyword: "fin".into(),
            dedup_capacity: 30,
            dedup_retain: 15,
        }
    }
}

/// Moderator announcement settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct AnnounceConfig {
    /// Photos per media group.
    pub batch_size: usize,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Final caption settings for published posts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct PublishConfig {
    /// Label preceding the reformatted date.
    pub date_label: String,
    /// Label preceding the location.
    pub location_label: String,
    /// Fixed paragraph placed after the date and location lines.
    pub body: String,
    /// Hashtags appended, one per line.
    pub hashtags: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            date_label: "🗓️ Date".into(),
            location_label: "📍 Place".into(),
            body: "🌿 Photos documenting the regular work our agents carry out to care for \
                   green spaces, as part of the ongoing effort to improve our surroundings."
                .into(),
            hashtags: vec!["#مؤسسة_وهران_خضراء".into(), "#ولاية_وهران".into()],
        }
    }
}

/// Every text the relay sends to end users and moderators.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
#[allow(missing_docs)]
pub struct Messages {
    pub welcome: String,
    pub ask_location: String,
    pub location_ok: String,
    pub ask_date: String,
    pub date_ok: String,
    pub date_invalid: String,
    pub ask_photo: String,
    pub photo_ok: String,
    pub finish_ok: String,
    pub bot_ready: String,
    pub announce_header: String,
    pub label_sender_name: String,
    pub label_sender_id: String,
    pub label_location: String,
    pub label_date: String,
    pub review_prompt: String,
    pub button_edit_location: String,
    pub button_edit_date: String,
    pub button_delete_photo: String,
    pub button_validate: String,
    pub button_reject: String,
    /// Delete-menu entry; `{n}` is replaced by the one-based photo number.
    pub button_delete_photo_n: String,
    pub button_cancel: String,
    pub post_not_found: String,
    pub already_processed: String,
    pub ask_new_location: String,
    pub ask_new_date: String,
    pub no_photo_to_delete: String,
    pub choose_photo: String,
    pub photo_deleted: String,
    pub invalid_index: String,
    pub delete_cancelled: String,
    pub published: String,
    pub publish_failed: String,
    pub rejected: String,
    pub unknown_action: String,
    pub location_updated: String,
    pub date_updated: String,
    pub nothing_to_edit: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "Hello! Please follow the steps to submit your post.".into(),
            ask_location: "Please send the name of the place (e.g. Dar El Beida roundabout)."
                .into(),
            location_ok: "Thanks, the place name has been received!".into(),
            ask_date: "Please send the date as DD/MM/YYYY (e.g. 15/10/2025).".into(),
            date_ok: "Thanks, the date has been received!".into(),
            date_invalid: "Invalid date format. Please send the date as DD/MM/YYYY \
                           (e.g. 15/10/2025)."
                .into(),
            ask_photo: "Send the photos, or type 'fin' when you are done.".into(),
            photo_ok: "Photo(s) received.".into(),
            finish_ok: "Your post has been sent and will be published soon.".into(),
            bot_ready: "Validation bot ready!".into(),
            announce_header: "New publication request:".into(),
            label_sender_name: "Sender name".into(),
            label_sender_id: "Messenger ID".into(),
            label_location: "Place".into(),
            label_date: "Date".into(),
            review_prompt: "Please validate or edit the publication above.".into(),
            button_edit_location: "📝 Edit place".into(),
            button_edit_date: "📝 Edit date".into(),
            button_delete_photo: "🗑️ Delete a photo".into(),
            button_validate: "✅ Validate".into(),
            button_reject: "❌ Reject".into(),
            button_delete_photo_n: "Delete photo {n}".into(),
            button_cancel: "Cancel".into(),
            post_not_found: "Cannot locate this post's data.".into(),
            already_processed: "Already processed.".into(),
            ask_new_location: "Send the new place in reply to this message.".into(),
            ask_new_date: "Send the date as DD/MM/YYYY (e.g. 15/10/2025) in reply to this \
                           message."
                .into(),
            no_photo_to_delete: "No photo to delete.".into(),
            choose_photo: "Tap the photo to delete:".into(),
            photo_deleted: "Photo deleted.".into(),
            invalid_index: "Invalid index.".into(),
            delete_cancelled: "Deletion cancelled.".into(),
            published: "✅ Publication validated and published on Facebook!".into(),
            publish_failed: "⚠️ Publishing failed, please try again.".into(),
            rejected: "❌ Publication rejected.".into(),
            unknown_action: "Action not recognized.".into(),
            location_updated: "Place updated.".into(),
            date_updated: "Date updated.".into(),
            nothing_to_edit: "Nothing to edit currently.".into(),
        }
    }
}

fn default_http_host() -> String {
    "0.0.0.0".into()
}

fn default_http_port() -> u16 {
    8000
}

fn default_done_retention_seconds() -> u64 {
    86_400
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the HTTP server binds to.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    /// HTTP port for webhooks and health checks.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Seconds a decided submission keeps answering "already processed".
    #[serde(default = "default_done_retention_seconds")]
    pub done_retention_seconds: u64,
    /// End-user channel and page settings.
    pub messenger: MessengerConfig,
    /// Moderator channel settings.
    pub telegram: TelegramConfig,
    /// Intake conversation settings.
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Announcement settings.
    #[serde(default)]
    pub announce: AnnounceConfig,
    /// Published caption settings.
    #[serde(default)]
    pub publish: PublishConfig,
    /// Outbound texts.
    #[serde(default)]
    pub messages: Messages,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load platform credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `moderation-relay` keyring service first, then falls back
    /// to `PAGE_ACCESS_TOKEN`, `MESSENGER_VERIFY_TOKEN`, `TELEGRAM_TOKEN`
    /// and the optional `TELEGRAM_WEBHOOK_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required credential is missing from
    /// both the keychain and the environment.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.messenger.page_access_token =
            load_credential("page_access_token", "PAGE_ACCESS_TOKEN").await?;
        self.messenger.verify_token =
            load_credential("messenger_verify_token", "MESSENGER_VERIFY_TOKEN").await?;
        self.telegram.bot_token = load_credential("telegram_token", "TELEGRAM_TOKEN").await?;
        self.telegram.webhook_secret =
            load_credential("telegram_webhook_secret", "TELEGRAM_WEBHOOK_SECRET")
                .await
                .ok();
        Ok(())
    }

    /// Whether a Telegram user may act on submissions.
    #[must_use]
    pub fn is_moderator(&self, user_id: u64) -> bool {
        self.telegram.authorized_user_ids.is_empty()
            || self.telegram.authorized_user_ids.contains(&user_id)
    }

    fn validate(&self) -> Result<()> {
        if self.messenger.page_id.trim().is_empty() {
            return Err(AppError::Config("messenger.page_id must not be empty".into()));
        }

        if self.telegram.chat_id == 0 {
            return Err(AppError::Config("telegram.chat_id must be set".into()));
        }

        if self.telegram.delivery == TelegramDelivery::Webhook
            && self
                .telegram
                .webhook_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(AppError::Config(
                "telegram.webhook_url is required when delivery = \"webhook\"".into(),
            ));
        }

        if self.intake.trigger_word.trim().is_empty() || self.intake.finish_keyword.trim().is_empty()
        {
            return Err(AppError::Config(
                "intake.trigger_word and intake.finish_keyword must not be empty".into(),
            ));
        }

        if self.intake.dedup_retain == 0 || self.intake.dedup_retain >= self.intake.dedup_capacity
        {
            return Err(AppError::Config(
                "intake.dedup_retain must be greater than zero and below dedup_capacity".into(),
            ));
        }

        if !(2..=MAX_BATCH_SIZE).contains(&self.announce.batch_size) {
            return Err(AppError::Config(format!(
                "announce.batch_size must be between 2 and {MAX_BATCH_SIZE}"
            )));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}

//! Bot API client for the moderator chat, built on `teloxide`.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, CallbackQueryId, InputFile, InputMedia, InputMediaPhoto,
    MessageId as TelegramMessageId, ReplyParameters,
};
use teloxide::RequestError;
use tracing::debug;

use crate::channels::{BoxFuture, ModeratorChannel};
use crate::config::TelegramConfig;
use crate::models::menu::Menu;
use crate::models::MessageId;
use crate::telegram::keyboard::inline_keyboard;
use crate::{AppError, Result};

/// Margin added to the long-poll timeout for the HTTP request timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Update kinds the relay consumes.
pub const ALLOWED_UPDATES: [AllowedUpdate; 2] =
    [AllowedUpdate::Message, AllowedUpdate::CallbackQuery];

fn request_error(method: &'static str) -> impl Fn(RequestError) -> AppError {
    move |err| AppError::Telegram(format!("{method} failed: {err}"))
}

fn telegram_id(message_id: MessageId) -> Result<TelegramMessageId> {
    i32::try_from(message_id.0)
        .map(TelegramMessageId)
        .map_err(|_| AppError::Telegram(format!("message id {message_id} out of range")))
}

fn relay_id(message: &Message) -> MessageId {
    MessageId(i64::from(message.id.0))
}

fn photo(url: &str) -> Result<InputFile> {
    reqwest::Url::parse(url)
        .map(InputFile::url)
        .map_err(|err| AppError::Telegram(format!("invalid photo url {url}: {err}")))
}

/// Bot API client bound to one bot token and one moderator chat.
#[derive(Debug, Clone)]
pub struct BotClient {
    bot: Bot,
    chat_id: ChatId,
}

impl BotClient {
    /// Build a client from the `[telegram]` section.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the API base is not a URL or the HTTP
    /// client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let api_url = reqwest::Url::parse(&config.api_base)
            .map_err(|err| AppError::Config(format!("invalid telegram.api_base: {err}")))?;
        // The client timeout must outlast the long-poll timeout.
        let http = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(config.poll_timeout_seconds) + POLL_GRACE)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build telegram client: {err}")))?;

        Ok(Self {
            bot: Bot::with_client(&config.bot_token, http).set_api_url(api_url),
            chat_id: ChatId(config.chat_id),
        })
    }

    /// The underlying teloxide bot.
    #[must_use]
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Register `url` as the update webhook.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` on failure.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .map_err(|err| AppError::Config(format!("invalid telegram.webhook_url: {err}")))?;
        let mut request = self
            .bot
            .set_webhook(url)
            .allowed_updates(ALLOWED_UPDATES);
        if let Some(secret) = secret {
            request = request.secret_token(secret);
        }
        request.await.map_err(request_error("setWebhook"))?;
        Ok(())
    }

    async fn send_message(
        &self,
        text: &str,
        reply_to: Option<MessageId>,
        menu: Option<&Menu>,
    ) -> Result<MessageId> {
        let mut request = self.bot.send_message(self.chat_id, text);
        if let Some(reply_to) = reply_to {
            request = request.reply_parameters(
                ReplyParameters::new(telegram_id(reply_to)?).allow_sending_without_reply(),
            );
        }
        if let Some(menu) = menu {
            request = request.reply_markup(inline_keyboard(menu));
        }
        let sent = request.await.map_err(request_error("sendMessage"))?;
        Ok(relay_id(&sent))
    }

    async fn send_single_photo(
        &self,
        url: &str,
        caption: Option<&str>,
        menu: Option<&Menu>,
    ) -> Result<MessageId> {
        let mut request = self.bot.send_photo(self.chat_id, photo(url)?);
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        if let Some(menu) = menu {
            request = request.reply_markup(inline_keyboard(menu));
        }
        let sent = request.await.map_err(request_error("sendPhoto"))?;
        Ok(relay_id(&sent))
    }

    async fn send_album(&self, urls: &[String], first_caption: Option<&str>) -> Result<Vec<MessageId>> {
        match urls {
            [] => Ok(Vec::new()),
            // sendMediaGroup needs at least two items.
            [url] => Ok(vec![self.send_single_photo(url, first_caption, None).await?]),
            _ => {
                let mut media = Vec::with_capacity(urls.len());
                for (index, url) in urls.iter().enumerate() {
                    let mut item = InputMediaPhoto::new(photo(url)?);
                    if let (0, Some(caption)) = (index, first_caption) {
                        item = item.caption(caption);
                    }
                    media.push(InputMedia::Photo(item));
                }
                let sent = self
                    .bot
                    .send_media_group(self.chat_id, media)
                    .await
                    .map_err(request_error("sendMediaGroup"))?;
                debug!(count = sent.len(), "media group sent");
                Ok(sent.iter().map(relay_id).collect())
            }
        }
    }

    async fn replace_text(&self, message_id: MessageId, text: &str) -> Result<()> {
        self.bot
            .edit_message_text(self.chat_id, telegram_id(message_id)?, text)
            .await
            .map_err(request_error("editMessageText"))?;
        Ok(())
    }

    async fn replace_caption(&self, message_id: MessageId, caption: &str) -> Result<()> {
        self.bot
            .edit_message_caption(self.chat_id, telegram_id(message_id)?)
            .caption(caption)
            .await
            .map_err(request_error("editMessageCaption"))?;
        Ok(())
    }

    async fn answer_callback(&self, interaction_id: &str, text: Option<&str>) -> Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(interaction_id.to_owned()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map_err(request_error("answerCallbackQuery"))?;
        Ok(())
    }
}

impl ModeratorChannel for BotClient {
    fn reply_text<'a>(
        &'a self,
        reply_to: MessageId,
        text: &'a str,
        menu: Option<&'a Menu>,
    ) -> BoxFuture<'a, Result<MessageId>> {
        Box::pin(self.send_message(text, Some(reply_to), menu))
    }

    fn send_photo<'a>(
        &'a self,
        url: &'a str,
        caption: Option<&'a str>,
        menu: Option<&'a Menu>,
    ) -> BoxFuture<'a, Result<MessageId>> {
        Box::pin(self.send_single_photo(url, caption, menu))
    }

    fn send_photo_group<'a>(
        &'a self,
        urls: &'a [String],
        first_caption: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<MessageId>>> {
        Box::pin(self.send_album(urls, first_caption))
    }

    fn send_text_with_menu<'a>(
        &'a self,
        text: &'a str,
        menu: &'a Menu,
    ) -> BoxFuture<'a, Result<MessageId>> {
        Box::pin(self.send_message(text, None, Some(menu)))
    }

    fn edit_message_text<'a>(
        &'a self,
        message_id: MessageId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.replace_text(message_id, text))
    }

    fn edit_message_caption<'a>(
        &'a self,
        message_id: MessageId,
        caption: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.replace_caption(message_id, caption))
    }

    fn answer_interaction<'a>(
        &'a self,
        interaction_id: &'a str,
        text: Option<&'a str>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.answer_callback(interaction_id, text))
    }
}

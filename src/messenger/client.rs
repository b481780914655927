//! Graph API client used for the end-user channel and the page feed.

use std::time::Duration;

use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::channels::{BoxFuture, FeedPublisher, PublishOutcome, UserChannel};
use crate::config::MessengerConfig;
use crate::{AppError, Result};

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    recipient: Recipient<'a>,
    message: TextMessage<'a>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

impl Profile {
    fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_owned()
    }
}

/// Graph API client bound to one page access token.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    version: String,
    page_id: String,
    access_token: String,
}

impl GraphClient {
    /// Build a client from the `[messenger]` section.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &MessengerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|err| AppError::Config(format!("failed to build graph client: {err}")))?;
        Ok(Self {
            http,
            base_url: config.graph_api_base.trim_end_matches('/').to_owned(),
            version: config.graph_api_version.clone(),
            page_id: config.page_id.clone(),
            access_token: config.page_access_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.base_url, self.version)
    }

    async fn send_text_inner(&self, recipient: &str, text: &str) -> Result<()> {
        let body = SendRequest {
            recipient: Recipient { id: recipient },
            message: TextMessage { text },
        };
        let response = self
            .http
            .post(self.url("me/messages"))
            .query(&[("access_token", self.access_token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::Messenger(format!("send failed: {err}")))?;
        let status = response.status();
        debug!(%recipient, %status, "send api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Messenger(format!(
                "send api returned {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn lookup_profile(&self, sender_id: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(sender_id))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("fields", "first_name,last_name"),
            ])
            .send()
            .await
            .map_err(|err| AppError::Messenger(format!("profile lookup failed: {err}")))?;
        if !response.status().is_success() {
            return Err(AppError::Messenger(format!(
                "profile lookup returned {}",
                response.status()
            )));
        }
        let profile: Profile = response
            .json()
            .await
            .map_err(|err| AppError::Messenger(format!("invalid profile payload: {err}")))?;
        Ok(profile.display_name())
    }

    async fn upload_unpublished_photo(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url(&format!("{}/photos", self.page_id)))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("url", url),
                ("published", "false"),
            ])
            .send()
            .await
            .map_err(|err| AppError::Publish(format!("photo upload failed: {err}")))?;
        let body = graph_json(response).await?;
        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| AppError::Publish(format!("photo upload returned no id: {body}")))
    }

    async fn publish(&self, caption: &str, image_urls: &[String]) -> Result<PublishOutcome> {
        let feed_url = self.url(&format!("{}/feed", self.page_id));

        let request = if image_urls.is_empty() {
            self.http.post(&feed_url).query(&[
                ("access_token", self.access_token.as_str()),
                ("message", caption),
            ])
        } else {
            let mut media = Vec::with_capacity(image_urls.len());
            for url in image_urls {
                match self.upload_unpublished_photo(url).await {
                    Ok(id) => media.push(json!({ "media_fbid": id })),
                    Err(err) => warn!(%err, %url, "skipping photo that failed to upload"),
                }
            }
            info!(
                uploaded = media.len(),
                requested = image_urls.len(),
                "photos uploaded for feed post"
            );
            self.http
                .post(&feed_url)
                .query(&[("access_token", self.access_token.as_str())])
                .json(&json!({ "message": caption, "attached_media": media }))
        };

        let response = request
            .send()
            .await
            .map_err(|err| AppError::Publish(format!("feed post failed: {err}")))?;
        let raw = graph_json(response).await?;
        let post_id = raw.get("id").and_then(Value::as_str).map(str::to_owned);
        Ok(PublishOutcome { post_id, raw })
    }
}

/// Decode a Graph response, turning HTTP and API-level errors into `AppError::Publish`.
async fn graph_json(response: Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| AppError::Publish(format!("invalid graph response ({status}): {err}")))?;
    if !status.is_success() || body.get("error").is_some() {
        return Err(AppError::Publish(format!("graph api returned {status}: {body}")));
    }
    Ok(body)
}

impl UserChannel for GraphClient {
    fn send_text<'a>(&'a self, recipient: &'a str, text: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.send_text_inner(recipient, text))
    }

    fn lookup_display_name<'a>(&'a self, sender_id: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.lookup_profile(sender_id))
    }
}

impl FeedPublisher for GraphClient {
    fn publish_post<'a>(
        &'a self,
        caption: &'a str,
        image_urls: &'a [String],
    ) -> BoxFuture<'a, Result<PublishOutcome>> {
        Box::pin(self.publish(caption, image_urls))
    }
}

//! Concrete Slack web-API client implementing the core
//! [`EmojiService`] contract.
//!
//! These are undocumented endpoints of Slack's private web API
//! (`emoji.list`, `emoji.add`, `chat.postMessage`, `team.info`),
//! authenticated with the session cookie jar plus the scraped web API
//! token. Every response carries an `ok` flag; `ok: false` at the listing
//! layer is fatal, while a rejected `emoji.add` is surfaced as data so the
//! install batch can continue.

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;
use tracing::{debug, info};

use parroter_core::contract::{EmojiService, InstalledEmojiSet, ServiceError};

use crate::session::Session;

pub const API_ROOT: &str = "https://slack.com/api";

pub struct SlackClient {
    http: reqwest::Client,
    api_root: String,
    emoji_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(session: &Session) -> Self {
        Self {
            http: session.http.clone(),
            api_root: API_ROOT.to_string(),
            emoji_url: format!("{}/customize/emoji", session.team_url),
            token: session.token.clone(),
        }
    }
}

/// Server-reported failure reason, or `None` when the response is `ok`.
fn response_error(value: &Value) -> Option<String> {
    if value["ok"].as_bool().unwrap_or(false) {
        return None;
    }
    Some(
        value["error"]
            .as_str()
            .unwrap_or("unknown error")
            .to_string(),
    )
}

fn parse_emoji_list(value: &Value) -> Result<InstalledEmojiSet, ServiceError> {
    if let Some(reason) = response_error(value) {
        return Err(format!("unable to load Slack emoji: {reason}").into());
    }
    let emoji = value
        .get("emoji")
        .and_then(Value::as_object)
        .ok_or_else(|| -> ServiceError { "emoji.list response missing emoji map".into() })?;
    Ok(emoji.keys().cloned().collect())
}

#[async_trait]
impl EmojiService for SlackClient {
    async fn list_emoji(&self) -> Result<InstalledEmojiSet, ServiceError> {
        info!("Fetching installed team emoji");
        let value: Value = self
            .http
            .get(format!("{}/emoji.list", self.api_root))
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let installed = parse_emoji_list(&value)?;
        info!(count = installed.len(), "Fetched installed team emoji");
        Ok(installed)
    }

    async fn add_emoji(&self, slug: &str, image: Vec<u8>) -> Result<Option<String>, ServiceError> {
        debug!(slug, bytes = image.len(), "Uploading emoji");

        // The upload endpoint expects a visit to the customize page first.
        self.http
            .get(&self.emoji_url)
            .send()
            .await?
            .error_for_status()?;

        let part = multipart::Part::bytes(image).file_name(slug.to_string());
        let form = multipart::Form::new()
            .text("token", self.token.clone())
            .text("name", slug.to_string())
            .text("mode", "data")
            .part("image", part);

        let value: Value = self
            .http
            .post(format!("{}/emoji.add", self.api_root))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response_error(&value))
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ServiceError> {
        let value: Value = self
            .http
            .post(format!("{}/chat.postMessage", self.api_root))
            .form(&[
                ("token", self.token.as_str()),
                ("channel", channel),
                ("text", text),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match response_error(&value) {
            None => Ok(()),
            Some(reason) => Err(format!("chat.postMessage failed: {reason}").into()),
        }
    }
}

/// `team.info` identity check: the team name the token belongs to, or
/// `None` when the service rejects the token.
pub async fn fetch_team_name(
    http: &reqwest::Client,
    api_root: &str,
    token: &str,
) -> anyhow::Result<Option<String>> {
    use anyhow::Context;

    let value: Value = http
        .get(format!("{api_root}/team.info"))
        .query(&[("token", token)])
        .send()
        .await
        .context("team identity check failed")?
        .error_for_status()
        .context("team identity check failed")?
        .json()
        .await
        .context("team identity check returned a malformed response")?;

    if !value["ok"].as_bool().unwrap_or(false) {
        return Ok(None);
    }
    Ok(value["team"]["name"].as_str().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emoji_list_parses_names() {
        let value = json!({
            "ok": true,
            "emoji": {"parrot": "https://emoji.example/parrot.gif", "shipit": "alias:squirrel"}
        });
        let installed = parse_emoji_list(&value).expect("valid response should parse");
        assert_eq!(installed.len(), 2);
        assert!(installed.contains("parrot"));
        assert!(installed.contains("shipit"));
        assert!(!installed.contains("Parrot"));
    }

    #[test]
    fn emoji_list_error_flag_is_fatal() {
        let value = json!({"ok": false, "error": "invalid_auth"});
        let err = parse_emoji_list(&value).expect_err("error response must fail");
        assert!(err.to_string().contains("invalid_auth"));
    }

    #[test]
    fn emoji_list_without_map_is_fatal() {
        let value = json!({"ok": true});
        assert!(parse_emoji_list(&value).is_err());
    }

    #[test]
    fn response_error_extracts_server_reason() {
        assert_eq!(response_error(&json!({"ok": true})), None);
        assert_eq!(
            response_error(&json!({"ok": false, "error": "error_name_taken"})).as_deref(),
            Some("error_name_taken")
        );
        assert_eq!(
            response_error(&json!({"ok": false})).as_deref(),
            Some("unknown error")
        );
    }
}

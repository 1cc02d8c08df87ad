use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::messages::{LineMessage, MAX_REPLY_MESSAGES};

const REPLY_PATH: &str = "/v2/bot/message/reply";

/// One reply to one webhook event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
    #[serde(rename = "replyToken")]
    pub reply_token: String,
    pub messages: Vec<LineMessage>,
}

impl Reply {
    pub fn new(reply_token: impl Into<String>, mut messages: Vec<LineMessage>) -> Self {
        if messages.len() > MAX_REPLY_MESSAGES {
            warn!(
                event_name = "line.reply.truncated",
                messages = messages.len(),
                "dropping messages beyond the reply limit"
            );
            messages.truncate(MAX_REPLY_MESSAGES);
        }
        Self { reply_token: reply_token.into(), messages }
    }
}

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("messaging API answered {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait LineReplyClient: Send + Sync {
    async fn reply(&self, reply: &Reply) -> Result<(), ReplyError>;
}

/// Posts replies to the LINE Messaging API.
#[derive(Clone, Debug)]
pub struct HttpReplyClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl HttpReplyClient {
    pub fn new(
        api_base_url: &str,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, ReplyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}{REPLY_PATH}", api_base_url.trim_end_matches('/'));
        Ok(Self { http, endpoint, access_token })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LineReplyClient for HttpReplyClient {
    async fn reply(&self, reply: &Reply) -> Result<(), ReplyError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.access_token.expose_secret())
            .json(reply)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplyError::Status { status: status.as_u16(), body });
        }

        debug!(
            event_name = "line.reply.sent",
            messages = reply.messages.len(),
            "reply delivered"
        );
        Ok(())
    }
}

/// Drops every reply. Used by local tooling that has no channel credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReplyClient;

#[async_trait]
impl LineReplyClient for NoopReplyClient {
    async fn reply(&self, _reply: &Reply) -> Result<(), ReplyError> {
        Ok(())
    }
}

/// Keeps replies in memory so callers can inspect what would have been sent.
#[derive(Debug, Default)]
pub struct RecordingReplyClient {
    replies: Mutex<Vec<Reply>>,
}

impl RecordingReplyClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<Reply> {
        match self.replies.lock() {
            Ok(replies) => replies.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl LineReplyClient for RecordingReplyClient {
    async fn reply(&self, reply: &Reply) -> Result<(), ReplyError> {
        match self.replies.lock() {
            Ok(mut replies) => replies.push(reply.clone()),
            Err(poisoned) => poisoned.into_inner().push(reply.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::{HttpReplyClient, LineReplyClient, RecordingReplyClient, Reply};
    use crate::messages::{LineMessage, MAX_REPLY_MESSAGES};

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let client = HttpReplyClient::new(
            "https://api.line.me/",
            "token".to_owned().into(),
            Duration::from_secs(5),
        )
        .expect("client builds");
        assert_eq!(client.endpoint(), "https://api.line.me/v2/bot/message/reply");
    }

    #[test]
    fn reply_is_capped_at_the_message_limit() {
        let messages = (0..7).map(|index| LineMessage::text(format!("m{index}"))).collect();
        let reply = Reply::new("token", messages);
        assert_eq!(reply.messages.len(), MAX_REPLY_MESSAGES);
    }

    #[test]
    fn reply_serializes_with_line_field_names() {
        let reply = Reply::new("r-1", vec![LineMessage::text("hi")]);
        assert_eq!(
            serde_json::to_value(&reply).expect("serializes"),
            json!({"replyToken": "r-1", "messages": [{"type": "text", "text": "hi"}]})
        );
    }

    #[tokio::test]
    async fn recording_client_keeps_replies_in_order() {
        let client = RecordingReplyClient::new();
        client.reply(&Reply::new("a", vec![])).await.expect("records");
        client.reply(&Reply::new("b", vec![])).await.expect("records");

        let tokens: Vec<_> = client.replies().into_iter().map(|reply| reply.reply_token).collect();
        assert_eq!(tokens, vec!["a", "b"]);
    }
}

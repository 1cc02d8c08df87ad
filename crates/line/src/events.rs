//! Inbound webhook model. Only the fields the dialogue needs are parsed;
//! every other event or message type deserializes to an `Unsupported` variant.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Message(MessageEvent),
    Postback(PostbackEvent),
    #[serde(other)]
    Unsupported,
}

impl WebhookEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Postback(_) => "postback",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn webhook_event_id(&self) -> Option<&str> {
        match self {
            Self::Message(event) => event.webhook_event_id.as_deref(),
            Self::Postback(event) => event.webhook_event_id.as_deref(),
            Self::Unsupported => None,
        }
    }

    /// Redeliveries carry the same event id, so it doubles as the correlation id.
    pub fn correlation_id(&self) -> String {
        self.webhook_event_id().unwrap_or("unknown-correlation-id").to_owned()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub reply_token: String,
    #[serde(default)]
    pub webhook_event_id: Option<String>,
    pub message: MessageContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostbackEvent {
    pub reply_token: String,
    #[serde(default)]
    pub webhook_event_id: Option<String>,
    pub postback: PostbackContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

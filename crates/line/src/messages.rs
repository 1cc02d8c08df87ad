use std::borrow::Cow;

use rentquote_core::flows::{codec, DialogueOption, NextStep, Resolution};
use rentquote_core::pricing::{format_yen, Variant};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;
use url::form_urlencoded;

/// LINE accepts at most this many characters of postback data.
pub const MAX_POSTBACK_DATA_CHARS: usize = 300;
/// LINE accepts at most five messages per reply.
pub const MAX_REPLY_MESSAGES: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineMessage {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: Value,
    },
}

impl LineMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into(), quick_reply: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuickReplyItem {
    Action { action: Action },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    Postback {
        label: String,
        data: String,
        #[serde(rename = "displayText")]
        display_text: String,
    },
}

/// Prompt text with one quick-reply button per offered option.
pub fn quick_reply_prompt(step: &NextStep) -> LineMessage {
    prompt_with_text(step.prompt.clone(), step)
}

pub fn prompt_with_text(text: String, step: &NextStep) -> LineMessage {
    let items = step
        .options
        .iter()
        .map(|option| QuickReplyItem::Action { action: postback_action(&step.state_token, option) })
        .collect();
    LineMessage::Text { text, quick_reply: Some(QuickReply { items }) }
}

fn postback_action(state_token: &str, option: &DialogueOption) -> Action {
    let data = postback_data(state_token, &option.value);
    if data.chars().count() > MAX_POSTBACK_DATA_CHARS {
        warn!(
            event_name = "line.message.postback_too_long",
            chars = data.chars().count(),
            option = %option.value,
            "postback data exceeds the LINE limit"
        );
    }
    Action::Postback {
        label: option.label.clone(),
        data,
        display_text: option.display.clone(),
    }
}

/// Postback payload carrying the trail plus the picked value.
///
/// The codec percent-encodes every non-ASCII byte, which triples the length of
/// Japanese values. Postback data is plain text, so only the separators are
/// escaped here; the codec's parser reads both forms.
pub fn postback_data(state_token: &str, value: &str) -> String {
    let mut data = String::new();
    let pairs = form_urlencoded::parse(state_token.as_bytes())
        .chain(std::iter::once((Cow::Borrowed(codec::CHOICE_KEY), Cow::Borrowed(value))));
    for (key, value) in pairs {
        if !data.is_empty() {
            data.push('&');
        }
        data.push_str(&escape_separators(&key));
        data.push('=');
        data.push_str(&escape_separators(&value));
    }
    data
}

fn escape_separators(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '&' => escaped.push_str("%26"),
            '=' => escaped.push_str("%3D"),
            '+' => escaped.push_str("%2B"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Flex bubble listing every known price of the resolved variant.
pub fn price_card(resolution: &Resolution) -> LineMessage {
    let variant = &resolution.variant;
    let mut rows = vec![
        price_row("日額", format_yen(variant.day)),
        price_row("月額", format_yen(variant.month)),
    ];
    for (label, value) in optional_prices(variant) {
        rows.push(price_row(label, format_yen(Some(value))));
    }

    let mut body = vec![
        json!({"type": "text", "text": resolution.title, "weight": "bold", "size": "md", "wrap": true}),
        json!({"type": "separator", "margin": "md"}),
        json!({"type": "box", "layout": "vertical", "margin": "md", "spacing": "sm", "contents": rows}),
    ];
    if let Some(note) = &variant.note {
        body.push(json!({"type": "text", "text": note, "size": "xs", "color": "#888888", "wrap": true, "margin": "md"}));
    }

    LineMessage::Flex {
        alt_text: format!("{}　日額 {}", resolution.title, format_yen(variant.day)),
        contents: json!({
            "type": "bubble",
            "body": {"type": "box", "layout": "vertical", "contents": body},
        }),
    }
}

fn optional_prices(variant: &Variant) -> Vec<(&'static str, Decimal)> {
    [("基本管理料", variant.base), ("補償料", variant.ins), ("環境整備費", variant.env)]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| (label, value)))
        .collect()
}

fn price_row(label: &str, value: String) -> Value {
    json!({
        "type": "box",
        "layout": "horizontal",
        "contents": [
            {"type": "text", "text": label, "size": "sm", "color": "#555555", "flex": 0},
            {"type": "text", "text": value, "size": "sm", "align": "end"},
        ],
    })
}

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::{CatalogItem, RawVariant};

/// Label used when a price entry carries no distinguishing label.
pub const DEFAULT_VARIANT_LABEL: &str = "通常";

/// One concrete price quote with canonical numeric fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub label: String,
    pub day: Option<Decimal>,
    pub month: Option<Decimal>,
    pub base: Option<Decimal>,
    pub ins: Option<Decimal>,
    pub env: Option<Decimal>,
    pub note: Option<String>,
}

impl Default for Variant {
    fn default() -> Self {
        Self {
            label: DEFAULT_VARIANT_LABEL.to_owned(),
            day: None,
            month: None,
            base: None,
            ins: None,
            env: None,
            note: None,
        }
    }
}

impl Variant {
    pub fn from_raw(raw: &RawVariant) -> Self {
        Self {
            label: variant_label(raw.label.as_deref()).to_owned(),
            day: to_number(&raw.day),
            month: to_number(&raw.month),
            base: to_number(&raw.base),
            ins: to_number(&raw.ins),
            env: to_number(&raw.env),
            note: raw.note.clone().filter(|note| !note.trim().is_empty()),
        }
    }

    /// Adds a surcharge to the day/month prices. Unknown prices stay unknown,
    /// and a sum past `Decimal::MAX` becomes unknown too.
    pub fn with_surcharge(mut self, day: Decimal, month: Decimal) -> Self {
        self.day = self.day.and_then(|value| value.checked_add(day));
        self.month = self.month.and_then(|value| value.checked_add(month));
        self
    }

    pub fn is_unpriced(&self) -> bool {
        [self.day, self.month, self.base, self.ins, self.env].iter().all(Option::is_none)
    }
}

pub fn variant_label(label: Option<&str>) -> &str {
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => label,
        _ => DEFAULT_VARIANT_LABEL,
    }
}

/// Converts a raw price value into a number. Never fails: anything that does
/// not carry a usable number becomes `None`.
pub fn to_number(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Some(Decimal::from(integer))
            } else {
                number.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(text) => parse_price(text),
        _ => None,
    }
}

/// Parses display strings such as `¥20,000`, `２０，０００円` or `8000.5`.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .nfkc()
        .map(|ch| match ch {
            '\u{2212}' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' => '-',
            other => other,
        })
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();

    if !cleaned.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Variants first, then legacy flat fields, then an unpriced default.
pub fn pick_variant(item: &CatalogItem) -> Variant {
    if let Some(raw) = item.variants.first() {
        return Variant::from_raw(raw);
    }

    legacy_variant(item)
}

/// Picks the first variant carrying `label`, falling back to [`pick_variant`].
pub fn pick_labeled_variant(item: &CatalogItem, label: &str) -> Variant {
    item.variants
        .iter()
        .find(|raw| variant_label(raw.label.as_deref()) == label)
        .map(Variant::from_raw)
        .unwrap_or_else(|| pick_variant(item))
}

/// Labels of the item's variants in display order.
pub fn variant_labels(item: &CatalogItem) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for raw in &item.variants {
        let label = variant_label(raw.label.as_deref());
        if !labels.iter().any(|existing| existing == label) {
            labels.push(label.to_owned());
        }
    }
    labels
}

fn legacy_variant(item: &CatalogItem) -> Variant {
    Variant {
        label: DEFAULT_VARIANT_LABEL.to_owned(),
        day: to_number(&item.day),
        month: to_number(&item.month),
        base: to_number(&item.base),
        ins: to_number(&item.ins),
        env: to_number(&item.env),
        note: item.note.clone().filter(|note| !note.trim().is_empty()),
    }
}

/// Renders `¥8,000`; unknown prices render as an inquiry prompt.
pub fn format_yen(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "要お問い合わせ".to_owned();
    };

    let rendered = value.round_dp(2).normalize().to_string();
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}¥{grouped}.{fraction}"),
        None => format!("{sign}¥{grouped}"),
    }
}

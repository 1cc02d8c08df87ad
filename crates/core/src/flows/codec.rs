//! Flat key-value encoding of [`SelectionState`] carried between turns.
//!
//! Tokens are `application/x-www-form-urlencoded` pairs so they fit directly
//! into postback payloads. Key order does not matter and missing keys decode
//! to unset fields.

use thiserror::Error;
use url::form_urlencoded;

use crate::flows::states::SelectionState;

const CATEGORY_KEY: &str = "cat";
const MODEL_KEY: &str = "model";
const CLASS_KEY: &str = "cls";
const DIMENSION_PREFIX: &str = "dim.";
const NAME_KEY: &str = "name";
const VARIANT_KEY: &str = "var";
const QUERY_KEY: &str = "q";
const PAGE_KEY: &str = "page";
/// Key of the picked value in postback payloads.
pub const CHOICE_KEY: &str = "val";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("state token has an invalid `{key}` value: `{value}`")]
    InvalidField { key: String, value: String },
    #[error("state token repeats `{0}` with different values")]
    ConflictingKey(String),
    #[error("state token has a dimension key without an id")]
    EmptyDimensionId,
}

pub fn encode(state: &SelectionState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_state(&mut serializer, state);
    serializer.finish()
}

/// Encodes the trail plus the value the user picks with it.
pub fn encode_choice(state: &SelectionState, value: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_state(&mut serializer, state);
    serializer.append_pair(CHOICE_KEY, value);
    serializer.finish()
}

pub fn decode(token: &str) -> Result<SelectionState, CodecError> {
    decode_choice(token).map(|(state, _)| state)
}

/// Splits a postback payload into the trail and the picked value, if any.
pub fn decode_choice(token: &str) -> Result<(SelectionState, Option<String>), CodecError> {
    let mut state = SelectionState::default();
    let mut choice = None;

    for (key, value) in form_urlencoded::parse(token.trim().as_bytes()) {
        if key == CHOICE_KEY {
            set_once(&mut choice, &key, value.into_owned())?;
            continue;
        }
        if value.is_empty() {
            continue;
        }

        match &*key {
            CATEGORY_KEY => set_once(&mut state.category, &key, value.into_owned())?,
            MODEL_KEY => set_once(&mut state.model, &key, value.into_owned())?,
            CLASS_KEY => set_once(&mut state.class, &key, value.into_owned())?,
            NAME_KEY => set_once(&mut state.name, &key, value.into_owned())?,
            VARIANT_KEY => set_once(&mut state.variant, &key, value.into_owned())?,
            QUERY_KEY => set_once(&mut state.query, &key, value.into_owned())?,
            PAGE_KEY => {
                state.page = value.parse().map_err(|_| CodecError::InvalidField {
                    key: PAGE_KEY.to_owned(),
                    value: value.clone().into_owned(),
                })?;
            }
            other => {
                let Some(id) = other.strip_prefix(DIMENSION_PREFIX) else {
                    continue;
                };
                if id.is_empty() {
                    return Err(CodecError::EmptyDimensionId);
                }
                let previous = state.dimensions.insert(id.to_owned(), value.clone().into_owned());
                if previous.is_some_and(|previous| previous != value) {
                    return Err(CodecError::ConflictingKey(other.to_owned()));
                }
            }
        }
    }

    Ok((state, choice))
}

fn append_state(serializer: &mut form_urlencoded::Serializer<'_, String>, state: &SelectionState) {
    let fields = [
        (CATEGORY_KEY, &state.category),
        (MODEL_KEY, &state.model),
        (CLASS_KEY, &state.class),
        (NAME_KEY, &state.name),
        (VARIANT_KEY, &state.variant),
        (QUERY_KEY, &state.query),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            serializer.append_pair(key, value);
        }
    }
    for (id, value) in &state.dimensions {
        serializer.append_pair(&format!("{DIMENSION_PREFIX}{id}"), value);
    }
    if state.page > 0 {
        serializer.append_pair(PAGE_KEY, &state.page.to_string());
    }
}

fn set_once(slot: &mut Option<String>, key: &str, value: String) -> Result<(), CodecError> {
    match slot {
        Some(existing) if *existing != value => Err(CodecError::ConflictingKey(key.to_owned())),
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}

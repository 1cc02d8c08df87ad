use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pricing::Variant;

/// Accumulated trail of one in-progress dialogue. Carried by the client in
/// the state token; never stored on the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub category: Option<String>,
    pub model: Option<String>,
    pub class: Option<String>,
    pub dimensions: BTreeMap<String, String>,
    pub name: Option<String>,
    pub variant: Option<String>,
    /// Normalized free text that narrowed the category list on the first turn.
    pub query: Option<String>,
    /// Page of the pending option set.
    pub page: u32,
}

impl SelectionState {
    pub fn for_category(category: impl Into<String>) -> Self {
        Self { category: Some(category.into()), ..Self::default() }
    }

    pub fn adopt(&mut self, step: &DialogueStep, value: impl Into<String>) {
        let value = value.into();
        match step {
            DialogueStep::Category => {
                self.category = Some(value);
                self.query = None;
            }
            DialogueStep::Model => self.model = Some(value),
            DialogueStep::Class => self.class = Some(value),
            DialogueStep::Dimension(id) => {
                self.dimensions.insert(id.clone(), value);
            }
            DialogueStep::Name => self.name = Some(value),
            DialogueStep::Variant => self.variant = Some(value),
        }
        self.page = 0;
    }
}

/// Decision the dialogue is waiting for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", content = "dimension", rename_all = "snake_case")]
pub enum DialogueStep {
    Category,
    Model,
    Class,
    Dimension(String),
    Name,
    Variant,
}

impl DialogueStep {
    pub fn default_prompt(&self) -> &'static str {
        match self {
            Self::Category => "カテゴリを選択してください",
            Self::Model => "機種を選択してください",
            Self::Class => "クラスを選択してください",
            Self::Dimension(_) => "仕様を選択してください",
            Self::Name => "仕様を選択してください",
            Self::Variant => "料金区分を選択してください",
        }
    }
}

impl fmt::Display for DialogueStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => formatter.write_str("category"),
            Self::Model => formatter.write_str("model"),
            Self::Class => formatter.write_str("class"),
            Self::Dimension(id) => write!(formatter, "dimension:{id}"),
            Self::Name => formatter.write_str("name"),
            Self::Variant => formatter.write_str("variant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueOption {
    /// Short label for quick-reply buttons.
    pub label: String,
    /// Full text for clients that can render it.
    pub display: String,
    /// Value to send back with the state token.
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub step: DialogueStep,
    pub prompt: String,
    pub options: Vec<DialogueOption>,
    pub state_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub title: String,
    pub variant: Variant,
    pub selection: SelectionState,
    pub surcharge_applied: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    InvalidSelection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DialogueOutcome {
    NextStep(NextStep),
    Resolved(Resolution),
    Failed { reason: FailureReason, reprompt: Option<NextStep> },
}

impl DialogueOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NextStep(_) => "next_step",
            Self::Resolved(_) => "resolved",
            Self::Failed { reason: FailureReason::NotFound, .. } => "not_found",
            Self::Failed { reason: FailureReason::InvalidSelection, .. } => "invalid_selection",
        }
    }
}

//! Per-category exceptions to the default selection flow, expressed as data.
//!
//! The default flow asks for category, class, name and variant in that order.
//! A [`Rule`] can bypass levels, restrict the candidates at a level, inject
//! extra decision dimensions between class and name, force a dimension value
//! for combinations the catalog does not price, and add a class-keyed
//! surcharge after resolution. The [`RuleTable`] picks the rule for a
//! category (optionally refined by model) and never fails to return one.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Model,
    Class,
    Name,
    Variant,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Adopt the value only when exactly one remains; otherwise ask.
    #[default]
    Advisory,
    /// Adopt the first remaining value in catalog order.
    FirstMatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ItemPredicate {
    NameContains(String),
    NameEquals(String),
    BaseModelEquals(String),
}

impl ItemPredicate {
    pub fn matches(&self, item: &CatalogItem) -> bool {
        match self {
            Self::NameContains(needle) => item.name.contains(needle.as_str()),
            Self::NameEquals(name) => item.name == *name,
            Self::BaseModelEquals(model) => item.base_model() == model,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedFilter {
    pub level: Level,
    pub predicate: ItemPredicate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedOptions {
    pub level: Level,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionOption {
    pub label: String,
    /// Text that identifies this option inside catalog names. Defaults to the label.
    #[serde(default)]
    pub needle: Option<String>,
    /// Names containing any of these are not a match for this option.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl DimensionOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), needle: None, exclude: Vec::new() }
    }

    pub fn without(label: impl Into<String>, excluded: &[&str]) -> Self {
        Self {
            label: label.into(),
            needle: Some(String::new()),
            exclude: excluded.iter().map(|value| (*value).to_owned()).collect(),
        }
    }

    pub fn needle(&self) -> &str {
        self.needle.as_deref().unwrap_or(&self.label)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDimension {
    pub id: String,
    pub prompt: String,
    pub options: Vec<DimensionOption>,
    /// Classes this dimension is asked for. Empty means every class.
    #[serde(default)]
    pub applies_when_class: Vec<String>,
    /// `false` for addenda that are not encoded in catalog names.
    #[serde(default = "default_true")]
    pub filters_name: bool,
}

impl ExtraDimension {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, options: Vec<DimensionOption>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
            applies_when_class: Vec::new(),
            filters_name: true,
        }
    }

    pub fn for_classes(mut self, classes: &[&str]) -> Self {
        self.applies_when_class = classes.iter().map(|value| (*value).to_owned()).collect();
        self
    }

    pub fn addendum(mut self) -> Self {
        self.filters_name = false;
        self
    }

    pub fn applies_to(&self, class: Option<&str>) -> bool {
        if self.applies_when_class.is_empty() {
            return true;
        }
        class.is_some_and(|class| self.applies_when_class.iter().any(|value| value == class))
    }

    pub fn option(&self, label: &str) -> Option<&DimensionOption> {
        self.options.iter().find(|option| option.label == label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.options.iter().map(|option| option.label.clone()).collect()
    }
}

/// Substring policy for sub-attributes that catalog names encode textually.
pub fn name_matches_dimension(name: &str, option: &DimensionOption) -> bool {
    name.contains(option.needle())
        && !option.exclude.iter().any(|excluded| name.contains(excluded.as_str()))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedChoice {
    pub dimension: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenCombination {
    pub when: BTreeMap<String, String>,
    pub force: ForcedChoice,
}

impl ForbiddenCombination {
    pub fn is_triggered_by(&self, choices: &BTreeMap<String, String>) -> bool {
        self.when.iter().all(|(dimension, value)| choices.get(dimension) == Some(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModifierTrigger {
    Dimension { dimension: String, value: String },
    VariantLabel { contains: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSurcharge {
    pub class: String,
    pub day: Decimal,
    #[serde(default)]
    pub month: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceModifier {
    pub trigger: ModifierTrigger,
    pub surcharges: Vec<ClassSurcharge>,
}

impl PriceModifier {
    /// The surcharge to add, if the trigger fired and the class has an entry.
    pub fn surcharge(
        &self,
        class: Option<&str>,
        dimensions: &BTreeMap<String, String>,
        variant_label: &str,
    ) -> Option<&ClassSurcharge> {
        let fired = match &self.trigger {
            ModifierTrigger::Dimension { dimension, value } => {
                dimensions.get(dimension) == Some(value)
            }
            ModifierTrigger::VariantLabel { contains } => variant_label.contains(contains.as_str()),
        };
        if !fired {
            return None;
        }
        let class = class?;
        self.surcharges.iter().find(|surcharge| surcharge.class == class)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub skip_levels: BTreeSet<Level>,
    #[serde(default)]
    pub skip_policy: SkipPolicy,
    #[serde(default)]
    pub model_first: bool,
    #[serde(default)]
    pub fixed_filters: Vec<FixedFilter>,
    #[serde(default)]
    pub fixed_options: Vec<FixedOptions>,
    #[serde(default)]
    pub extra_dimensions: Vec<ExtraDimension>,
    #[serde(default)]
    pub forbidden_combinations: Vec<ForbiddenCombination>,
    #[serde(default)]
    pub price_modifier: Option<PriceModifier>,
}

impl Rule {
    pub fn skips(&self, level: Level) -> bool {
        self.skip_levels.contains(&level)
    }

    /// Fixed filters declared at `level` keep restricting every later level.
    pub fn admits(&self, level: Level, item: &CatalogItem) -> bool {
        self.fixed_filters
            .iter()
            .filter(|filter| filter.level <= level)
            .all(|filter| filter.predicate.matches(item))
    }

    pub fn fixed_options_at(&self, level: Level) -> Option<&[String]> {
        self.fixed_options
            .iter()
            .find(|options| options.level == level)
            .map(|options| options.values.as_slice())
    }

    pub fn dimension(&self, id: &str) -> Option<&ExtraDimension> {
        self.extra_dimensions.iter().find(|dimension| dimension.id == id)
    }

    /// Applies every triggered forbidden combination to a completed choice set.
    pub fn enforce_combinations(&self, choices: &mut BTreeMap<String, String>) -> bool {
        let mut forced = false;
        for combination in &self.forbidden_combinations {
            if combination.is_triggered_by(choices) {
                let previous = choices
                    .insert(combination.force.dimension.clone(), combination.force.value.clone());
                forced |= previous.as_ref() != Some(&combination.force.value);
            }
        }
        forced
    }

    /// Value forced for `dimension` by choices collected so far, if any.
    pub fn forced_value(&self, dimension: &str, choices: &BTreeMap<String, String>) -> Option<&str> {
        self.forbidden_combinations
            .iter()
            .filter(|combination| combination.force.dimension == dimension)
            .find(|combination| combination.is_triggered_by(choices))
            .map(|combination| combination.force.value.as_str())
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        let mut ids = HashSet::new();
        for dimension in &self.extra_dimensions {
            if !ids.insert(dimension.id.as_str()) {
                return Err(RuleError::DuplicateDimension(dimension.id.clone()));
            }
            if dimension.options.is_empty() {
                return Err(RuleError::EmptyDimension(dimension.id.clone()));
            }
            if dimension.options.iter().any(|option| option.label.trim().is_empty()) {
                return Err(RuleError::BlankOption(format!("dimension `{}`", dimension.id)));
            }
        }

        for fixed in &self.fixed_options {
            if fixed.values.iter().any(|value| value.trim().is_empty()) {
                return Err(RuleError::BlankOption(format!("{:?} fixed options", fixed.level)));
            }
        }

        for combination in &self.forbidden_combinations {
            for dimension in combination.when.keys() {
                if self.dimension(dimension).is_none() {
                    return Err(RuleError::UnknownDimension(dimension.clone()));
                }
            }
            let target = self
                .dimension(&combination.force.dimension)
                .ok_or_else(|| RuleError::UnknownDimension(combination.force.dimension.clone()))?;
            if target.option(&combination.force.value).is_none() {
                return Err(RuleError::UnknownForcedValue {
                    dimension: combination.force.dimension.clone(),
                    value: combination.force.value.clone(),
                });
            }
        }

        if let Some(modifier) = &self.price_modifier {
            if let ModifierTrigger::Dimension { dimension, .. } = &modifier.trigger {
                if self.dimension(dimension).is_none() {
                    return Err(RuleError::UnknownDimension(dimension.clone()));
                }
            }
            if let Some(negative) = modifier
                .surcharges
                .iter()
                .find(|surcharge| surcharge.day.is_sign_negative() || surcharge.month.is_sign_negative())
            {
                return Err(RuleError::NegativeSurcharge(negative.class.clone()));
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub category: String,
    /// Applies when the selected model contains this text.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub rule: Rule,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("could not parse rule table: {0}")]
    Parse(String),
    #[error("dimension `{0}` is declared more than once")]
    DuplicateDimension(String),
    #[error("dimension `{0}` offers no options")]
    EmptyDimension(String),
    #[error("{0} offers a blank option")]
    BlankOption(String),
    #[error("rule references unknown dimension `{0}`")]
    UnknownDimension(String),
    #[error("forced value `{value}` is not an option of dimension `{dimension}`")]
    UnknownForcedValue { dimension: String, value: String },
    #[error("surcharge for class `{0}` must not be negative")]
    NegativeSurcharge(String),
    #[error("rule for `{category}` ({model:?}) is invalid: {source}")]
    InvalidEntry {
        category: String,
        model: Option<String>,
        #[source]
        source: Box<RuleError>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RuleDocument {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
    default_rule: Rule,
}

impl RuleTable {
    pub fn new(entries: Vec<RuleEntry>) -> Self {
        Self { entries, default_rule: Rule::default() }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, RuleError> {
        let document: RuleDocument =
            toml::from_str(raw).map_err(|error| RuleError::Parse(error.to_string()))?;
        let table = Self::new(document.rules);
        table.validate()?;
        Ok(table)
    }

    /// Entries from `other` take precedence over entries already present.
    pub fn merged_with(mut self, other: RuleTable) -> Self {
        let mut entries = other.entries;
        entries.append(&mut self.entries);
        self.entries = entries;
        self
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        for entry in &self.entries {
            entry.rule.validate().map_err(|source| RuleError::InvalidEntry {
                category: entry.category.clone(),
                model: entry.model.clone(),
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    /// Model-specific entry first, then the category entry, then the default rule.
    pub fn rule_for(&self, category: Option<&str>, model_hint: Option<&str>) -> &Rule {
        let Some(category) = category else {
            return &self.default_rule;
        };

        if let Some(hint) = model_hint {
            let specific = self.entries.iter().find(|entry| {
                entry.category == category
                    && entry.model.as_deref().is_some_and(|model| hint.contains(model))
            });
            if let Some(entry) = specific {
                return &entry.rule;
            }
        }

        self.entries
            .iter()
            .find(|entry| entry.category == category && entry.model.is_none())
            .map(|entry| &entry.rule)
            .unwrap_or(&self.default_rule)
    }

    /// Exceptions used by the production catalog.
    pub fn builtin() -> Self {
        let backhoe_classes = ["0.25m3", "0.45m3"];

        Self::new(vec![
            RuleEntry {
                category: "クローラーフォーク".to_owned(),
                model: None,
                rule: Rule {
                    skip_levels: BTreeSet::from([Level::Class]),
                    fixed_options: vec![FixedOptions {
                        level: Level::Name,
                        values: vec!["普通サヤ".to_owned(), "長サヤ".to_owned()],
                    }],
                    ..Rule::default()
                },
            },
            RuleEntry {
                category: "チルトローテーター".to_owned(),
                model: None,
                rule: Rule {
                    skip_levels: BTreeSet::from([Level::Name, Level::Variant]),
                    skip_policy: SkipPolicy::FirstMatch,
                    ..Rule::default()
                },
            },
            RuleEntry {
                category: "林業用機械".to_owned(),
                model: Some("グラップルソー".to_owned()),
                rule: Rule {
                    model_first: true,
                    skip_levels: BTreeSet::from([Level::Name, Level::Variant]),
                    skip_policy: SkipPolicy::FirstMatch,
                    fixed_filters: vec![FixedFilter {
                        level: Level::Name,
                        predicate: ItemPredicate::BaseModelEquals("グラップルソー".to_owned()),
                    }],
                    ..Rule::default()
                },
            },
            RuleEntry {
                category: "林業用機械".to_owned(),
                model: None,
                rule: Rule { model_first: true, ..Rule::default() },
            },
            RuleEntry {
                category: "バックホウ".to_owned(),
                model: None,
                rule: Rule {
                    skip_levels: BTreeSet::from([Level::Name]),
                    extra_dimensions: vec![
                        ExtraDimension::new(
                            "pose",
                            "旋回タイプを選択してください",
                            vec![DimensionOption::new("標準"), DimensionOption::new("後方小旋回")],
                        ),
                        ExtraDimension::new(
                            "track",
                            "足回りを選択してください",
                            vec![DimensionOption::new("ゴムキャタ"), DimensionOption::new("鉄キャタ")],
                        ),
                        ExtraDimension::new(
                            "crane",
                            "クレーン仕様を選択してください",
                            vec![
                                DimensionOption::new("クレーン仕様"),
                                DimensionOption::without("クレーンなし", &["クレーン"]),
                            ],
                        ),
                        ExtraDimension::new(
                            "slope",
                            "法面バケットを追加しますか？",
                            vec![DimensionOption::new("なし"), DimensionOption::new("法面バケット付")],
                        )
                        .for_classes(&backhoe_classes)
                        .addendum(),
                    ],
                    forbidden_combinations: vec![ForbiddenCombination {
                        when: BTreeMap::from([
                            ("pose".to_owned(), "後方小旋回".to_owned()),
                            ("track".to_owned(), "鉄キャタ".to_owned()),
                        ]),
                        force: ForcedChoice {
                            dimension: "crane".to_owned(),
                            value: "クレーンなし".to_owned(),
                        },
                    }],
                    price_modifier: Some(PriceModifier {
                        trigger: ModifierTrigger::Dimension {
                            dimension: "slope".to_owned(),
                            value: "法面バケット付".to_owned(),
                        },
                        surcharges: vec![
                            ClassSurcharge {
                                class: "0.25m3".to_owned(),
                                day: Decimal::from(1_000),
                                month: Decimal::from(10_000),
                            },
                            ClassSurcharge {
                                class: "0.45m3".to_owned(),
                                day: Decimal::from(1_500),
                                month: Decimal::from(15_000),
                            },
                        ],
                    }),
                    ..Rule::default()
                },
            },
        ])
    }
}

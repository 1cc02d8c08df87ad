use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::alias::{AliasEntry, AliasTable};

/// One sellable configuration as it appears in the master document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub category: String,
    #[serde(default)]
    pub class: Option<String>,
    pub name: String,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
    #[serde(default)]
    pub day: Value,
    #[serde(default)]
    pub month: Value,
    #[serde(default)]
    pub base: Value,
    #[serde(default)]
    pub ins: Value,
    #[serde(default)]
    pub env: Value,
    #[serde(default)]
    pub note: Option<String>,
}

impl CatalogItem {
    pub fn new(category: impl Into<String>, class: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            class: class.map(str::to_owned),
            name: name.into(),
            variants: Vec::new(),
            day: Value::Null,
            month: Value::Null,
            base: Value::Null,
            ins: Value::Null,
            env: Value::Null,
            note: None,
        }
    }

    pub fn with_variant(mut self, variant: RawVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn base_model(&self) -> &str {
        base_model_name(&self.name)
    }

    pub fn has_legacy_prices(&self) -> bool {
        [&self.day, &self.month, &self.base, &self.ins, &self.env]
            .iter()
            .any(|value| !value.is_null())
    }
}

/// Price entry before normalization. Prices may be numbers or display strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVariant {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub day: Value,
    #[serde(default)]
    pub month: Value,
    #[serde(default)]
    pub base: Value,
    #[serde(default)]
    pub ins: Value,
    #[serde(default)]
    pub env: Value,
    #[serde(default)]
    pub note: Option<String>,
}

impl RawVariant {
    pub fn priced(label: Option<&str>, day: impl Into<Value>, month: impl Into<Value>) -> Self {
        Self {
            label: label.map(str::to_owned),
            day: day.into(),
            month: month.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not parse catalog document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("alias `{0}` is defined more than once")]
    DuplicateAlias(String),
    #[error("catalog item #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    items: Vec<CatalogItem>,
    #[serde(default)]
    aliases: Vec<AliasEntry>,
    #[serde(default)]
    category_order: Vec<String>,
    #[serde(default)]
    class_order: BTreeMap<String, Vec<String>>,
}

/// Read-only catalog shared by every conversation for the lifetime of the process.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    aliases: AliasTable,
    category_order: Vec<String>,
    class_order: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let items = items.into_iter().map(normalize_item).collect();
        Self { items, ..Self::default() }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;

        for (index, item) in document.items.iter().enumerate() {
            if item.category.trim().is_empty() {
                return Err(CatalogError::EmptyField { index, field: "category" });
            }
            if item.name.trim().is_empty() {
                return Err(CatalogError::EmptyField { index, field: "name" });
            }
        }

        let aliases = AliasTable::new(document.aliases)?;
        Ok(Self::new(document.items)
            .with_aliases(aliases)
            .with_category_order(document.category_order)
            .with_class_orders(document.class_order))
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_category_order(mut self, order: Vec<String>) -> Self {
        self.category_order = order;
        self
    }

    pub fn with_class_order(mut self, category: impl Into<String>, order: Vec<String>) -> Self {
        self.class_order.insert(category.into(), order);
        self
    }

    fn with_class_orders(mut self, orders: BTreeMap<String, Vec<String>>) -> Self {
        self.class_order.extend(orders);
        self
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Categories in catalog-encounter order, configured preferred prefix first.
    pub fn categories(&self) -> Vec<String> {
        preferred_order(&self.category_order, self.items.iter().map(|item| item.category.as_str()))
    }

    pub fn classes(&self, category: &str) -> Vec<String> {
        let preferred = self.class_order.get(category).map(Vec::as_slice).unwrap_or_default();
        preferred_order(
            preferred,
            self.items
                .iter()
                .filter(|item| item.category == category)
                .filter_map(|item| item.class.as_deref()),
        )
    }

    pub fn find_items(&self, filter: &ItemFilter<'_>) -> Vec<&CatalogItem> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    pub fn first_item(&self, filter: &ItemFilter<'_>) -> Option<&CatalogItem> {
        self.items.iter().find(|item| filter.matches(item))
    }
}

/// Conjunction of equality constraints. Unset fields match anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemFilter<'a> {
    pub category: Option<&'a str>,
    pub class: Option<&'a str>,
    pub name: Option<&'a str>,
    pub base_model: Option<&'a str>,
}

impl<'a> ItemFilter<'a> {
    pub fn category(category: &'a str) -> Self {
        Self { category: Some(category), ..Self::default() }
    }

    pub fn class(mut self, class: Option<&'a str>) -> Self {
        self.class = class;
        self
    }

    pub fn name(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }

    pub fn base_model(mut self, base_model: Option<&'a str>) -> Self {
        self.base_model = base_model;
        self
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        if self.category.is_some_and(|category| item.category != category) {
            return false;
        }
        // Items without a class belong to every class of their category.
        if let (Some(class), Some(item_class)) = (self.class, item.class.as_deref()) {
            if item_class != class {
                return false;
            }
        }
        if self.name.is_some_and(|name| item.name != name) {
            return false;
        }
        if self.base_model.is_some_and(|model| item.base_model() != model) {
            return false;
        }
        true
    }
}

/// Strips a trailing parenthesized qualifier, e.g. `グラップルソー（2m）` -> `グラップルソー`.
pub fn base_model_name(name: &str) -> &str {
    let trimmed = name.trim();
    let Some(last) = trimmed.chars().last() else {
        return trimmed;
    };
    let open = match last {
        ')' => '(',
        '）' => '（',
        _ => return trimmed,
    };
    match trimmed.rfind(open) {
        Some(0) | None => trimmed,
        Some(index) => trimmed[..index].trim_end(),
    }
}

fn preferred_order<'a>(preferred: &[String], encountered: impl Iterator<Item = &'a str>) -> Vec<String> {
    let present: Vec<&str> = encountered.collect();
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for value in preferred {
        if present.contains(&value.as_str()) && seen.insert(value.as_str()) {
            ordered.push(value.clone());
        }
    }
    for value in present {
        if seen.insert(value) {
            ordered.push(value.to_owned());
        }
    }
    ordered
}

fn normalize_item(mut item: CatalogItem) -> CatalogItem {
    if item.class.as_deref().is_some_and(|class| class.trim().is_empty()) {
        item.class = None;
    }
    item
}

#[cfg(test)]
mod tests {
    use super::{base_model_name, Catalog, CatalogError, CatalogItem, ItemFilter};

    fn fixture() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new("バックホウ", Some("0.45m3"), "標準"),
            CatalogItem::new("バックホウ", Some("0.1m3"), "標準"),
            CatalogItem::new("バックホウ", Some("0.25m3"), "標準"),
            CatalogItem::new("高所作業車", Some("10m"), "トラック式"),
            CatalogItem::new("バックホウ", Some("0.1m3"), "後方小旋回"),
            CatalogItem::new("チルトローテーター", None, "TR-1"),
        ])
    }

    #[test]
    fn categories_follow_encounter_order_and_deduplicate() {
        assert_eq!(fixture().categories(), vec!["バックホウ", "高所作業車", "チルトローテーター"]);
    }

    #[test]
    fn preferred_category_prefix_comes_first() {
        let catalog = fixture().with_category_order(vec!["チルトローテーター".to_owned()]);
        assert_eq!(catalog.categories(), vec!["チルトローテーター", "バックホウ", "高所作業車"]);
    }

    #[test]
    fn class_order_puts_preferred_entries_first_then_appends_the_rest() {
        let catalog = fixture()
            .with_class_order("バックホウ", vec!["0.1m3".to_owned(), "2m3".to_owned()]);

        assert_eq!(catalog.classes("バックホウ"), vec!["0.1m3", "0.45m3", "0.25m3"]);
        assert!(catalog.classes("チルトローテーター").is_empty());
    }

    #[test]
    fn class_filter_includes_classless_items_of_the_category() {
        let catalog = fixture();
        let found = catalog
            .find_items(&ItemFilter::category("チルトローテーター").class(Some("標準")));
        assert_eq!(found.len(), 1);

        let found = catalog.find_items(&ItemFilter::category("バックホウ").class(Some("0.1m3")));
        let names: Vec<_> = found.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["標準", "後方小旋回"]);
    }

    #[test]
    fn base_model_strips_half_and_full_width_qualifiers() {
        assert_eq!(base_model_name("グラップルソー（2m）"), "グラップルソー");
        assert_eq!(base_model_name("グラップル (回転式)"), "グラップル");
        assert_eq!(base_model_name("ハーベスタ"), "ハーベスタ");
        assert_eq!(base_model_name("(仮)"), "(仮)");
        assert_eq!(base_model_name(""), "");
    }

    #[test]
    fn base_model_filter_matches_qualified_names() {
        let catalog = Catalog::new(vec![
            CatalogItem::new("林業用機械", Some("0.45m3"), "グラップルソー（2m）"),
            CatalogItem::new("林業用機械", Some("0.45m3"), "ハーベスタ"),
        ]);
        let found = catalog.find_items(
            &ItemFilter::category("林業用機械").base_model(Some("グラップルソー")),
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn document_parsing_normalizes_blank_classes_and_reads_orderings() {
        let catalog = Catalog::from_json_str(
            r#"{
                "items": [
                    {"category": "クローラーフォーク", "class": "", "name": "普通サヤ",
                     "variants": [{"day": 8000, "month": 80000}]},
                    {"category": "発電機", "class": "25kVA", "name": "超低騒音", "day": "¥6,000"}
                ],
                "aliases": [{"from": "フォーク", "to": "クローラーフォーク"}],
                "category_order": ["発電機"],
                "class_order": {"発電機": ["25kVA"]}
            }"#,
        )
        .expect("catalog parses");

        assert_eq!(catalog.items()[0].class, None);
        assert!(catalog.items()[1].has_legacy_prices());
        assert_eq!(catalog.categories(), vec!["発電機", "クローラーフォーク"]);
        assert_eq!(catalog.aliases().len(), 1);
    }

    #[test]
    fn duplicate_alias_keys_are_rejected() {
        let error = Catalog::from_json_str(
            r#"{"items": [], "aliases": [{"from": "a", "to": "b"}, {"from": "a", "to": "c"}]}"#,
        )
        .expect_err("duplicate alias must fail");
        assert!(matches!(error, CatalogError::DuplicateAlias(ref key) if key == "a"));
    }

    #[test]
    fn items_without_name_are_rejected() {
        let error = Catalog::from_json_str(r#"{"items": [{"category": "x", "name": " "}]}"#)
            .expect_err("blank name must fail");
        assert!(matches!(error, CatalogError::EmptyField { index: 0, field: "name" }));
    }
}

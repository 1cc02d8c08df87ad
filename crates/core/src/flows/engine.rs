use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::alias::fold;
use crate::catalog::{Catalog, CatalogItem, ItemFilter};
use crate::errors::DialogueError;
use crate::flows::codec;
use crate::flows::states::{
    DialogueOption, DialogueOutcome, DialogueStep, NextStep, Resolution, SelectionState,
};
use crate::pricing::{pick_labeled_variant, pick_variant, variant_labels, DEFAULT_VARIANT_LABEL};
use crate::rules::{name_matches_dimension, ExtraDimension, Level, Rule, RuleTable, SkipPolicy};

/// Quick-reply clients accept at most this many options per message.
pub const MAX_OPTIONS: usize = 13;
/// Quick-reply labels longer than this are shortened with an ellipsis.
pub const MAX_LABEL_CHARS: usize = 20;
/// Reserved option value that pages through long option sets.
pub const NEXT_PAGE_VALUE: &str = "__next__";

/// Free text longer than this is not carried in tokens unless paging needs it.
const MAX_QUERY_CHARS: usize = 40;
const NEXT_PAGE_LABEL: &str = "次へ ▶";
const FIRST_PAGE_LABEL: &str = "◀ 最初へ";
const CONFIRM_CATEGORY_PROMPT: &str = "こちらのカテゴリでよろしいですか？";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub step: DialogueStep,
    pub prompt: String,
    pub values: Vec<String>,
}

impl Question {
    fn new(step: DialogueStep, values: Vec<String>) -> Self {
        let prompt = step.default_prompt().to_owned();
        Self { step, prompt, values }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Ask(Question),
    Complete,
}

enum Settled {
    Adopt(String),
    Ask(Vec<String>),
}

/// Stateless selection dialogue over an injected, read-only catalog.
#[derive(Clone, Debug)]
pub struct DialogueEngine {
    catalog: Arc<Catalog>,
    rules: Arc<RuleTable>,
}

impl DialogueEngine {
    pub fn new(catalog: Arc<Catalog>, rules: Arc<RuleTable>) -> Self {
        Self { catalog, rules }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// First turn: guesses the category from free text. Never fails; an
    /// unrecognized guess offers every category. A recognized guess travels in
    /// the token so later pages and re-prompts stay within the matches.
    pub fn start(&self, free_text: &str) -> NextStep {
        let normalized = self.catalog.aliases().normalize(free_text);
        let matched =
            if normalized.is_empty() { Vec::new() } else { self.matching_categories(&normalized) };

        let mut state = SelectionState::default();
        if matched.is_empty() {
            let categories = self.catalog.categories();
            info!(
                event_name = "dialogue.start.unrecognized",
                offered = categories.len(),
                "no category recognized in free text; offering full list"
            );
            return self.present(Question::new(DialogueStep::Category, categories), &state);
        }

        // Long text only rides along when the matches need more than one page.
        if matched.len() > MAX_OPTIONS || normalized.chars().count() <= MAX_QUERY_CHARS {
            state.query = Some(normalized);
        }
        info!(event_name = "dialogue.start.matched", matched = matched.len(), "category guessed");
        let question = Question {
            step: DialogueStep::Category,
            prompt: CONFIRM_CATEGORY_PROMPT.to_owned(),
            values: matched,
        };
        self.present(question, &state)
    }

    pub fn advance(&self, token: &str, chosen: &str) -> DialogueOutcome {
        match codec::decode(token) {
            Ok(state) => self.advance_state(state, chosen),
            Err(error) => {
                warn!(event_name = "dialogue.token_rejected", error = %error, "state token rejected");
                fail(DialogueError::from(error))
            }
        }
    }

    pub fn advance_state(&self, mut state: SelectionState, chosen: &str) -> DialogueOutcome {
        let question = match self.next_decision(&mut state) {
            Ok(Decision::Ask(question)) => question,
            Ok(Decision::Complete) => return self.finish(state),
            Err(error) => return fail(error),
        };

        let chosen = chosen.trim();
        if chosen == NEXT_PAGE_VALUE {
            state.page = state.page.saturating_add(1);
            return DialogueOutcome::NextStep(self.present(question, &state));
        }

        if !question.values.iter().any(|value| value == chosen) {
            let error = DialogueError::InvalidSelection {
                step: question.step.clone(),
                value: chosen.to_owned(),
            };
            debug!(event_name = "dialogue.selection_rejected", error = %error, "re-prompting step");
            return DialogueOutcome::Failed {
                reason: error.reason(),
                reprompt: Some(self.present(question, &state)),
            };
        }

        state.adopt(&question.step, chosen);
        self.drive(state)
    }

    /// Moves the dialogue forward from `state` without a new user choice.
    pub fn drive(&self, mut state: SelectionState) -> DialogueOutcome {
        match self.next_decision(&mut state) {
            Ok(Decision::Ask(question)) => {
                debug!(
                    event_name = "dialogue.step_presented",
                    step = %question.step,
                    options = question.values.len(),
                    "presenting next step"
                );
                DialogueOutcome::NextStep(self.present(question, &state))
            }
            Ok(Decision::Complete) => self.finish(state),
            Err(error) => fail(error),
        }
    }

    /// Determines the pending decision, adopting every level the active rule
    /// lets the dialogue settle on its own.
    pub fn next_decision(&self, state: &mut SelectionState) -> Result<Decision, DialogueError> {
        loop {
            let Some(category) = state.category.clone() else {
                return self.category_question(state).map(Decision::Ask);
            };
            let rule = self.rules.rule_for(Some(&category), state.model.as_deref());

            if rule.model_first && state.model.is_none() {
                let candidates = self.candidates(rule, state, Level::Model, false);
                let values = distinct(candidates.iter().map(|item| item.base_model()));
                match settle(rule, Level::Model, values, DialogueStep::Model)? {
                    Settled::Adopt(model) => {
                        state.model = Some(model);
                        continue;
                    }
                    Settled::Ask(values) => {
                        return Ok(Decision::Ask(Question::new(DialogueStep::Model, values)));
                    }
                }
            }

            if state.class.is_none() {
                let candidates = self.candidates(rule, state, Level::Class, false);
                if candidates.is_empty() {
                    return Err(DialogueError::NotFound { step: DialogueStep::Class });
                }
                let values = match rule.fixed_options_at(Level::Class) {
                    Some(values) => values.to_vec(),
                    None => {
                        let present: Vec<&str> =
                            candidates.iter().filter_map(|item| item.class.as_deref()).collect();
                        self.catalog
                            .classes(&category)
                            .into_iter()
                            .filter(|class| present.contains(&class.as_str()))
                            .collect()
                    }
                };
                // Categories without classes have no class level at all.
                if !values.is_empty() {
                    match settle(rule, Level::Class, values, DialogueStep::Class)? {
                        Settled::Adopt(class) => {
                            state.class = Some(class);
                            continue;
                        }
                        Settled::Ask(values) => {
                            return Ok(Decision::Ask(Question::new(DialogueStep::Class, values)));
                        }
                    }
                }
            }

            let class = state.class.clone();
            let mut forced = false;
            for dimension in
                rule.extra_dimensions.iter().filter(|dimension| dimension.applies_to(class.as_deref()))
            {
                if state.dimensions.contains_key(&dimension.id) {
                    continue;
                }
                let step = DialogueStep::Dimension(dimension.id.clone());
                if let Some(value) = rule.forced_value(&dimension.id, &state.dimensions) {
                    debug!(
                        event_name = "dialogue.dimension_forced",
                        dimension = %dimension.id,
                        value = %value,
                        "dimension settled by forbidden combination"
                    );
                    state.dimensions.insert(dimension.id.clone(), value.to_owned());
                    forced = true;
                    break;
                }
                let values = self.dimension_values(rule, state, dimension);
                if values.is_empty() {
                    return Err(DialogueError::NotFound { step });
                }
                return Ok(Decision::Ask(Question {
                    step,
                    prompt: dimension.prompt.clone(),
                    values,
                }));
            }
            if forced {
                continue;
            }
            if rule.enforce_combinations(&mut state.dimensions) {
                debug!(event_name = "dialogue.combination_forced", "forbidden combination overridden");
            }

            if state.name.is_none() {
                let values = match rule.fixed_options_at(Level::Name) {
                    Some(values) => values.to_vec(),
                    None => {
                        let candidates = self.candidates(rule, state, Level::Name, true);
                        distinct(candidates.iter().map(|item| item.name.as_str()))
                    }
                };
                match settle(rule, Level::Name, values, DialogueStep::Name)? {
                    Settled::Adopt(name) => {
                        state.name = Some(name);
                        continue;
                    }
                    Settled::Ask(values) => {
                        return Ok(Decision::Ask(Question::new(DialogueStep::Name, values)));
                    }
                }
            }

            if state.variant.is_none() {
                let candidates = self.candidates(rule, state, Level::Variant, true);
                let Some(item) = candidates.first() else {
                    return Err(DialogueError::NotFound { step: DialogueStep::Name });
                };
                let labels = match rule.fixed_options_at(Level::Variant) {
                    Some(values) => values.to_vec(),
                    None => variant_labels(item),
                };
                if labels.len() > 1 {
                    match settle(rule, Level::Variant, labels, DialogueStep::Variant)? {
                        Settled::Adopt(label) => {
                            state.variant = Some(label);
                            continue;
                        }
                        Settled::Ask(values) => {
                            return Ok(Decision::Ask(Question::new(DialogueStep::Variant, values)));
                        }
                    }
                }
            }

            return Ok(Decision::Complete);
        }
    }

    /// Category step, narrowed to the confirmation set while a query is carried.
    /// A query that no longer matches anything falls back to the full list.
    fn category_question(&self, state: &SelectionState) -> Result<Question, DialogueError> {
        if let Some(query) = state.query.as_deref() {
            let matched = self.matching_categories(query);
            if !matched.is_empty() {
                return Ok(Question {
                    step: DialogueStep::Category,
                    prompt: CONFIRM_CATEGORY_PROMPT.to_owned(),
                    values: matched,
                });
            }
        }

        let categories = self.catalog.categories();
        if categories.is_empty() {
            return Err(DialogueError::NotFound { step: DialogueStep::Category });
        }
        Ok(Question::new(DialogueStep::Category, categories))
    }

    fn matching_categories(&self, normalized: &str) -> Vec<String> {
        self.catalog
            .categories()
            .into_iter()
            .filter(|category| {
                let category = fold(category);
                normalized.contains(category.as_str()) || category.contains(normalized)
            })
            .collect()
    }

    /// Builds the priced result for a completed trail. The first matching
    /// item in catalog order wins.
    pub fn resolve(&self, state: &SelectionState) -> Result<Resolution, DialogueError> {
        let category = state
            .category
            .as_deref()
            .ok_or(DialogueError::NotFound { step: DialogueStep::Category })?;
        let rule = self.rules.rule_for(Some(category), state.model.as_deref());

        let candidates = self.candidates(rule, state, Level::Variant, true);
        let item = candidates.first().ok_or(DialogueError::NotFound { step: DialogueStep::Name })?;

        let mut variant = match state.variant.as_deref() {
            Some(label) => pick_labeled_variant(item, label),
            None => pick_variant(item),
        };

        let surcharge = rule.price_modifier.as_ref().and_then(|modifier| {
            modifier.surcharge(state.class.as_deref(), &state.dimensions, &variant.label)
        });
        if let Some(surcharge) = surcharge {
            variant = variant.with_surcharge(surcharge.day, surcharge.month);
        }

        let mut selection = state.clone();
        selection.page = 0;

        Ok(Resolution {
            title: title(rule, state, item, &variant.label),
            variant,
            selection,
            surcharge_applied: surcharge.is_some(),
        })
    }

    fn finish(&self, state: SelectionState) -> DialogueOutcome {
        match self.resolve(&state) {
            Ok(resolution) => {
                info!(
                    event_name = "dialogue.resolved",
                    title = %resolution.title,
                    surcharge_applied = resolution.surcharge_applied,
                    "selection resolved to a priced variant"
                );
                DialogueOutcome::Resolved(resolution)
            }
            Err(error) => fail(error),
        }
    }

    fn candidates(
        &self,
        rule: &Rule,
        state: &SelectionState,
        level: Level,
        with_dimensions: bool,
    ) -> Vec<&CatalogItem> {
        let Some(category) = state.category.as_deref() else {
            return Vec::new();
        };
        let filter = ItemFilter::category(category)
            .class(state.class.as_deref())
            .base_model(state.model.as_deref())
            .name(if level == Level::Variant { state.name.as_deref() } else { None });

        self.catalog
            .find_items(&filter)
            .into_iter()
            .filter(|item| rule.admits(level, item))
            .filter(|item| !with_dimensions || matches_dimensions(rule, &state.dimensions, item))
            .collect()
    }

    /// Options of a dimension that still lead to at least one catalog item.
    fn dimension_values(
        &self,
        rule: &Rule,
        state: &SelectionState,
        dimension: &ExtraDimension,
    ) -> Vec<String> {
        if !dimension.filters_name {
            return dimension.labels();
        }
        let candidates = self.candidates(rule, state, Level::Class, true);
        dimension
            .options
            .iter()
            .filter(|option| {
                candidates.iter().any(|item| name_matches_dimension(&item.name, option))
            })
            .map(|option| option.label.clone())
            .collect()
    }

    fn present(&self, question: Question, state: &SelectionState) -> NextStep {
        let page = paginate(question.values.len(), state.page);
        let mut options: Vec<DialogueOption> = question.values[page.start..page.end]
            .iter()
            .map(|value| DialogueOption {
                label: short_label(value),
                display: value.clone(),
                value: value.clone(),
            })
            .collect();
        if let Some(label) = page.navigation {
            options.push(DialogueOption {
                label: label.to_owned(),
                display: label.to_owned(),
                value: NEXT_PAGE_VALUE.to_owned(),
            });
        }

        let mut token_state = state.clone();
        token_state.page = page.index;

        NextStep {
            step: question.step,
            prompt: question.prompt,
            options,
            state_token: codec::encode(&token_state),
        }
    }
}

fn fail(error: DialogueError) -> DialogueOutcome {
    debug!(event_name = "dialogue.failed", error = %error, "dialogue turn failed");
    DialogueOutcome::Failed { reason: error.reason(), reprompt: None }
}

fn settle(
    rule: &Rule,
    level: Level,
    values: Vec<String>,
    step: DialogueStep,
) -> Result<Settled, DialogueError> {
    if values.is_empty() {
        return Err(DialogueError::NotFound { step });
    }
    if !rule.skips(level) {
        return Ok(Settled::Ask(values));
    }
    match rule.skip_policy {
        SkipPolicy::Advisory if values.len() > 1 => Ok(Settled::Ask(values)),
        _ => Ok(Settled::Adopt(values.into_iter().next().unwrap_or_default())),
    }
}

fn matches_dimensions(rule: &Rule, choices: &BTreeMap<String, String>, item: &CatalogItem) -> bool {
    choices.iter().all(|(id, value)| match rule.dimension(id) {
        Some(dimension) if !dimension.filters_name => true,
        Some(dimension) => dimension
            .option(value)
            .is_some_and(|option| name_matches_dimension(&item.name, option)),
        None => false,
    })
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_owned());
        }
    }
    seen
}

fn title(rule: &Rule, state: &SelectionState, item: &CatalogItem, variant_label: &str) -> String {
    let mut title = item.category.clone();
    if let Some(class) = state.class.as_deref() {
        title.push(' ');
        title.push_str(class);
    }
    title.push('｜');
    title.push_str(&item.name);

    for dimension in rule.extra_dimensions.iter().filter(|dimension| !dimension.filters_name) {
        let chosen = state.dimensions.get(&dimension.id);
        let is_default = dimension.options.first().map(|option| &option.label) == chosen;
        if let (Some(value), false) = (chosen, is_default) {
            title.push('＋');
            title.push_str(value);
        }
    }
    if variant_label != DEFAULT_VARIANT_LABEL {
        title.push_str(&format!("（{variant_label}）"));
    }
    title
}

fn short_label(value: &str) -> String {
    if value.chars().count() <= MAX_LABEL_CHARS {
        return value.to_owned();
    }
    let mut label: String = value.chars().take(MAX_LABEL_CHARS - 1).collect();
    label.push('…');
    label
}

struct Page {
    index: u32,
    start: usize,
    end: usize,
    navigation: Option<&'static str>,
}

/// Pages wrap around: the last page links back to the first.
fn paginate(total: usize, requested: u32) -> Page {
    if total <= MAX_OPTIONS {
        return Page { index: 0, start: 0, end: total, navigation: None };
    }
    let per_page = MAX_OPTIONS - 1;
    let page_count = total.div_ceil(per_page);
    let index = requested as usize % page_count;
    let start = index * per_page;
    let end = (start + per_page).min(total);
    let navigation = if end < total { NEXT_PAGE_LABEL } else { FIRST_PAGE_LABEL };
    Page { index: index as u32, start, end, navigation: Some(navigation) }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{
        paginate, short_label, DialogueEngine, CONFIRM_CATEGORY_PROMPT, MAX_OPTIONS, NEXT_PAGE_VALUE,
    };
    use crate::alias::{AliasEntry, AliasTable};
    use crate::catalog::{Catalog, CatalogItem, RawVariant};
    use crate::flows::codec;
    use crate::flows::states::{DialogueOutcome, DialogueStep, FailureReason, NextStep};
    use crate::rules::RuleTable;

    fn engine(items: Vec<CatalogItem>) -> DialogueEngine {
        DialogueEngine::new(Arc::new(Catalog::new(items)), Arc::new(RuleTable::builtin()))
    }

    fn priced(category: &str, class: Option<&str>, name: &str, day: i64) -> CatalogItem {
        CatalogItem::new(category, class, name)
            .with_variant(RawVariant::priced(None, day, day * 10))
    }

    fn next(outcome: DialogueOutcome) -> NextStep {
        match outcome {
            DialogueOutcome::NextStep(step) => step,
            other => panic!("expected next step, got {other:?}"),
        }
    }

    fn values(step: &NextStep) -> Vec<&str> {
        step.options.iter().map(|option| option.value.as_str()).collect()
    }

    #[test]
    fn default_rule_walks_class_name_and_variant() {
        let engine = engine(vec![
            priced("高所作業車", Some("10m"), "トラック式", 15_000),
            CatalogItem::new("高所作業車", Some("12m"), "自走式")
                .with_variant(RawVariant::priced(Some("短期"), 20_000, 0))
                .with_variant(RawVariant::priced(Some("長期"), 16_000, 0)),
        ]);

        let class_step = next(engine.advance("", "高所作業車"));
        assert_eq!(class_step.step, DialogueStep::Class);
        assert_eq!(values(&class_step), vec!["10m", "12m"]);

        let name_step = next(engine.advance(&class_step.state_token, "12m"));
        assert_eq!(name_step.step, DialogueStep::Name);
        assert_eq!(values(&name_step), vec!["自走式"]);

        let variant_step = next(engine.advance(&name_step.state_token, "自走式"));
        assert_eq!(variant_step.step, DialogueStep::Variant);
        assert_eq!(values(&variant_step), vec!["短期", "長期"]);

        let DialogueOutcome::Resolved(resolution) =
            engine.advance(&variant_step.state_token, "長期")
        else {
            panic!("expected resolution");
        };
        assert_eq!(resolution.variant.day, Some(Decimal::from(16_000)));
        assert_eq!(resolution.title, "高所作業車 12m｜自走式（長期）");
    }

    #[test]
    fn start_confirms_alias_normalized_category() {
        let catalog = Catalog::new(vec![priced("バックホウ", Some("0.1m3"), "標準", 9000)])
            .with_aliases(
                AliasTable::new(vec![AliasEntry::new("ユンボ", "バックホウ")]).expect("aliases"),
            );
        let engine = DialogueEngine::new(Arc::new(catalog), Arc::new(RuleTable::default()));

        let step = engine.start("ユンボ借りたい");
        assert_eq!(step.step, DialogueStep::Category);
        assert_eq!(values(&step), vec!["バックホウ"]);
        let state = codec::decode(&step.state_token).expect("token decodes");
        assert_eq!(state.query.as_deref(), Some("バックホウ借りたい"));
        assert_eq!(state.category, None);
    }

    #[test]
    fn confirmation_set_stays_narrowed_across_pages() {
        let mut items: Vec<CatalogItem> = (0..20)
            .map(|index| priced(&format!("発電機{index:02}"), None, "標準", 1000))
            .collect();
        items.extend((0..5).map(|index| priced(&format!("ローラー{index}"), None, "標準", 1000)));
        let engine = engine(items);

        let first = engine.start("発電機");
        assert_eq!(first.options.len(), MAX_OPTIONS);
        assert_eq!(first.options[12].value, NEXT_PAGE_VALUE);

        let second = next(engine.advance(&first.state_token, NEXT_PAGE_VALUE));
        assert_eq!(second.prompt, CONFIRM_CATEGORY_PROMPT);
        let second_values: Vec<&str> =
            values(&second).into_iter().filter(|value| *value != NEXT_PAGE_VALUE).collect();
        assert_eq!(second_values.len(), 8);
        assert_eq!(second_values.first(), Some(&"発電機12"));
        assert_eq!(second_values.last(), Some(&"発電機19"));
        assert!(second_values.iter().all(|value| value.starts_with("発電機")));

        let wrapped = next(engine.advance(&second.state_token, NEXT_PAGE_VALUE));
        assert_eq!(wrapped.options[0].value, "発電機00");

        let DialogueOutcome::Failed { reprompt: Some(reprompt), .. } =
            engine.advance(&second.state_token, "ローラー0")
        else {
            panic!("expected re-prompt");
        };
        assert_eq!(reprompt.prompt, CONFIRM_CATEGORY_PROMPT);
        assert_eq!(reprompt.options[0].value, "発電機12");

        let name_step = next(engine.advance(&second.state_token, "発電機15"));
        assert_eq!(name_step.step, DialogueStep::Name);
        let state = codec::decode(&name_step.state_token).expect("token decodes");
        assert_eq!(state.query, None);
    }

    #[test]
    fn long_free_text_fitting_one_page_is_not_carried() {
        let engine = engine(vec![priced("発電機", None, "標準", 1000)]);
        let text = format!("{}発電機", "現場で使うので".repeat(8));

        let step = engine.start(&text);
        assert_eq!(values(&step), vec!["発電機"]);
        assert_eq!(step.state_token, "");
    }

    #[test]
    fn invalid_selection_reprompts_the_same_step() {
        let engine = engine(vec![priced("発電機", Some("25kVA"), "超低騒音", 6000)]);
        let class_step = next(engine.advance("", "発電機"));

        let outcome = engine.advance(&class_step.state_token, "999kVA");
        let DialogueOutcome::Failed { reason, reprompt: Some(reprompt) } = outcome else {
            panic!("expected re-prompt");
        };
        assert_eq!(reason, FailureReason::InvalidSelection);
        assert_eq!(reprompt.step, DialogueStep::Class);
        assert_eq!(reprompt.state_token, class_step.state_token);
    }

    #[test]
    fn malformed_token_fails_as_not_found() {
        let engine = engine(vec![priced("発電機", None, "超低騒音", 6000)]);
        assert_eq!(
            engine.advance("page=oops", "発電機"),
            DialogueOutcome::Failed { reason: FailureReason::NotFound, reprompt: None }
        );
    }

    #[test]
    fn tampered_category_fails_as_not_found() {
        let engine = engine(vec![priced("発電機", None, "超低騒音", 6000)]);
        let token = codec::encode(&crate::flows::states::SelectionState::for_category("宇宙船"));
        assert!(matches!(
            engine.advance(&token, "x"),
            DialogueOutcome::Failed { reason: FailureReason::NotFound, .. }
        ));
    }

    #[test]
    fn long_option_sets_are_paged_and_wrap() {
        let items: Vec<CatalogItem> = (0..30)
            .map(|index| priced(&format!("カテゴリ{index:02}"), None, "標準", 1000))
            .collect();
        let engine = engine(items);

        let first = engine.start("");
        assert_eq!(first.options.len(), MAX_OPTIONS);
        assert_eq!(first.options[12].value, NEXT_PAGE_VALUE);
        assert_eq!(first.options[0].value, "カテゴリ00");

        let second = next(engine.advance(&first.state_token, NEXT_PAGE_VALUE));
        assert_eq!(second.options[0].value, "カテゴリ12");

        let third = next(engine.advance(&second.state_token, NEXT_PAGE_VALUE));
        assert_eq!(third.options.len(), 7);
        assert_eq!(third.options[0].value, "カテゴリ24");

        let wrapped = next(engine.advance(&third.state_token, NEXT_PAGE_VALUE));
        assert_eq!(wrapped.options[0].value, "カテゴリ00");

        // Choices from other pages are still valid.
        let name_step = next(engine.advance(&third.state_token, "カテゴリ03"));
        assert_eq!(name_step.step, DialogueStep::Name);
    }

    #[test]
    fn paginate_boundaries() {
        let small = paginate(13, 4);
        assert_eq!((small.index, small.start, small.end), (0, 0, 13));
        assert!(small.navigation.is_none());

        let large = paginate(24, 1);
        assert_eq!((large.index, large.start, large.end), (1, 12, 24));
    }

    #[test]
    fn labels_are_truncated_but_display_is_kept() {
        let long = "超低騒音型ディーゼル発電機（三相二百ボルト・単相百ボルト兼用）";
        let label = short_label(long);
        assert_eq!(label.chars().count(), 20);
        assert!(label.ends_with('…'));
        assert_eq!(short_label("標準"), "標準");

        let engine = engine(vec![priced("発電機", None, long, 6000)]);
        let step = next(engine.advance("", "発電機"));
        assert_eq!(step.options[0].display, long);
        assert_eq!(step.options[0].value, long);
    }
}

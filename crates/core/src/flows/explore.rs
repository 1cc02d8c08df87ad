//! Exhaustive walk over every path the dialogue can offer.
//!
//! Used by `doctor` to prove that each option a user can tap leads to a
//! priced result, and by tests to check the same for synthetic catalogs.

use serde::Serialize;

use crate::flows::engine::{Decision, DialogueEngine};
use crate::flows::states::SelectionState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeadEnd {
    /// Values chosen from the start of the dialogue up to the failure.
    pub path: Vec<String>,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExplorationReport {
    pub resolved: usize,
    pub dead_ends: Vec<DeadEnd>,
    /// Set when the walk stopped at the path limit.
    pub truncated: bool,
}

impl ExplorationReport {
    pub fn is_clean(&self) -> bool {
        self.dead_ends.is_empty() && !self.truncated
    }
}

impl DialogueEngine {
    /// Walks every path of every category, stopping after `limit` terminal paths.
    pub fn explore(&self, limit: usize) -> ExplorationReport {
        self.explore_from(SelectionState::default(), Vec::new(), limit)
    }

    pub fn explore_category(&self, category: &str, limit: usize) -> ExplorationReport {
        self.explore_from(SelectionState::for_category(category), vec![category.to_owned()], limit)
    }

    fn explore_from(
        &self,
        root: SelectionState,
        root_path: Vec<String>,
        limit: usize,
    ) -> ExplorationReport {
        let mut report = ExplorationReport::default();
        let mut pending = vec![(root, root_path)];

        while let Some((mut state, path)) = pending.pop() {
            if report.resolved + report.dead_ends.len() >= limit {
                report.truncated = true;
                break;
            }

            match self.next_decision(&mut state) {
                Ok(Decision::Ask(question)) => {
                    // Reverse so the walk visits options in presentation order.
                    for value in question.values.iter().rev() {
                        let mut next = state.clone();
                        next.adopt(&question.step, value.as_str());
                        let mut next_path = path.clone();
                        next_path.push(value.clone());
                        pending.push((next, next_path));
                    }
                }
                Ok(Decision::Complete) => match self.resolve(&state) {
                    Ok(_) => report.resolved += 1,
                    Err(error) => report.dead_ends.push(DeadEnd { path, error: error.to_string() }),
                },
                Err(error) => report.dead_ends.push(DeadEnd { path, error: error.to_string() }),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::catalog::{Catalog, CatalogItem, RawVariant};
    use crate::flows::engine::DialogueEngine;
    use crate::rules::RuleTable;

    #[test]
    fn missing_fixed_option_is_reported_as_dead_end() {
        let catalog = Catalog::new(vec![CatalogItem::new("クローラーフォーク", None, "普通サヤ")
            .with_variant(RawVariant::priced(None, 8000, 80000))]);
        let engine = DialogueEngine::new(Arc::new(catalog), Arc::new(RuleTable::builtin()));

        let report = engine.explore(100);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.dead_ends.len(), 1);
        assert_eq!(report.dead_ends[0].path, vec!["クローラーフォーク", "長サヤ"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn walk_stops_at_limit() {
        let items = (0..5)
            .map(|index| {
                CatalogItem::new("発電機", None, format!("型{index}"))
                    .with_variant(RawVariant::priced(None, 1000, 10000))
            })
            .collect();
        let engine = DialogueEngine::new(Arc::new(Catalog::new(items)), Arc::new(RuleTable::default()));

        let report = engine.explore(3);
        assert_eq!(report.resolved, 3);
        assert!(report.truncated);
        assert!(engine.explore_category("発電機", 10).is_clean());
    }
}

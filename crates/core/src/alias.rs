use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::catalog::CatalogError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub from: String,
    pub to: String,
}

impl AliasEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// Free-text phrase -> canonical catalog phrase, scanned in table order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new(entries: Vec<AliasEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.from.as_str()) {
                return Err(CatalogError::DuplicateAlias(entry.from.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitutes the first alias contained in `text` and stops there. Later
    /// aliases are not applied even if they also occur in the input. Input and
    /// alias keys are compared NFKC-folded, so width variants still match.
    pub fn normalize(&self, text: &str) -> String {
        let text = fold(text);
        if text.is_empty() {
            return String::new();
        }

        self.entries
            .iter()
            .map(|entry| (fold(&entry.from), entry))
            .filter(|(from, _)| !from.is_empty())
            .find(|(from, _)| text.contains(from.as_str()))
            .map(|(from, entry)| text.replace(from.as_str(), &entry.to))
            .unwrap_or(text)
    }
}

/// NFKC-folds and trims free text before matching.
pub fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::{AliasEntry, AliasTable};

    fn table() -> AliasTable {
        AliasTable::new(vec![
            AliasEntry::new("ユンボ", "バックホウ"),
            AliasEntry::new("フォーク", "クローラーフォーク"),
            AliasEntry::new("発電", "発電機"),
        ])
        .expect("unique aliases")
    }

    #[test]
    fn substitutes_first_matching_alias() {
        assert_eq!(table().normalize("ユンボを借りたい"), "バックホウを借りたい");
    }

    #[test]
    fn stops_after_first_alias_even_when_another_matches() {
        assert_eq!(table().normalize("ユンボとフォーク"), "バックホウとフォーク");
    }

    #[test]
    fn table_order_beats_match_position() {
        assert_eq!(table().normalize("フォークとユンボ"), "フォークとバックホウ");
    }

    #[test]
    fn half_width_katakana_matches_the_alias() {
        assert_eq!(table().normalize("ﾕﾝﾎﾞ借りたい"), "バックホウ借りたい");
    }

    #[test]
    fn width_variants_are_folded_on_both_sides() {
        let table = AliasTable::new(vec![AliasEntry::new("ＰＣ２００", "バックホウ")])
            .expect("unique aliases");
        assert_eq!(table.normalize("　pc200ではなくPC200"), "pc200ではなくバックホウ");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(table().normalize(""), "");
        assert_eq!(table().normalize("   "), "");
    }

    #[test]
    fn unmatched_input_is_returned_trimmed() {
        assert_eq!(table().normalize(" 高所作業車 "), "高所作業車");
    }
}

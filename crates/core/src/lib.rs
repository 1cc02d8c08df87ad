pub mod alias;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod flows;
pub mod pricing;
pub mod rules;
pub mod source;

pub use alias::{AliasEntry, AliasTable};
pub use catalog::{base_model_name, Catalog, CatalogError, CatalogItem, ItemFilter, RawVariant};
pub use errors::DialogueError;
pub use flows::{
    DialogueEngine, DialogueOption, DialogueOutcome, DialogueStep, ExplorationReport,
    FailureReason, NextStep, Resolution, SelectionState,
};
pub use pricing::{format_yen, pick_variant, to_number, Variant};
pub use rules::{name_matches_dimension, Level, Rule, RuleEntry, RuleError, RuleTable};
pub use source::{load_sources, CatalogSources, SourceError};

//! Startup loading of the catalog and rule files named by [`CatalogConfig`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::config::CatalogConfig;
use crate::flows::DialogueEngine;
use crate::rules::{RuleError, RuleTable};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog {path} is invalid: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
    #[error("rule file {path} is invalid: {source}")]
    Rules {
        path: PathBuf,
        #[source]
        source: RuleError,
    },
    #[error("built-in rule table is invalid: {0}")]
    Builtin(#[source] RuleError),
}

/// Catalog and rules as loaded at startup, ready to back a [`DialogueEngine`].
#[derive(Clone, Debug)]
pub struct CatalogSources {
    pub catalog: Catalog,
    pub rules: RuleTable,
    /// Rule categories with no item in the catalog.
    pub unmatched_rule_categories: Vec<String>,
}

impl CatalogSources {
    pub fn into_engine(self) -> DialogueEngine {
        DialogueEngine::new(Arc::new(self.catalog), Arc::new(self.rules))
    }
}

pub fn load_sources(config: &CatalogConfig) -> Result<CatalogSources, SourceError> {
    let raw = read(&config.master_path)?;
    let catalog = Catalog::from_json_str(&raw)
        .map_err(|source| SourceError::Catalog { path: config.master_path.clone(), source })?;

    let base = if config.builtin_rules {
        let builtin = RuleTable::builtin();
        builtin.validate().map_err(SourceError::Builtin)?;
        builtin
    } else {
        RuleTable::default()
    };
    let rules = match &config.rules_path {
        Some(path) => {
            let file_rules = RuleTable::from_toml_str(&read(path)?)
                .map_err(|source| SourceError::Rules { path: path.clone(), source })?;
            base.merged_with(file_rules)
        }
        None => base,
    };

    let categories = catalog.categories();
    let mut unmatched_rule_categories: Vec<String> = rules
        .entries()
        .iter()
        .map(|entry| entry.category.clone())
        .filter(|category| !categories.contains(category))
        .collect();
    unmatched_rule_categories.sort();
    unmatched_rule_categories.dedup();
    for category in &unmatched_rule_categories {
        warn!(
            event_name = "system.catalog.rule_unmatched",
            correlation_id = "bootstrap",
            category = %category,
            "rule names a category absent from the catalog"
        );
    }

    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        items = catalog.items().len(),
        categories = categories.len(),
        rules = rules.entries().len(),
        path = %config.master_path.display(),
        "catalog loaded"
    );

    Ok(CatalogSources { catalog, rules, unmatched_rule_categories })
}

fn read(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Read { path: path.to_path_buf(), source })
}

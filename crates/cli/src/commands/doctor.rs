use rentquote_core::config::{AppConfig, LoadOptions};
use rentquote_core::source::{load_sources, CatalogSources};
use serde::Serialize;

use crate::commands::CommandResult;

/// Upper bound on trails walked by the exploration check.
const EXPLORATION_LIMIT: usize = 50_000;
const MAX_LISTED_DEAD_ENDS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_line_credentials(&config));
            match load_sources(&config.catalog) {
                Ok(sources) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Pass,
                        details: format!(
                            "{} items in {} categories from `{}`",
                            sources.catalog.items().len(),
                            sources.catalog.categories().len(),
                            config.catalog.master_path.display()
                        ),
                    });
                    checks.push(check_rule_coverage(&sources));
                    checks.push(check_exploration(sources));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("rule_coverage", "catalog did not load"));
                    checks.push(skipped("path_exploration", "catalog did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["line_credentials", "catalog_load", "rule_coverage", "path_exploration"] {
                checks.push(skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_line_credentials(config: &AppConfig) -> DoctorCheck {
    match config.validate_line_credentials() {
        Ok(()) => DoctorCheck {
            name: "line_credentials",
            status: CheckStatus::Pass,
            details: "channel secret and access token are set".to_string(),
        },
        Err(error) => {
            DoctorCheck { name: "line_credentials", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

/// Rules for categories missing from the catalog are reported but never fail the check.
fn check_rule_coverage(sources: &CatalogSources) -> DoctorCheck {
    let details = if sources.unmatched_rule_categories.is_empty() {
        format!("{} rule entries, all match catalog categories", sources.rules.entries().len())
    } else {
        format!(
            "{} rule entries; no catalog items for: {}",
            sources.rules.entries().len(),
            sources.unmatched_rule_categories.join(", ")
        )
    };
    DoctorCheck { name: "rule_coverage", status: CheckStatus::Pass, details }
}

fn check_exploration(sources: CatalogSources) -> DoctorCheck {
    let report = sources.into_engine().explore(EXPLORATION_LIMIT);

    if !report.is_clean() {
        let listed: Vec<String> = report
            .dead_ends
            .iter()
            .take(MAX_LISTED_DEAD_ENDS)
            .map(|dead_end| format!("{} ({})", dead_end.path.join(" > "), dead_end.error))
            .collect();
        return DoctorCheck {
            name: "path_exploration",
            status: CheckStatus::Fail,
            details: format!(
                "{} offered paths lead nowhere: {}",
                report.dead_ends.len(),
                listed.join("; ")
            ),
        };
    }

    let mut details = format!("{} offered paths resolve to a price", report.resolved);
    if report.truncated {
        details.push_str(&format!(" (stopped after {EXPLORATION_LIMIT} trails)"));
    }
    DoctorCheck { name: "path_exploration", status: CheckStatus::Pass, details }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

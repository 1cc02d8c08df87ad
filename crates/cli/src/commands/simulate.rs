use rentquote_core::config::{AppConfig, LoadOptions};
use rentquote_core::flows::{DialogueEngine, DialogueOutcome};
use rentquote_core::source::load_sources;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct Turn {
    input: String,
    #[serde(flatten)]
    outcome: DialogueOutcome,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    command: &'static str,
    status: &'static str,
    turns: Vec<Turn>,
    /// Choices left over after the dialogue resolved.
    unused_choices: Vec<String>,
}

/// Plays a dialogue offline: `text` opens it, each choice answers the pending step.
pub fn run(text: &str, choices: &[String]) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("simulate", "config_validation", error.to_string(), 2)
        }
    };
    let engine = match load_sources(&config.catalog) {
        Ok(sources) => sources.into_engine(),
        Err(error) => return CommandResult::failure("simulate", "catalog_load", error.to_string(), 3),
    };

    let report = simulate(&engine, text, choices);
    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("simulate", "serialization", error.to_string(), 1),
    }
}

fn simulate(engine: &DialogueEngine, text: &str, choices: &[String]) -> SimulationReport {
    let opening = engine.start(text);
    let mut token = opening.state_token.clone();
    let mut turns = vec![Turn { input: text.to_owned(), outcome: DialogueOutcome::NextStep(opening) }];
    let mut remaining = choices.iter();

    for choice in remaining.by_ref() {
        let outcome = engine.advance(&token, choice);
        let resolved = matches!(outcome, DialogueOutcome::Resolved(_));
        token = match &outcome {
            DialogueOutcome::NextStep(step) => step.state_token.clone(),
            DialogueOutcome::Failed { reprompt: Some(step), .. } => step.state_token.clone(),
            DialogueOutcome::Failed { reprompt: None, .. } => String::new(),
            DialogueOutcome::Resolved(_) => token,
        };
        turns.push(Turn { input: choice.clone(), outcome });
        if resolved {
            break;
        }
    }

    let status = match turns.last().map(|turn| &turn.outcome) {
        Some(DialogueOutcome::Resolved(_)) => "resolved",
        Some(DialogueOutcome::Failed { .. }) => "failed",
        _ => "pending",
    };
    SimulationReport {
        command: "simulate",
        status,
        turns,
        unused_choices: remaining.cloned().collect(),
    }
}

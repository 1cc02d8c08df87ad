use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rentquote_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let line = |key_path: &str, value: String, env_keys: &[&str]| {
        let source = field_source(
            key_path,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        render_line(key_path, &value, source)
    };

    let rules_path = config
        .catalog
        .rules_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        line(
            "catalog.master_path",
            config.catalog.master_path.display().to_string(),
            &["RENTQUOTE_CATALOG_MASTER_PATH"],
        ),
        line("catalog.rules_path", rules_path, &["RENTQUOTE_CATALOG_RULES_PATH"]),
        line(
            "catalog.builtin_rules",
            config.catalog.builtin_rules.to_string(),
            &["RENTQUOTE_CATALOG_BUILTIN_RULES"],
        ),
        line(
            "line.channel_secret",
            redact(config.line.channel_secret.expose_secret()),
            &["RENTQUOTE_LINE_CHANNEL_SECRET", "LINE_CHANNEL_SECRET"],
        ),
        line(
            "line.channel_access_token",
            redact(config.line.channel_access_token.expose_secret()),
            &["RENTQUOTE_LINE_CHANNEL_ACCESS_TOKEN", "LINE_CHANNEL_ACCESS_TOKEN"],
        ),
        line("line.api_base_url", config.line.api_base_url.clone(), &["RENTQUOTE_LINE_API_BASE_URL"]),
        line(
            "line.reply_timeout_secs",
            config.line.reply_timeout_secs.to_string(),
            &["RENTQUOTE_LINE_REPLY_TIMEOUT_SECS"],
        ),
        line(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["RENTQUOTE_SERVER_BIND_ADDRESS"],
        ),
        line("server.port", config.server.port.to_string(), &["RENTQUOTE_SERVER_PORT", "PORT"]),
        line(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["RENTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        line(
            "logging.level",
            config.logging.level.clone(),
            &["RENTQUOTE_LOGGING_LEVEL", "RENTQUOTE_LOG_LEVEL"],
        ),
        line(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["RENTQUOTE_LOGGING_FORMAT", "RENTQUOTE_LOG_FORMAT"],
        ),
    ];

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["rentquote.toml", "config/rentquote.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Channel secrets and tokens have no meaningful prefix, so only presence is shown.
fn redact(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}

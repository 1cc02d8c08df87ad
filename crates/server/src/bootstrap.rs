use std::sync::Arc;
use std::time::Duration;

use rentquote_core::config::{AppConfig, ConfigError};
use rentquote_core::source::{load_sources, SourceError};
use rentquote_line::{DialogueHandler, HttpReplyClient, LineReplyClient, ReplyError, SignatureVerifier};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub handler: Arc<DialogueHandler>,
    pub verifier: Arc<SignatureVerifier>,
    pub reply_client: Arc<dyn LineReplyClient>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("reply client could not be built: {0}")]
    ReplyClient(#[source] ReplyError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate_line_credentials()?;

    let engine = load_sources(&config.catalog)?.into_engine();
    let reply_client = HttpReplyClient::new(
        &config.line.api_base_url,
        config.line.channel_access_token.clone(),
        Duration::from_secs(config.line.reply_timeout_secs),
    )
    .map_err(BootstrapError::ReplyClient)?;
    info!(
        event_name = "system.bootstrap.reply_client_ready",
        correlation_id = "bootstrap",
        endpoint = reply_client.endpoint(),
        "reply client configured"
    );

    Ok(Application {
        verifier: Arc::new(SignatureVerifier::new(config.line.channel_secret.clone())),
        handler: Arc::new(DialogueHandler::new(Arc::new(engine))),
        reply_client: Arc::new(reply_client),
        config,
    })
}

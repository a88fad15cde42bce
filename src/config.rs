use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::suggestion::{
    endpoint::EndpointGenerator,
    openai::{OpenAiGenerator, OpenAiSettings, DEFAULT_MODEL, OPENAI_API_URL},
    SuggestionClient, SuggestionGenerator,
};

/// Where suggestions come from. A running nudgeblock server takes precedence over direct API
/// access.
#[derive(Debug, Clone, Args)]
pub struct GeneratorArgs {
    #[arg(
        long,
        env = "NUDGEBLOCK_ENDPOINT",
        help = "Base URL of a nudgeblock server, for example http://127.0.0.1:9002"
    )]
    pub endpoint: Option<String>,
    #[arg(
        long = "api-key",
        env = "NUDGEBLOCK_API_KEY",
        hide_env_values = true,
        help = "API key of the text generation service"
    )]
    pub api_key: Option<String>,
    #[arg(long = "api-url", env = "NUDGEBLOCK_API_URL", default_value = OPENAI_API_URL)]
    pub api_url: String,
    #[arg(long, env = "NUDGEBLOCK_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
    #[arg(
        long = "suggestion-timeout",
        default_value_t = 30,
        help = "Seconds to wait for a suggestion"
    )]
    pub timeout_secs: u64,
}

impl GeneratorArgs {
    /// `None` when neither an endpoint nor an API key is configured.
    pub fn suggestion_client(&self) -> Result<Option<SuggestionClient>> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let generator: Arc<dyn SuggestionGenerator> = match (&self.endpoint, &self.api_key) {
            (Some(endpoint), _) => {
                info!(%endpoint, "Using suggestion endpoint");
                Arc::new(EndpointGenerator::new(endpoint, timeout)?)
            }
            (None, Some(api_key)) => {
                info!(url = %self.api_url, model = %self.model, "Using text generation API");
                Arc::new(OpenAiGenerator::new(OpenAiSettings {
                    api_key: api_key.clone(),
                    api_url: self.api_url.clone(),
                    model: self.model.clone(),
                    timeout,
                })?)
            }
            (None, None) => return Ok(None),
        };
        Ok(Some(SuggestionClient::new(generator)))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{RawSuggestion, Suggestion, SuggestionError, SuggestionGenerator, SuggestionRequest};

pub const SUGGEST_PATH: &str = "/api/suggest";

/// Body of a non-200 answer from `/api/suggest`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    details: Option<String>,
}

/// Asks a running nudgeblock server for a suggestion instead of calling the text generation
/// service directly.
pub struct EndpointGenerator {
    http_client: Client,
    url: String,
    timeout: Duration,
}

impl EndpointGenerator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SuggestionError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SuggestionError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            url: format!("{}{SUGGEST_PATH}", base_url.trim_end_matches('/')),
            timeout,
        })
    }
}

#[async_trait]
impl SuggestionGenerator for EndpointGenerator {
    async fn generate(&self, request: &SuggestionRequest) -> Result<Suggestion, SuggestionError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| SuggestionError::from_transport(e, self.timeout))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %self.url, "Suggestion endpoint answered");
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(ErrorBody {
                    details: Some(details),
                    error,
                }) => format!("{error}: {details}"),
                Ok(ErrorBody { error, .. }) => error,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(SuggestionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawSuggestion = response
            .json()
            .await
            .map_err(|e| SuggestionError::InvalidSchema(format!("Failed to parse response: {e}")))?;
        Suggestion::try_from(raw)
    }
}

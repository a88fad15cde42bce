use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    prompt::{build_prompt, SYSTEM_PROMPT},
    RawSuggestion, Suggestion, SuggestionError, SuggestionGenerator, SuggestionRequest,
};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: OPENAI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Generates suggestions through an OpenAI compatible chat completions API, constraining the
/// answer to the `{suggestedAppName, reason}` schema.
pub struct OpenAiGenerator {
    http_client: Client,
    settings: OpenAiSettings,
}

impl OpenAiGenerator {
    pub fn new(settings: OpenAiSettings) -> Result<Self, SuggestionError> {
        let http_client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SuggestionError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            settings,
        })
    }

    fn payload(&self, request: &SuggestionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(request),
                },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchema {
                    name: "productive_alternative".to_string(),
                    schema: json!({
                        "type": "object",
                        "properties": {
                            "suggestedAppName": {
                                "type": "string",
                                "description": "The name of the suggested app."
                            },
                            "reason": {
                                "type": "string",
                                "description": "Why the app is a good alternative."
                            }
                        },
                        "required": ["suggestedAppName", "reason"],
                        "additionalProperties": false
                    }),
                    strict: true,
                },
            },
        }
    }
}

#[async_trait]
impl SuggestionGenerator for OpenAiGenerator {
    async fn generate(&self, request: &SuggestionRequest) -> Result<Suggestion, SuggestionError> {
        info!(app = %request.distracting_app_name, model = %self.settings.model, "Generating suggestion");

        let response = self
            .http_client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|e| SuggestionError::from_transport(e, self.settings.timeout))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received completion response");
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SuggestionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            SuggestionError::InvalidSchema(format!("Failed to parse response: {e}"))
        })?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|v| v.message.content)
            .ok_or_else(|| SuggestionError::InvalidSchema("Response contained no content".into()))?;

        let raw: RawSuggestion = serde_json::from_str(&content).map_err(|e| {
            SuggestionError::InvalidSchema(format!(
                "Failed to parse suggestion: {e}. Content: {content}"
            ))
        })?;
        Suggestion::try_from(raw)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchema,
}

#[derive(Debug, Serialize)]
struct JsonSchema {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}
